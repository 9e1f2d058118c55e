//! Error and warning types for the Zenith site compiler.
//!
//! Errors abort a single page (or, for output-root clearing, the batch).
//! Warnings are plain values collected into the build report.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while compiling one page.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The page source could not be read.
    #[error("failed to read page source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The page source could not be parsed into a document.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A directory or artifact under the output root could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CompileError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompileError::Write {
            path: path.into(),
            source,
        }
    }

    /// Stable diagnostic code, in the same family as the compiler's `Z-ERR-*` codes.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Read { .. } | CompileError::Parse { .. } => "Z-ERR-PARSE",
            CompileError::Write { .. } => "Z-ERR-IO",
        }
    }
}

/// Non-fatal conditions reported alongside a build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildWarning {
    /// Two sources derived the same route pattern; only `kept` is emitted.
    #[error("route {pattern} is defined by both {kept} and {dropped}; keeping {kept}")]
    RouteCollision {
        pattern: String,
        kept: PathBuf,
        dropped: PathBuf,
    },

    /// An optional asset was not found and was skipped.
    #[error("optional asset {path} not found, skipped")]
    MissingAsset { path: PathBuf },
}

/// Failure while loading `zenith.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
