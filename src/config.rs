//! Site configuration, loaded from an optional `zenith.toml`.
//!
//! ```toml
//! [build]
//! pages_dir = "src/pages"
//! out_dir = "dist"
//! base_path = "/"
//! parallel = false
//!
//! [serve]
//! host = "127.0.0.1"
//! port = 3000
//! strict = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "zenith.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub build: BuildConfig,
    pub serve: ServeConfig,
}

/// Build step settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Root of the page-source tree.
    pub pages_dir: PathBuf,
    /// Output root; cleared at the start of every build.
    pub out_dir: PathBuf,
    /// URL prefix for emitted asset references.
    pub base_path: String,
    /// Compile pages on the rayon pool.
    pub parallel: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            pages_dir: PathBuf::from("src/pages"),
            out_dir: PathBuf::from("dist"),
            base_path: "/".to_string(),
            parallel: false,
        }
    }
}

/// Serve step settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Answer 404 instead of serving the root document for unknown pages.
    pub strict: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            strict: false,
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source, path)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn from_toml(source: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
