//! Request-time route resolution against a built output root.
//!
//! Page lookups go through [`page_file`], the same naming function discovery
//! uses at build time, so a pathname always resolves to the file the emitter
//! wrote for it. The resolver strips the same base path the emitter prefixes.

use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

use crate::discovery::{normalize_base_path, page_file, PageLayout};

pub const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "ico", "png", "jpg", "jpeg", "gif", "svg", "webp", "woff", "woff2", "ttf",
    "json", "map", "txt", "xml",
];

/// What to do with a pathname that matches neither an asset nor a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Serve the root `index.html` (client-side routing).
    #[default]
    RootDocument,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Asset(PathBuf),
    Page(PathBuf),
    Fallback(PathBuf),
    NotFound,
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Asset(p) | Resolution::Page(p) | Resolution::Fallback(p) => Some(p),
            Resolution::NotFound => None,
        }
    }
}

/// Strip query and fragment, percent-decode, trim trailing slashes; empty becomes `/`.
pub fn normalize_pathname(pathname: &str) -> String {
    let end = pathname.find(['?', '#']).unwrap_or(pathname.len());
    let decoded = percent_decode_str(&pathname[..end]).decode_utf8_lossy();
    let path = decoded.trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn has_static_extension(pathname: &str) -> bool {
    let last = pathname.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((_, ext)) => STATIC_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// `true` if any segment would climb out of the output root.
fn escapes_root(pathname: &str) -> bool {
    Path::new(pathname.trim_start_matches('/'))
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

#[derive(Debug, Clone)]
pub struct RouteResolver {
    output_root: PathBuf,
    base_path: String,
    policy: FallbackPolicy,
}

impl RouteResolver {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        RouteResolver {
            output_root: output_root.into(),
            base_path: "/".to_string(),
            policy: FallbackPolicy::default(),
        }
    }

    /// URL prefix the site was built with; removed before lookup.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Drop the base prefix. Paths outside it are left as they are.
    fn strip_base(&self, path: String) -> String {
        if self.base_path == "/" {
            return path;
        }
        let prefix = self.base_path.trim_end_matches('/');
        if path == prefix {
            "/".to_string()
        } else if path.starts_with(&self.base_path) {
            path[prefix.len()..].to_string()
        } else {
            path
        }
    }

    pub fn resolve(&self, pathname: &str) -> Resolution {
        let path = self.strip_base(normalize_pathname(pathname));
        let escapes = escapes_root(&path);

        if has_static_extension(&path) {
            if escapes {
                return Resolution::NotFound;
            }
            return Resolution::Asset(self.output_root.join(path.trim_start_matches('/')));
        }

        if path == "/" {
            return Resolution::Page(self.output_root.join("index.html"));
        }

        if !escapes {
            for layout in PageLayout::PRECEDENCE {
                let candidate = self.output_root.join(page_file(&path, layout));
                if candidate.is_file() {
                    return Resolution::Page(candidate);
                }
            }
        }

        match self.policy {
            FallbackPolicy::RootDocument => {
                Resolution::Fallback(self.output_root.join("index.html"))
            }
            FallbackPolicy::NotFound => Resolution::NotFound,
        }
    }
}
