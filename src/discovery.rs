//! Discovery Module for Zenith Site Compiler
//!
//! Recursively scans the pages directory for `.zen` files and derives the
//! route table. The naming functions here are the only place route patterns
//! and output file names are derived; the request-time resolver calls the
//! same functions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::BuildWarning;

pub const PAGE_EXTENSION: &str = "zen";

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE NAMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether a page came from an `index` leaf (`blog/index.zen`) or a named
/// leaf (`blog/post.zen`). Decides between `<route>/index.html` and `<route>.html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageLayout {
    Leaf,
    Index,
}

impl PageLayout {
    /// Resolution order at request time. Also the collision precedence.
    pub const PRECEDENCE: [PageLayout; 2] = [PageLayout::Leaf, PageLayout::Index];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub source_path: PathBuf,
    pub pattern: String,
    pub layout: PageLayout,
    /// Relative to the output root.
    pub output_path: PathBuf,
}

/// Derive the route pattern of a source path relative to the pages root.
pub fn file_path_to_route(relative: &Path) -> (String, PageLayout) {
    let stem = relative.with_extension("");
    let normalized = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    if normalized == "index" {
        ("/".to_string(), PageLayout::Index)
    } else if let Some(prefix) = normalized.strip_suffix("/index") {
        (format!("/{}", prefix), PageLayout::Index)
    } else {
        (format!("/{}", normalized), PageLayout::Leaf)
    }
}

/// Output file of a route pattern, relative to the output root.
///
/// `/` is always `index.html`; otherwise a leaf page is `<route>.html` and an
/// index page is `<route>/index.html`.
pub fn page_file(pattern: &str, layout: PageLayout) -> PathBuf {
    let trimmed = pattern.trim_matches('/');
    if trimmed.is_empty() {
        return PathBuf::from("index.html");
    }

    let mut path = PathBuf::new();
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }

    match layout {
        PageLayout::Leaf => {
            let file = format!(
                "{}.html",
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            );
            path.set_file_name(file);
            path
        }
        PageLayout::Index => path.join("index.html"),
    }
}

/// Directory holding a page's script/style side-files, relative to the output root.
///
/// `index.html` pages own their directory; `x.html` pages get `x/`, so two
/// sibling pages never share (and overwrite) each other's assets.
pub fn asset_dir(output_path: &Path) -> PathBuf {
    if output_path.file_name().map(|n| n == "index.html").unwrap_or(false) {
        output_path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        output_path.with_extension("")
    }
}

/// Normalize a configured URL prefix to `/` or `/<segments>/`.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

pub fn is_page_source(path: &Path) -> bool {
    path.extension().map(|ext| ext == PAGE_EXTENSION).unwrap_or(false)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteTable {
    pub routes: Vec<Route>,
    #[serde(skip)]
    pub warnings: Vec<BuildWarning>,
}

impl RouteTable {
    /// Build a table from source paths, resolving pattern collisions.
    ///
    /// On a collision the layout that wins at request time (`Leaf` before
    /// `Index`) is kept; the other route is dropped with a warning.
    pub fn from_sources(pages_root: &Path, sources: Vec<PathBuf>) -> Self {
        let mut table = RouteTable::default();
        let mut by_pattern: HashMap<String, usize> = HashMap::new();

        for source_path in sources {
            let relative = source_path
                .strip_prefix(pages_root)
                .unwrap_or(&source_path)
                .to_path_buf();
            let (pattern, layout) = file_path_to_route(&relative);
            let route = Route {
                output_path: page_file(&pattern, layout),
                source_path,
                pattern,
                layout,
            };

            match by_pattern.get(&route.pattern).copied() {
                Some(existing) => {
                    let current = &table.routes[existing];
                    let incoming_wins = precedence(route.layout) < precedence(current.layout);
                    let (kept, dropped) = if incoming_wins {
                        (route.source_path.clone(), current.source_path.clone())
                    } else {
                        (current.source_path.clone(), route.source_path.clone())
                    };

                    tracing::warn!(
                        "Route {} defined twice; keeping {}, dropping {}",
                        route.pattern,
                        kept.display(),
                        dropped.display()
                    );
                    table.warnings.push(BuildWarning::RouteCollision {
                        pattern: route.pattern.clone(),
                        kept,
                        dropped,
                    });

                    if incoming_wins {
                        table.routes[existing] = route;
                    }
                }
                None => {
                    by_pattern.insert(route.pattern.clone(), table.routes.len());
                    table.routes.push(route);
                }
            }
        }

        table
    }

    pub fn get(&self, pattern: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.pattern == pattern)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn precedence(layout: PageLayout) -> usize {
    PageLayout::PRECEDENCE
        .iter()
        .position(|&l| l == layout)
        .unwrap_or(usize::MAX)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Recursively find all page sources, in file-name order.
fn find_zen_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file() && is_page_source(path) {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
            }
        }
    }

    files
}

/// Discover the route table of a pages directory.
pub fn discover_routes(pages_root: &Path) -> RouteTable {
    if !pages_root.exists() {
        tracing::warn!("Pages directory {} does not exist", pages_root.display());
        return RouteTable::default();
    }

    let files = find_zen_files(pages_root);
    tracing::debug!("Found {} page sources under {}", files.len(), pages_root.display());
    RouteTable::from_sources(pages_root, files)
}
