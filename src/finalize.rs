//! Finalize Module for Zenith Site Compiler
//!
//! Merges structural HTML with asset links and writes one HTML file plus its
//! script/style side-files per route.
//!
//! Side-files live in a per-route asset directory (see
//! [`asset_dir`](crate::discovery::asset_dir)) and are referenced with
//! root-relative URLs under the configured base path, so nested routes and
//! sibling routes never point at, or overwrite, each other's assets.
//!
//! The site favicon is shared by every page and is installed once per batch
//! with [`Emitter::install_favicon`], never per page.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::codegen::AssembledScript;
use crate::discovery::{asset_dir, normalize_base_path, Route};
use crate::error::{BuildWarning, CompileError};
use crate::parse::StyleBlock;

pub const FAVICON_FILE: &str = "favicon.ico";

lazy_static! {
    static ref HEAD_CLOSE_RE: Regex = Regex::new(r"(?i)</head\s*>").unwrap();
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap();
    static ref CHARSET_RE: Regex = Regex::new(r"(?i)<meta\b[^>]*\bcharset\s*=").unwrap();
}

/// Everything needed to emit one page.
#[derive(Debug, Clone, Default)]
pub struct PageArtifacts {
    pub html: String,
    /// Head elements of a fragment page, placed in the generated `<head>`.
    pub head: String,
    pub scripts: Vec<AssembledScript>,
    pub styles: Vec<StyleBlock>,
}

#[derive(Debug, Clone)]
pub struct EmitSummary {
    /// Absolute (output-root joined) path of the written HTML file.
    pub html_path: PathBuf,
    /// Script and style side-files written next to it.
    pub assets: Vec<PathBuf>,
}

pub fn script_file_name(index: usize) -> String {
    format!("script-{}.js", index)
}

pub fn style_file_name(index: usize) -> String {
    format!("style-{}.css", index)
}

/// Byte offset of the first `</head>` outside any comment.
fn find_head_close(html: &str) -> Option<usize> {
    let comments: Vec<(usize, usize)> = COMMENT_RE
        .find_iter(html)
        .map(|m| (m.start(), m.end()))
        .collect();

    HEAD_CLOSE_RE
        .find_iter(html)
        .map(|m| m.start())
        .find(|&pos| !comments.iter().any(|&(start, end)| pos >= start && pos < end))
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Emitter {
    output_root: PathBuf,
    base_path: String,
}

impl Emitter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Emitter {
            output_root: output_root.into(),
            base_path: "/".to_string(),
        }
    }

    /// URL prefix for emitted references; normalized to `/…/`.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Delete and recreate the output root. Call once per batch, before any page.
    pub fn clear(&self) -> Result<(), CompileError> {
        if self.output_root.exists() {
            fs::remove_dir_all(&self.output_root)
                .map_err(|e| CompileError::write(&self.output_root, e))?;
        }
        fs::create_dir_all(&self.output_root).map_err(|e| CompileError::write(&self.output_root, e))
    }

    fn url_for(&self, relative: &Path) -> String {
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("{}{}", self.base_path, segments.join("/"))
    }

    /// The final HTML of a page whose file is `output_path` (relative to the output root).
    pub fn render_html(&self, page: &PageArtifacts, output_path: &Path) -> String {
        let assets = asset_dir(output_path);
        let mut tags = String::new();

        if !page.head.is_empty() {
            tags.push_str(&page.head);
            tags.push('\n');
        }
        tags.push_str(&format!(
            "<link rel=\"icon\" href=\"{}\">\n",
            self.url_for(Path::new(FAVICON_FILE))
        ));
        for style in &page.styles {
            tags.push_str(&format!(
                "<link rel=\"stylesheet\" href=\"{}\">\n",
                self.url_for(&assets.join(style_file_name(style.index)))
            ));
        }
        for script in &page.scripts {
            tags.push_str(&format!(
                "<script defer src=\"{}\"></script>\n",
                self.url_for(&assets.join(script_file_name(script.index)))
            ));
        }

        match find_head_close(&page.html) {
            Some(pos) => format!("{}{}{}", &page.html[..pos], tags, &page.html[pos..]),
            None => {
                let charset = if CHARSET_RE.is_match(&page.head) {
                    ""
                } else {
                    "<meta charset=\"utf-8\">\n"
                };
                format!(
                    "<!DOCTYPE html>\n<html>\n<head>\n{}{}</head>\n<body>\n{}\n</body>\n</html>\n",
                    charset, tags, page.html
                )
            }
        }
    }

    /// Write a page and its side-files.
    pub fn emit(&self, page: &PageArtifacts, output_path: &Path) -> Result<EmitSummary, CompileError> {
        let html_path = self.output_root.join(output_path);
        let asset_root = self.output_root.join(asset_dir(output_path));
        let mut assets = Vec::new();

        write_file(&html_path, &self.render_html(page, output_path))?;

        for script in &page.scripts {
            let path = asset_root.join(script_file_name(script.index));
            write_file(&path, &script.content)?;
            assets.push(path);
        }
        for style in &page.styles {
            let path = asset_root.join(style_file_name(style.index));
            write_file(&path, &style.content)?;
            assets.push(path);
        }

        Ok(EmitSummary { html_path, assets })
    }

    pub fn emit_route(
        &self,
        page: &PageArtifacts,
        route: &Route,
    ) -> Result<EmitSummary, CompileError> {
        self.emit(page, &route.output_path)
    }

    /// Copy the site favicon into the output root.
    ///
    /// `page_dirs` are tried in order and the first one holding a
    /// `favicon.ico` wins. With none, the first directory's expected
    /// favicon is reported as missing.
    pub fn install_favicon<'a, I>(&self, page_dirs: I) -> Result<Option<BuildWarning>, CompileError>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut first_dir: Option<&Path> = None;

        for dir in page_dirs {
            first_dir.get_or_insert(dir);
            let favicon = dir.join(FAVICON_FILE);
            if favicon.is_file() {
                let target = self.output_root.join(FAVICON_FILE);
                fs::copy(&favicon, &target).map_err(|e| CompileError::write(&target, e))?;
                tracing::debug!("Installed favicon from {}", favicon.display());
                return Ok(None);
            }
        }

        let expected = first_dir.unwrap_or(Path::new("")).join(FAVICON_FILE);
        tracing::debug!("No favicon found, expected {}; skipping", expected.display());
        Ok(Some(BuildWarning::MissingAsset { path: expected }))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), CompileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CompileError::write(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| CompileError::write(path, e))
}
