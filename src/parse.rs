//! Parse Module for Zenith Site Compiler
//!
//! Reads one page source and catalogs its `<script>` and `<style>` blocks in
//! document order. The markup itself is kept verbatim; stripping the blocks
//! is the rewriter's job.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::document::NodeArena;
use crate::error::CompileError;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A script body. `index` is dense per page and names the emitted `script-<index>.js`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBlock {
    pub index: usize,
    pub content: String,
}

/// A stylesheet body. `index` names the emitted `style-<index>.css`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleBlock {
    pub index: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub raw_markup: String,
    pub scripts: Vec<ScriptBlock>,
    pub styles: Vec<StyleBlock>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Read and parse a page source file.
pub fn parse_source(path: &Path) -> Result<SourceDocument, CompileError> {
    let markup = fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_markup(&markup, path)
}

/// Catalog script and style blocks of already-loaded markup.
///
/// Blocks whose content is only whitespace (including `<script src=...>`
/// references) are not cataloged and do not consume an index.
pub fn parse_markup(markup: &str, path: &Path) -> Result<SourceDocument, CompileError> {
    let arena = NodeArena::parse(markup, path)?;

    let mut scripts = Vec::new();
    let mut styles = Vec::new();

    for id in arena.element_ids() {
        let Some(el) = arena.element(id) else {
            continue;
        };
        let is_script = el.name == "script";
        if !is_script && el.name != "style" {
            continue;
        }

        let content = arena.text_content(id);
        if content.trim().is_empty() {
            continue;
        }

        if is_script {
            scripts.push(ScriptBlock {
                index: scripts.len(),
                content,
            });
        } else {
            styles.push(StyleBlock {
                index: styles.len(),
                content,
            });
        }
    }

    Ok(SourceDocument {
        raw_markup: markup.to_string(),
        scripts,
        styles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> SourceDocument {
        parse_markup(markup, Path::new("page.zen")).unwrap()
    }

    #[test]
    fn test_catalogs_in_document_order() {
        let doc = parse(
            r#"
            <script>const a = 1;</script>
            <style>.a { color: red; }</style>
            <div>
                <script>const b = 2;</script>
            </div>
            <style>.b { color: blue; }</style>
            "#,
        );
        assert_eq!(doc.scripts.len(), 2);
        assert_eq!(doc.scripts[0].index, 0);
        assert_eq!(doc.scripts[0].content, "const a = 1;");
        assert_eq!(doc.scripts[1].index, 1);
        assert_eq!(doc.scripts[1].content, "const b = 2;");
        assert_eq!(doc.styles.len(), 2);
        assert_eq!(doc.styles[1].content, ".b { color: blue; }");
    }

    #[test]
    fn test_markup_is_not_modified() {
        let source = "<div onclick=\"go\">x</div><script>go()</script>";
        let doc = parse(source);
        assert_eq!(doc.raw_markup, source);
    }

    #[test]
    fn test_empty_blocks_do_not_consume_indices() {
        let doc = parse(
            r#"<script src="/vendor.js"></script><script>   </script><script>run()</script>"#,
        );
        assert_eq!(doc.scripts.len(), 1);
        assert_eq!(doc.scripts[0].index, 0);
        assert_eq!(doc.scripts[0].content, "run()");
    }

    #[test]
    fn test_script_content_is_opaque() {
        let doc = parse("<script>if (a < b && c > d) { x = '</div>'; }</script>");
        assert_eq!(doc.scripts[0].content, "if (a < b && c > d) { x = '</div>'; }");
    }

    #[test]
    fn test_unreadable_source_is_a_parse_failure() {
        let err = parse_source(Path::new("/definitely/not/here.zen")).unwrap_err();
        assert!(matches!(err, CompileError::Read { .. }));
        assert_eq!(err.code(), "Z-ERR-PARSE");
    }
}
