//! Event attribute rewriting.
//!
//! Inline `on<event>` handler attributes become declarative
//! `data-zen-<event>` markers, and every inline `<script>`/`<style>` block is
//! removed from the structural HTML. The event kinds seen are returned so the
//! codegen can install one delegated listener per kind.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::path::Path;

use crate::document::{NodeArena, SerializeMode};
use crate::error::CompileError;
use crate::parse::SourceDocument;

pub const MARKER_PREFIX: &str = "data-zen-";

lazy_static! {
    static ref SCRIPT_BLOCK_RE: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
    static ref STYLE_BLOCK_RE: Regex = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT KIND SET
// ═══════════════════════════════════════════════════════════════════════════════

/// Deduplicated, lower-cased event names, always iterated in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventKindSet(BTreeSet<String>);

impl EventKindSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: &str) -> bool {
        self.0.insert(kind.to_lowercase())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.0.contains(&kind.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<'a> FromIterator<&'a str> for EventKindSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = EventKindSet::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl Serialize for EventKindSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct RewriteOutput {
    pub structural_html: String,
    /// Head children of a fragment page; empty for full documents, whose head
    /// stays in `structural_html`.
    pub head_html: String,
    pub event_kinds: EventKindSet,
}

/// The event name of an inline handler attribute (`onClick` → `click`).
pub fn event_kind_of(attr_name: &str) -> Option<String> {
    if attr_name.len() <= 2 || !attr_name.is_char_boundary(2) {
        return None;
    }
    let (prefix, word) = attr_name.split_at(2);
    if prefix.eq_ignore_ascii_case("on") {
        Some(word.to_lowercase())
    } else {
        None
    }
}

/// Rewrite handler attributes in the arena by node index.
pub fn rewrite_event_attributes(arena: &mut NodeArena) -> EventKindSet {
    let mut kinds = EventKindSet::new();

    for id in arena.element_ids() {
        let Some(el) = arena.element_mut(id) else {
            continue;
        };
        for attr in el.attrs.iter_mut() {
            if let Some(kind) = event_kind_of(&attr.name) {
                attr.name = format!("{}{}", MARKER_PREFIX, kind);
                kinds.insert(&kind);
            }
        }
    }

    kinds
}

/// Remove every inline `<script>` and `<style>` block from serialized HTML.
///
/// This is a textual, non-greedy scan: an opening tag without a matching
/// close tag is left in place.
pub fn strip_script_and_style_blocks(html: &str) -> String {
    let without_scripts = SCRIPT_BLOCK_RE.replace_all(html, "");
    STYLE_BLOCK_RE.replace_all(&without_scripts, "").to_string()
}

/// Rewrite a page into structural HTML plus the event kinds it uses.
pub fn rewrite(document: &SourceDocument, file_path: &Path) -> Result<RewriteOutput, CompileError> {
    let mut arena = NodeArena::parse(&document.raw_markup, file_path)?;
    let event_kinds = rewrite_event_attributes(&mut arena);

    let mode = SerializeMode::for_markup(&document.raw_markup);
    let structural_html = strip_script_and_style_blocks(&arena.serialize(mode));
    let head_html = match mode {
        SerializeMode::Fragment => strip_script_and_style_blocks(&arena.head_content())
            .trim()
            .to_string(),
        SerializeMode::Document => String::new(),
    };

    Ok(RewriteOutput {
        structural_html,
        head_html,
        event_kinds,
    })
}
