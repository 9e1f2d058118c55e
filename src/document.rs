//! # Page Document Arena
//!
//! Page markup is parsed once with html5ever and copied into an owned,
//! index-addressed arena. Passes that rewrite the tree do so by node index,
//! so no pass ever mutates a live `Rc` tree while walking it.
//!
//! ## Invariants
//!
//! 1. **Document Order**: node ids are assigned in pre-order, so iterating
//!    `0..len()` visits nodes exactly in document order.
//! 2. **Root**: node `0` is always the document node.
//!
//! `<template>` contents live in a separate html5ever fragment and are not copied.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::HashSet;
use std::path::Path;

use crate::error::CompileError;

pub type NodeId = usize;

pub const DOCUMENT_ROOT: NodeId = 0;

lazy_static! {
    static ref VOID_ELEMENTS: HashSet<&'static str> = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect();

    /// Elements whose text children are serialized verbatim.
    static ref RAW_TEXT_ELEMENTS: HashSet<&'static str> = [
        "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
    ]
    .into_iter()
    .collect();
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<Attr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// How much of the parsed tree `serialize` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeMode {
    /// Doctype, `<html>`, `<head>` and `<body>` included.
    Document,
    /// Implicit `html`/`body` wrappers flattened away. `head` children are
    /// left out; see [`NodeArena::head_content`].
    Fragment,
}

impl SerializeMode {
    /// Fragments only get their wrappers back if the author wrote `<html>`.
    pub fn for_markup(markup: &str) -> Self {
        if markup.to_ascii_lowercase().contains("<html") {
            SerializeMode::Document
        } else {
            SerializeMode::Fragment
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARENA
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    /// Parse markup with html5ever and copy the result into an arena.
    pub fn parse(markup: &str, file_path: &Path) -> Result<Self, CompileError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut markup.as_bytes())
            .map_err(|e| {
                CompileError::parse(file_path, format!("Failed to parse HTML: {}", e))
            })?;

        let mut arena = NodeArena { nodes: Vec::new() };
        arena.push_handle(&dom.document);
        Ok(arena)
    }

    fn push_handle(&mut self, handle: &Handle) -> Option<NodeId> {
        let kind = match &handle.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => NodeKind::Doctype {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            },
            NodeData::Text { contents } => NodeKind::Text(contents.borrow().to_string()),
            NodeData::Comment { contents } => NodeKind::Comment(contents.to_string()),
            NodeData::Element { name, attrs, .. } => NodeKind::Element(ElementData {
                name: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|attr| Attr {
                        name: match &attr.name.prefix {
                            Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                            None => attr.name.local.to_string(),
                        },
                        value: attr.value.to_string(),
                    })
                    .collect(),
            }),
            NodeData::ProcessingInstruction { .. } => return None,
        };

        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });

        let mut children = Vec::new();
        for child in handle.children.borrow().iter() {
            children.extend(self.push_handle(child));
        }

        self.nodes[id].children = children;
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Element data of `id`, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Ids of every element, in document order.
    pub fn element_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| matches!(self.nodes[id].kind, NodeKind::Element(_)))
            .collect()
    }

    /// Concatenated text of all descendants of `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in &self.nodes[id].children {
            match &self.nodes[child].kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(_) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn serialize(&self, mode: SerializeMode) -> String {
        let mut out = String::new();
        if self.nodes.is_empty() {
            return out;
        }

        match mode {
            SerializeMode::Document => {
                for &child in &self.nodes[DOCUMENT_ROOT].children {
                    self.write_node(child, false, &mut out);
                }
            }
            SerializeMode::Fragment => {
                for &child in &self.nodes[DOCUMENT_ROOT].children {
                    self.write_flattened(child, &mut out);
                }
            }
        }
        out
    }

    /// Serialized children of the `<head>` element, or empty if there is none.
    pub fn head_content(&self) -> String {
        let mut out = String::new();
        let head = self
            .element_ids()
            .into_iter()
            .find(|&id| self.element(id).map(|el| el.name == "head").unwrap_or(false));
        if let Some(head) = head {
            for &child in &self.nodes[head].children {
                self.write_node(child, false, &mut out);
            }
        }
        out
    }

    /// Write a node, dropping implicit document wrappers and the head.
    fn write_flattened(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Doctype { .. } => {}
            NodeKind::Element(el) if el.name == "head" => {}
            NodeKind::Element(el) if matches!(el.name.as_str(), "html" | "body") => {
                for &child in &self.nodes[id].children {
                    self.write_flattened(child, out);
                }
            }
            _ => self.write_node(id, false, out),
        }
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Document => {
                for &child in &node.children {
                    self.write_node(child, false, out);
                }
            }
            NodeKind::Doctype {
                name,
                public_id,
                system_id,
            } => {
                out.push_str(&format!("<!DOCTYPE {}", name));
                if !public_id.is_empty() {
                    out.push_str(&format!(" PUBLIC \"{}\"", public_id));
                }
                if !system_id.is_empty() {
                    out.push_str(&format!(" \"{}\"", system_id));
                }
                out.push('>');
            }
            NodeKind::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for attr in &el.attrs {
                    out.push_str(&format!(" {}=\"{}\"", attr.name, escape_attr(&attr.value)));
                }

                if VOID_ELEMENTS.contains(el.name.as_str()) && node.children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');

                let child_raw = RAW_TEXT_ELEMENTS.contains(el.name.as_str());
                for &child in &node.children {
                    self.write_node(child, child_raw, out);
                }

                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
