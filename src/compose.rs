//! Component/layout composition seam.
//!
//! Component inlining and slot composition happen outside this crate. A
//! [`PageComposer`] receives the parsed page and hands back an equivalent,
//! flattened document plus the binding descriptors the runtime synthesizer
//! wires up. Binding expressions are opaque strings here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CompileError;
use crate::parse::SourceDocument;

/// A reactive state slot seeded before any binding runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDeclaration {
    pub name: String,
    pub initial_value: String,
}

/// One reactive binding. `id` matches a `data-zen-text="<id>"` or
/// `data-zen-attr-<target>="<id>"` marker already present in the markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub id: String,
    /// Attribute name for attribute bindings; unused for text bindings.
    #[serde(default)]
    pub target: String,
    pub expression: String,
}

impl Binding {
    pub fn text(id: &str, expression: &str) -> Self {
        Binding {
            id: id.to_string(),
            target: String::new(),
            expression: expression.to_string(),
        }
    }

    pub fn attribute(id: &str, target: &str, expression: &str) -> Self {
        Binding {
            id: id.to_string(),
            target: target.to_string(),
            expression: expression.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageBindings {
    pub state: Vec<StateDeclaration>,
    pub text: Vec<Binding>,
    pub attributes: Vec<Binding>,
}

impl PageBindings {
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.text.is_empty() && self.attributes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ComposedPage {
    pub document: SourceDocument,
    pub bindings: PageBindings,
}

pub trait PageComposer: Sync {
    fn compose(&self, document: SourceDocument, path: &Path)
        -> Result<ComposedPage, CompileError>;
}

/// Composer for pages that use no components or bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughComposer;

impl PageComposer for PassthroughComposer {
    fn compose(
        &self,
        document: SourceDocument,
        _path: &Path,
    ) -> Result<ComposedPage, CompileError> {
        Ok(ComposedPage {
            document,
            bindings: PageBindings::default(),
        })
    }
}
