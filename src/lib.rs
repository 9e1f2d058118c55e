//! # Zenith Site Compiler
//!
//! Compiles a directory tree of `.zen` page sources into a static
//! multi-page site, and resolves request paths against the built output.
//!
//! ## Build Pipeline
//!
//! 1. **Discovery**: every `.zen` file under the pages root becomes a route.
//!    `blog/index.zen` → `/blog` → `blog/index.html`, `about.zen` → `/about`
//!    → `about.html`.
//! 2. **Parse**: script and style blocks are cataloged in document order.
//! 3. **Compose**: a [`PageComposer`] flattens components and reports bindings.
//! 4. **Rewrite**: `on<event>` attributes become `data-zen-<event>` markers;
//!    script and style blocks leave the structural HTML.
//! 5. **Synthesize**: binding and event-dispatch runtimes are generated and
//!    joined with the user scripts (first slot only).
//! 6. **Emit**: one HTML file plus `script-N.js`/`style-N.css` side-files per
//!    route, under a per-route asset directory.
//!
//! Serving walks the same naming rules backwards via [`RouteResolver`].

mod codegen;
mod compose;
mod config;
mod discovery;
mod document;
mod error;
mod finalize;
mod parse;
mod pipeline;
mod resolve;
mod server;
mod transform;

#[cfg(test)]
mod pipeline_tests;

pub use codegen::{
    assemble_scripts, generate_attribute_binding_runtime, generate_event_runtime,
    generate_text_binding_runtime, synthesize, AssembledScript, PageRuntime, RuntimeFragment,
    RuntimeSlot,
};
pub use compose::{
    Binding, ComposedPage, PageBindings, PageComposer, PassthroughComposer, StateDeclaration,
};
pub use config::{BuildConfig, ServeConfig, SiteConfig, CONFIG_FILE_NAME};
pub use discovery::{
    asset_dir, discover_routes, file_path_to_route, normalize_base_path, page_file, PageLayout,
    Route, RouteTable, PAGE_EXTENSION,
};
pub use document::{NodeArena, SerializeMode};
pub use error::{BuildWarning, CompileError, ConfigError};
pub use finalize::{EmitSummary, Emitter, PageArtifacts, FAVICON_FILE};
pub use parse::{parse_markup, parse_source, ScriptBlock, SourceDocument, StyleBlock};
pub use pipeline::{build_site, compile_page, BuildReport, PageFailure};
pub use resolve::{normalize_pathname, FallbackPolicy, Resolution, RouteResolver};
pub use server::{router, serve};
pub use transform::{event_kind_of, rewrite, EventKindSet, RewriteOutput, MARKER_PREFIX};
