//! Build pipeline: discovery, then per-page parse → compose → rewrite →
//! synthesize → emit.
//!
//! The output root is cleared once before the batch. A failing page is
//! recorded in the report and never stops the others.

use rayon::prelude::*;
use std::path::PathBuf;

use crate::codegen::{assemble_scripts, synthesize};
use crate::compose::PageComposer;
use crate::config::BuildConfig;
use crate::discovery::{discover_routes, Route};
use crate::error::{BuildWarning, CompileError};
use crate::finalize::{EmitSummary, Emitter, PageArtifacts};
use crate::parse::parse_source;
use crate::transform::rewrite;

#[derive(Debug)]
pub struct PageFailure {
    pub route: Route,
    pub error: CompileError,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub routes: Vec<Route>,
    /// HTML files written, output-root joined.
    pub emitted: Vec<PathBuf>,
    pub failed: Vec<PageFailure>,
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compile one route and write its artifacts.
pub fn compile_page(
    route: &Route,
    emitter: &Emitter,
    composer: &dyn PageComposer,
) -> Result<EmitSummary, CompileError> {
    let source = parse_source(&route.source_path)?;
    let composed = composer.compose(source, &route.source_path)?;

    let rewritten = rewrite(&composed.document, &route.source_path)?;
    let runtime = synthesize(&rewritten.event_kinds, &composed.bindings);
    let scripts = assemble_scripts(&composed.document.scripts, &runtime);

    let page = PageArtifacts {
        html: rewritten.structural_html,
        head: rewritten.head_html,
        scripts,
        styles: composed.document.styles,
    };

    let summary = emitter.emit_route(&page, route)?;
    tracing::info!(
        "Compiled {} -> {} ({} assets)",
        route.pattern,
        summary.html_path.display(),
        summary.assets.len()
    );
    Ok(summary)
}

/// Build every page under `config.pages_dir` into `config.out_dir`.
///
/// Only a failure to clear the output root or install the favicon aborts
/// the build.
pub fn build_site(
    config: &BuildConfig,
    composer: &dyn PageComposer,
) -> Result<BuildReport, CompileError> {
    let table = discover_routes(&config.pages_dir);
    let emitter = Emitter::new(&config.out_dir).with_base_path(&config.base_path);
    emitter.clear()?;

    // Pages-root favicon first, then page directories in route order.
    let favicon_dirs = std::iter::once(config.pages_dir.as_path())
        .chain(table.routes.iter().filter_map(|r| r.source_path.parent()));
    let favicon_warning = emitter.install_favicon(favicon_dirs)?;

    tracing::info!(
        "Building {} routes from {} into {}",
        table.len(),
        config.pages_dir.display(),
        config.out_dir.display()
    );

    let results: Vec<Result<EmitSummary, CompileError>> = if config.parallel {
        table
            .routes
            .par_iter()
            .map(|route| compile_page(route, &emitter, composer))
            .collect()
    } else {
        table
            .routes
            .iter()
            .map(|route| compile_page(route, &emitter, composer))
            .collect()
    };

    let mut report = BuildReport {
        routes: table.routes.clone(),
        warnings: table.warnings,
        ..BuildReport::default()
    };
    report.warnings.extend(favicon_warning);

    for (route, result) in table.routes.into_iter().zip(results) {
        match result {
            Ok(summary) => report.emitted.push(summary.html_path),
            Err(error) => {
                tracing::warn!("[{}] {} ({})", error.code(), error, route.pattern);
                report.failed.push(PageFailure { route, error });
            }
        }
    }

    tracing::info!(
        "Emitted {} pages, {} failed, {} warnings",
        report.emitted.len(),
        report.failed.len(),
        report.warnings.len()
    );
    Ok(report)
}
