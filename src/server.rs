//! Static server for a built site.
//!
//! Every request goes through [`RouteResolver`]; there are no other routes.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};

use crate::resolve::{Resolution, RouteResolver};

/// Content type for a served file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

pub fn router(resolver: RouteResolver) -> Router {
    Router::new()
        .fallback(fallback_handler)
        .with_state(Arc::new(resolver))
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(resolver: RouteResolver, addr: &str) -> std::io::Result<()> {
    tracing::info!(
        "Serving {} at http://{}",
        resolver.output_root().display(),
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(resolver)).await
}

async fn fallback_handler(
    State(resolver): State<Arc<RouteResolver>>,
    request: Request,
) -> Response {
    respond(&resolver, request.uri().path()).await
}

/// Resolve `pathname` and answer with the file, or 404.
pub async fn respond(resolver: &RouteResolver, pathname: &str) -> Response {
    let resolution = resolver.resolve(pathname);
    let Some(path) = resolution.path() else {
        tracing::debug!("{} -> not found", pathname);
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(path).await {
        Ok(bytes) => {
            tracing::debug!("{} -> {}", pathname, path.display());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type_for(path))],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            if !matches!(resolution, Resolution::Asset(_)) {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
            }
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
