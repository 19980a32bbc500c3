//! Static file serving
//!
//! `/static/*` is served from the theme directory's `static/` folder when the
//! file exists there, otherwise from the assets embedded in the binary.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use std::path::Component;
use tokio::fs;

use crate::api::middleware::AppState;

/// Embedded site assets
#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// GET /static/{*path}
pub async fn serve_static(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    if !is_safe_path(&path) {
        tracing::debug!("Rejected static path: {}", path);
        return not_found();
    }

    if let Some(theme_path) = state.theme_engine.theme_path() {
        let file = theme_path.join("static").join(&path);
        if let Ok(contents) = fs::read(&file).await {
            return build_response(&path, contents);
        }
    }

    match StaticAssets::get(&path) {
        Some(content) => build_response(&path, content.data.into_owned()),
        None => not_found(),
    }
}

/// Relative path with no parent, root or prefix components
fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && std::path::Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    let content_type = get_content_type(path);
    let cache_control = if content_type.starts_with("text/html") {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        data,
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
