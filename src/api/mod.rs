//! HTTP layer - handlers and routing
//!
//! - Marketing pages and the contact form
//! - Public blog
//! - Admin login and contact inbox
//! - Admin blog management
//! - Embedded static assets

pub mod admin;
pub mod admin_blog;
pub mod blog;
pub mod contact;
pub mod flash;
pub mod middleware;
pub mod site;
pub mod static_files;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{AppError, AppState, AuthenticatedUser, PageContext};

/// Admin-only routes; unauthenticated requests are sent to the login page
fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/logout", get(admin::logout))
        .route("/admin/messages", get(admin::messages))
        .route("/admin/blog", get(admin_blog::list_posts))
        .route(
            "/admin/blog/new",
            get(admin_blog::new_post).post(admin_blog::create_post),
        )
        .route(
            "/admin/blog/{id}/edit",
            get(admin_blog::edit_post).post(admin_blog::update_post),
        )
        .route("/admin/blog/{id}/delete", post(admin_blog::delete_post))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
}

/// Every HTML page, with session resolution and themed error pages
fn page_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(site::home))
        .route("/services", get(site::services))
        .route("/blog", get(blog::list_posts))
        .route("/blog/{slug}", get(blog::show_post))
        .route(
            "/contact",
            get(contact::contact_page).post(contact::submit_contact),
        )
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .merge(admin_router())
        .fallback(site::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        // Outermost so error pages also know who is logged in
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true);

    Ok(page_router(state.clone())
        .route("/static/{*path}", get(static_files::serve_static))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
mod tests;
