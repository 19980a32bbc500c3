//! HTTP middleware and shared request plumbing
//!
//! - Application state shared by every handler
//! - Session cookie resolution (`optional_auth`) and the admin guard
//! - `AppError`, rendered into themed error pages by `render_error_pages`
//! - `PageContext`, the extractor page handlers render through

use anyhow::Result;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::api::flash::{self, redirect_with_flash};
use crate::config::{Config, SiteConfig};
use crate::db::repositories::{
    SqlxBlogPostRepository, SqlxContactMessageRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    BlogService, BlogServiceError, ContactService, ContactServiceError, ContentRenderer, Mailer,
    UserService, UserServiceError,
};
use crate::theme::{CurrentUser, FlashMessage, StandardTemplateVars, ThemeEngine};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub contact_service: Arc<ContactService>,
    pub blog_service: Arc<BlogService>,
    pub content_renderer: Arc<ContentRenderer>,
    pub theme_engine: Arc<ThemeEngine>,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn build(config: &Config, pool: DynDatabasePool, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let user_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.session.ttl_days,
        );
        let contact_service = ContactService::new(
            SqlxContactMessageRepository::boxed(pool.clone()),
            mailer,
            config.mail.notify_to.clone(),
        );
        let blog_service = BlogService::new(SqlxBlogPostRepository::boxed(pool));
        let theme_engine = ThemeEngine::new(&config.theme.path)?;

        Ok(Self {
            user_service: Arc::new(user_service),
            contact_service: Arc::new(contact_service),
            blog_service: Arc::new(blog_service),
            content_renderer: Arc::new(ContentRenderer::new()),
            theme_engine: Arc::new(theme_engine),
            site: Arc::new(config.site.clone()),
        })
    }
}

/// Admin resolved from the session cookie
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(login_redirect)
    }
}

/// Handler error. The response body is filled in by [`render_error_pages`].
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Internal(anyhow::Error),
}

/// Marker left on error responses for [`render_error_pages`]
#[derive(Debug, Clone, Copy)]
struct ErrorPage;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage);
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl From<UserServiceError> for AppError {
    fn from(e: UserServiceError) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<ContactServiceError> for AppError {
    fn from(e: ContactServiceError) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<BlogServiceError> for AppError {
    fn from(e: BlogServiceError) -> Self {
        match e {
            BlogServiceError::NotFound => AppError::NotFound,
            other => AppError::Internal(other.into()),
        }
    }
}

/// Read the session token from the `session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE)
}

/// Value of the named cookie, if the request carries a non-empty one
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the session cookie, if any, and attach the admin to the request.
///
/// Invalid or expired tokens are ignored here; admin routes are guarded by
/// [`require_admin`].
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => tracing::debug!("Ignoring unknown or expired session token"),
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Redirect to the login page unless the request carries a valid session
pub async fn require_admin(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        tracing::debug!("Unauthenticated request to {}", request.uri().path());
        return login_redirect();
    }
    next.run(request).await
}

fn login_redirect() -> Response {
    redirect_with_flash(
        "/admin/login",
        &FlashMessage::error("Please log in to access this page."),
    )
}

/// Fill in the body of responses produced from an [`AppError`]
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let page = PageContext::from_request(&state, request.uri().path(), &request);
    let response = next.run(request).await;

    if response.extensions().get::<ErrorPage>().is_none() {
        return response;
    }

    let status = response.status();
    let template = if status == StatusCode::NOT_FOUND {
        "404.html"
    } else {
        "error.html"
    };
    page.render_status(&state, status, template, TeraContext::new())
}

/// Standard variables for the current request, plus the flash cookie state
pub struct PageContext {
    pub vars: StandardTemplateVars,
    /// The request carried a flash cookie that must be cleared on render
    clear_flash: bool,
}

impl PageContext {
    fn from_request(state: &AppState, path: &str, request: &Request) -> Self {
        Self::from_parts(state, path, request.headers(), request.extensions())
    }

    fn from_parts(
        state: &AppState,
        path: &str,
        headers: &HeaderMap,
        extensions: &axum::http::Extensions,
    ) -> Self {
        let flash = flash::read_flash(headers);
        let user = extensions
            .get::<AuthenticatedUser>()
            .map(|u| CurrentUser::from(&u.0));

        Self {
            clear_flash: flash::has_flash_cookie(headers),
            vars: StandardTemplateVars::new(&state.site.name, &state.site.description, path)
                .with_user(user)
                .with_flash(flash),
        }
    }

    /// Show `flash` on this page instead of the one from the cookie
    pub fn with_flash(mut self, flash: FlashMessage) -> Self {
        self.vars.flash = Some(flash);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.vars.current_user.is_some()
    }

    pub fn render(&self, state: &AppState, template: &str, context: TeraContext) -> Response {
        self.render_status(state, StatusCode::OK, template, context)
    }

    /// Render `template` with the standard variables. Template failures fall
    /// back to the error page with a 500.
    pub fn render_status(
        &self,
        state: &AppState,
        status: StatusCode,
        template: &str,
        context: TeraContext,
    ) -> Response {
        let rendered = state
            .theme_engine
            .render_with_standard_vars(template, &context, &self.vars);
        let (status, html) = match rendered {
            Ok(html) => (status, html),
            Err(e) => {
                tracing::error!("{:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    state
                        .theme_engine
                        .render_with_fallback("error.html", &self.vars.extend(&context)),
                )
            }
        };

        if self.clear_flash {
            (
                status,
                AppendHeaders([(header::SET_COOKIE, flash::clear_flash_cookie())]),
                Html(html),
            )
                .into_response()
        } else {
            (status, Html(html)).into_response()
        }
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        Ok(Self::from_parts(state, &path, &parts.headers, &parts.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let headers = headers_with_cookie("theme=dark; session=abc-123; flash=x");
        assert_eq!(extract_session_token(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
        assert!(extract_session_token(&headers_with_cookie("session=")).is_none());
        assert!(extract_session_token(&headers_with_cookie("xsession=abc")).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", 604800);
        assert_eq!(cookie, "session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800");
        assert!(clear_session_cookie().ends_with("Max-Age=0"));
    }

    #[test]
    fn test_app_error_status() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_blog_not_found_maps_to_404() {
        let error: AppError = BlogServiceError::NotFound.into();
        assert!(matches!(error, AppError::NotFound));

        let error: AppError = BlogServiceError::ValidationError("x".to_string()).into();
        assert!(matches!(error, AppError::Internal(_)));
    }
}
