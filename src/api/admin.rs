//! Admin login, logout and the contact message inbox

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::api::flash::set_flash_cookie;
use crate::api::middleware::{
    clear_session_cookie, extract_session_token, session_cookie, AppError, AppState,
    AuthenticatedUser, PageContext,
};
use crate::services::{LoginInput, UserServiceError};
use crate::theme::FlashMessage;

/// Where a successful login lands
const ADMIN_HOME: &str = "/admin/messages";

/// GET /admin/login
pub async fn login_page(State(state): State<AppState>, page: PageContext) -> Response {
    if page.is_authenticated() {
        return Redirect::to(ADMIN_HOME).into_response();
    }
    page.render(&state, "admin/login.html", TeraContext::new())
}

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    page: PageContext,
    Form(input): Form<LoginInput>,
) -> Result<Response, AppError> {
    // Already signed in: no second session.
    if page.is_authenticated() {
        return Ok(Redirect::to(ADMIN_HOME).into_response());
    }

    let username = input.username.clone();
    match state.user_service.login(input).await {
        Ok(session) => {
            let max_age = session.remaining_secs();
            Ok((
                AppendHeaders([
                    (header::SET_COOKIE, session_cookie(&session.id, max_age)),
                    (
                        header::SET_COOKIE,
                        set_flash_cookie(&FlashMessage::success("Successfully logged in!")),
                    ),
                ]),
                Redirect::to(ADMIN_HOME),
            )
                .into_response())
        }
        Err(UserServiceError::AuthenticationError(msg)) => {
            tracing::info!("Failed login attempt for '{}'", username);
            let mut context = TeraContext::new();
            context.insert("username", &username);
            Ok(page
                .with_flash(FlashMessage::error(msg))
                .render(&state, "admin/login.html", context))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }
    tracing::info!("User '{}' logged out", user.username);

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, clear_session_cookie()),
            (
                header::SET_COOKIE,
                set_flash_cookie(&FlashMessage::success("Successfully logged out!")),
            ),
        ]),
        Redirect::to("/admin/login"),
    )
        .into_response())
}

/// GET /admin/messages
pub async fn messages(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    let messages = state.contact_service.list().await?;

    let mut context = TeraContext::new();
    context.insert("messages", &messages);
    Ok(page.render(&state, "admin/messages.html", context))
}
