//! Contact form

use axum::{extract::State, response::Response, Form};
use tera::Context as TeraContext;

use crate::api::flash::redirect_with_flash;
use crate::api::middleware::{AppState, PageContext};
use crate::models::ContactMessageInput;
use crate::services::ContactServiceError;
use crate::theme::FlashMessage;

const SUCCESS_MESSAGE: &str = "Thank you for your message! We will get back to you soon.";
const FAILURE_MESSAGE: &str = "Sorry, there was an error sending your message. Please try again.";

/// GET /contact
pub async fn contact_page(State(state): State<AppState>, page: PageContext) -> Response {
    page.render(&state, "contact.html", TeraContext::new())
}

/// POST /contact
///
/// Always answers with a redirect back to the form; the outcome travels in
/// the flash.
pub async fn submit_contact(
    State(state): State<AppState>,
    Form(input): Form<ContactMessageInput>,
) -> Response {
    let flash = match state.contact_service.submit(input).await {
        Ok(_) => FlashMessage::success(SUCCESS_MESSAGE),
        Err(ContactServiceError::ValidationError(msg)) => {
            tracing::debug!("Rejected contact submission: {}", msg);
            FlashMessage::error(msg)
        }
        Err(e) => {
            tracing::error!("Failed to handle contact submission: {}", e);
            FlashMessage::error(FAILURE_MESSAGE)
        }
    };

    redirect_with_flash("/contact", &flash)
}
