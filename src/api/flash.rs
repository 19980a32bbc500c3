//! One-shot flash messages
//!
//! A flash travels in a `flash` cookie as `kind:url-encoded-message`. It is
//! set on a redirect and shown (then cleared) by the next rendered page.

use axum::{
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};

use crate::api::middleware::cookie_value;
use crate::theme::{FlashKind, FlashMessage};

pub const FLASH_COOKIE: &str = "flash";

/// Cookie value for `flash`
pub fn encode_flash(flash: &FlashMessage) -> String {
    format!(
        "{}:{}",
        flash.kind.as_str(),
        urlencoding::encode(&flash.message)
    )
}

/// Parse a cookie value produced by [`encode_flash`]
pub fn decode_flash(value: &str) -> Option<FlashMessage> {
    let (kind, message) = value.split_once(':')?;
    let kind = FlashKind::parse(kind)?;
    let message = urlencoding::decode(message).ok()?.into_owned();
    if message.is_empty() {
        return None;
    }
    Some(FlashMessage { kind, message })
}

/// The flash carried by this request, if any and well-formed
pub fn read_flash(headers: &HeaderMap) -> Option<FlashMessage> {
    let value = cookie_value(headers, FLASH_COOKIE)?;
    let flash = decode_flash(&value);
    if flash.is_none() {
        tracing::debug!("Discarding malformed flash cookie");
    }
    flash
}

pub fn has_flash_cookie(headers: &HeaderMap) -> bool {
    cookie_value(headers, FLASH_COOKIE).is_some()
}

pub fn set_flash_cookie(flash: &FlashMessage) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        encode_flash(flash)
    )
}

pub fn clear_flash_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", FLASH_COOKIE)
}

/// 303 redirect to `to` carrying `flash`
pub fn redirect_with_flash(to: &str, flash: &FlashMessage) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, set_flash_cookie(flash))]),
        Redirect::to(to),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn test_encode_is_cookie_safe() {
        let flash = FlashMessage::success("Thank you for your message! We will get back to you soon.");
        let encoded = encode_flash(&flash);

        assert!(encoded.starts_with("success:Thank%20you"));
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains(';'));
        assert!(!encoded.contains(','));
        assert_eq!(decode_flash(&encoded), Some(flash));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_flash("no-separator").is_none());
        assert!(decode_flash("info:hello").is_none());
        assert!(decode_flash("error:").is_none());
    }

    #[test]
    fn test_read_flash_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=abc; flash=error:Invalid%20username%20or%20password"),
        );

        let flash = read_flash(&headers).unwrap();
        assert_eq!(flash, FlashMessage::error("Invalid username or password"));
        assert!(has_flash_cookie(&headers));
    }

    #[test]
    fn test_redirect_with_flash() {
        let response = redirect_with_flash("/contact", &FlashMessage::success("Saved"));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/contact");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash=success:Saved;"));
        assert!(cookie.contains("HttpOnly"));
    }
}
