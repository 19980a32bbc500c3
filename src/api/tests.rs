//! Router tests driven through `tower::ServiceExt::oneshot`

use super::*;
use crate::config::Config;
use crate::db::{create_test_pool, migrations, DatabasePool, DynDatabasePool};
use crate::services::email::RecordingMailer;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    mailer: Arc<RecordingMailer>,
    pool: DynDatabasePool,
}

impl TestApp {
    async fn new() -> Self {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let mut config = Config::default();
        config.theme.path = "/nonexistent/aptinnova-theme".into();
        config.mail.notify_to = Some("sales@example.com".to_string());

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::build(&config, pool.clone(), mailer.clone()).unwrap();
        state
            .user_service
            .ensure_admin("admin", "admin123")
            .await
            .unwrap();

        let router = build_router(state.clone(), &config.server.cors_origin).unwrap();
        Self {
            router,
            state,
            mailer,
            pool,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Log in as the seeded admin and return the `session=...` cookie pair
    async fn login(&self) -> String {
        let response = self
            .post_form("/admin/login", "username=admin&password=admin123", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        set_cookie(&response, "session").expect("session cookie")
    }
}

/// `name=value` of the named Set-Cookie header, if present
fn set_cookie(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_home_and_services_render() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Aptinnova"));

    let response = app.get("/services", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Our Services"));
}

#[tokio::test]
async fn test_unknown_route_renders_404_page() {
    let app = TestApp::new().await;

    let response = app.get("/no/such/page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response).await;
    assert!(body.contains("Page not found"));
    assert!(body.contains("&#x2F;no&#x2F;such&#x2F;page"));
}

#[tokio::test]
async fn test_contact_submission_stores_and_notifies() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/contact",
            "name=Ada&email=ada%40example.com&company=Acme&message=Need+a+quote",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/contact");
    let flash = set_cookie(&response, "flash").unwrap();
    assert!(flash.starts_with("flash=success:Thank%20you"));

    let messages = app.state.contact_service.list().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].company.as_deref(), Some("Acme"));
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_contact_empty_message_stores_nothing() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/contact", "name=Ada&email=ada%40example.com&message=", None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response, "flash").unwrap().starts_with("flash=error:"));
    assert!(app.state.contact_service.list().await.unwrap().is_empty());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_flash_is_shown_once_and_cleared() {
    let app = TestApp::new().await;

    let response = app.get("/contact", Some("flash=success:Saved%20it")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().unwrap().starts_with("flash=;") && v.to_str().unwrap().contains("Max-Age=0"));
    assert!(cleared);
    assert!(body_string(response).await.contains("Saved it"));
}

#[tokio::test]
async fn test_admin_pages_require_login() {
    let app = TestApp::new().await;

    for uri in ["/admin/messages", "/admin/blog", "/admin/blog/new", "/admin/logout"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/admin/login");
        assert_eq!(
            set_cookie(&response, "flash").unwrap(),
            "flash=error:Please%20log%20in%20to%20access%20this%20page."
        );
    }

    let response = app.get("/admin/messages", Some("session=forged")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_with_bad_password() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/admin/login", "username=admin&password=wrong", None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response, "session").is_none());
    let body = body_string(response).await;
    assert!(body.contains("Invalid username or password"));
    assert!(body.contains("value=\"admin\""));
}

#[tokio::test]
async fn test_login_then_view_messages() {
    let app = TestApp::new().await;
    app.post_form(
        "/contact",
        "name=Grace&email=grace%40example.com&message=Hello+there",
        None,
    )
    .await;

    let response = app
        .post_form("/admin/login", "username=admin&password=admin123", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/messages");
    let session = set_cookie(&response, "session").unwrap();
    let flash = set_cookie(&response, "flash").unwrap();
    assert_eq!(flash, "flash=success:Successfully%20logged%20in%21");

    let response = app
        .get("/admin/messages", Some(&format!("{}; {}", session, flash)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Successfully logged in!"));
    assert!(body.contains("grace@example.com"));
    assert!(body.contains("Hello there"));
}

#[tokio::test]
async fn test_second_login_with_valid_session_is_redirected() {
    let app = TestApp::new().await;
    let session = app.login().await;

    let response = app.get("/admin/login", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/messages");

    let response = app
        .post_form("/admin/login", "username=admin&password=admin123", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/messages");
    assert!(set_cookie(&response, "session").is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new().await;
    let session = app.login().await;

    let response = app.get("/admin/logout", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/login");
    assert_eq!(set_cookie(&response, "session").unwrap(), "session=");
    assert_eq!(
        set_cookie(&response, "flash").unwrap(),
        "flash=success:Successfully%20logged%20out%21"
    );

    let response = app.get("/admin/messages", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/login");
}

#[tokio::test]
async fn test_admin_creates_and_public_reads_post() {
    let app = TestApp::new().await;
    let session = app.login().await;

    let response = app
        .post_form(
            "/admin/blog/new",
            "title=Hello+World&content=%23+Intro%0A%0ABody&content_format=markdown&is_published=on",
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/blog");

    let response = app.get("/blog", None).await;
    assert!(body_string(response).await.contains("/blog/hello-world"));

    let response = app.get("/blog/hello-world", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("<h1 id=\"intro\">Intro</h1>"));
}

#[tokio::test]
async fn test_draft_posts_are_not_public() {
    let app = TestApp::new().await;
    let session = app.login().await;

    app.post_form(
        "/admin/blog/new",
        "title=Secret+Plans&content=Soon",
        Some(&session),
    )
    .await;

    let response = app.get("/blog/secret-plans", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/admin/blog", Some(&session)).await;
    let body = body_string(response).await;
    assert!(body.contains("Secret Plans"));
    assert!(body.contains("Draft"));
}

#[tokio::test]
async fn test_invalid_post_form_is_redisplayed() {
    let app = TestApp::new().await;
    let session = app.login().await;

    let response = app
        .post_form("/admin/blog/new", "title=&content=Body+kept", Some(&session))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("Title is required"));
    assert!(body.contains("Body kept"));
    assert!(app.state.blog_service.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_and_delete_post() {
    let app = TestApp::new().await;
    let session = app.login().await;

    app.post_form(
        "/admin/blog/new",
        "title=First&content=One&is_published=on",
        Some(&session),
    )
    .await;
    let post = app.state.blog_service.list_all().await.unwrap().remove(0);

    let response = app
        .get(&format!("/admin/blog/{}/edit", post.id), Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("value=\"First\""));
    assert!(body.contains("value=\"first\""));

    // Browsers send the prefilled slug back with the new title
    let response = app
        .post_form(
            &format!("/admin/blog/{}/edit", post.id),
            "title=First+Edited&slug=first&content=Two&content_format=markdown&is_published=on",
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let updated = app.state.blog_service.get_by_id(post.id).await.unwrap();
    assert_eq!(updated.slug, "first-edited");

    let response = app
        .post_form(&format!("/admin/blog/{}/delete", post.id), "", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.get("/blog/first-edited", None).await.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_form(&format!("/admin/blog/{}/delete", post.id), "", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_storage_failure_keeps_the_form() {
    let app = TestApp::new().await;
    let session = app.login().await;
    app.pool.execute("DROP TABLE blog_posts").await.unwrap();

    let response = app
        .post_form(
            "/admin/blog/new",
            "title=Lost+Post&content=Still+here",
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("the post could not be saved"));
    assert!(body.contains("Still here"));
    assert!(!body.contains("Something went wrong"));

    let response = app
        .post_form("/admin/blog/1/delete", "", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/blog");
    assert!(set_cookie(&response, "flash")
        .unwrap()
        .starts_with("flash=error:"));
}

#[tokio::test]
async fn test_edit_missing_post_is_404() {
    let app = TestApp::new().await;
    let session = app.login().await;

    let response = app.get("/admin/blog/999/edit", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Page not found"));
}

#[tokio::test]
async fn test_static_assets() {
    let app = TestApp::new().await;

    let response = app.get("/static/css/site.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");

    let response = app.get("/static/css/missing.css", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_cors_origin_is_rejected() {
    let app = TestApp::new().await;
    assert!(build_router(app.state.clone(), "bad\norigin").is_err());
}
