//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, test, web};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{AccountService, RequestService};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::memory::{InMemoryRequestRepository, InMemoryUserRepository};
use crate::outbound::photos::FsPhotoStore;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Build a full port bundle over in-memory stores with the demo accounts
/// seeded and a per-call scratch photo directory.
pub fn test_state() -> HttpState {
    let users = Arc::new(InMemoryUserRepository::seeded_with_demo_accounts());
    let requests = Arc::new(InMemoryRequestRepository::new());
    let photo_root = std::env::temp_dir().join(format!("domovoy-test-{}", Uuid::new_v4()));
    let photos = Arc::new(FsPhotoStore::new(photo_root));

    let accounts = Arc::new(AccountService::new(users));
    let intake = Arc::new(RequestService::new(requests, photos));
    HttpState::new(accounts.clone(), accounts, intake.clone(), intake)
}

/// Assemble the API application over the given state.
pub fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(state))
        .configure(super::configure_api)
}

async fn login_with(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    email: &str,
) -> Cookie<'static> {
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": "password123" }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "demo login failed for {email}");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Log in as the seeded demo resident and return the session cookie.
pub async fn login_as_resident(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) -> Cookie<'static> {
    login_with(app, "resident@demo.com").await
}

/// Log in as the seeded demo staff member and return the session cookie.
pub async fn login_as_staff(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) -> Cookie<'static> {
    login_with(app, "staff@demo.com").await
}

/// Hand-assemble a multipart submission body.
///
/// Returns the `Content-Type` header value and the raw payload.
pub fn multipart_submission(
    category: &str,
    description: &str,
    priority: &str,
    apartment: Option<&str>,
    photos: &[(&str, &str, &[u8])],
) -> (String, Vec<u8>) {
    let boundary = "----domovoy-test-boundary";
    let mut body = Vec::new();

    let mut text_field = |name: &str, value: &str| {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    };
    text_field("category", category);
    text_field("description", description);
    text_field("priority", priority);
    if let Some(apartment) = apartment {
        text_field("apartment", apartment);
    }

    for (file_name, content_type, bytes) in photos {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"photos\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}
