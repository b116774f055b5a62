//! Server construction and middleware wiring.

mod config;

pub use config::{AppConfig, ConfigError};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::{AccountService, RequestService};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::session::SESSION_TTL_DAYS;
use crate::inbound::http::state::HttpState;
use crate::inbound::http;
use crate::middleware::trace::Trace;
use crate::outbound::persistence::memory::{InMemoryRequestRepository, InMemoryUserRepository};
use crate::outbound::photos::FsPhotoStore;

fn build_session_middleware(
    key: Key,
    cookie_secure: bool,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(actix_web::cookie::time::Duration::days(SESSION_TTL_DAYS)),
        )
        .build()
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(build_session_middleware(key, cookie_secure))
        .wrap(Trace)
        .configure(http::configure_api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Wire the default in-memory port bundle: seeded demo accounts, an empty
/// request store, and filesystem photo storage under `upload_dir`.
pub fn build_default_state(upload_dir: impl Into<std::path::PathBuf>) -> HttpState {
    let users = Arc::new(InMemoryUserRepository::seeded_with_demo_accounts());
    let requests = Arc::new(InMemoryRequestRepository::new());
    let photos = Arc::new(FsPhotoStore::new(upload_dir));

    let accounts = Arc::new(AccountService::new(users));
    let intake = Arc::new(RequestService::new(requests, photos));
    HttpState::new(accounts.clone(), accounts, intake.clone(), intake)
}

/// Construct the HTTP server and mark the health state ready once bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: AppConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let AppConfig {
        bind_addr,
        session_key,
        cookie_secure,
        upload_dir,
    } = config;
    let http_state = web::Data::new(build_default_state(upload_dir));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: session_key.clone(),
            cookie_secure,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
