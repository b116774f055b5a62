//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod assistant;
pub mod auth;
pub mod error;
pub mod health;
pub mod requests;
pub mod session;
pub mod staff;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::{ApiError, ApiResult};

use actix_web::web;

/// Register every `/api/v1` endpoint.
///
/// The caller supplies [`state::HttpState`] via `app_data` and wraps the app
/// in a session middleware.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(accounts::register)
            .service(accounts::login)
            .service(accounts::logout)
            .service(accounts::me)
            .service(assistant::step)
            .service(requests::submit)
            .service(requests::list_own)
            .service(requests::detail)
            .service(requests::update_status)
            .service(requests::update_notes)
            .service(staff::board),
    );
}
