//! OpenAPI documentation configuration.
//!
//! Registers every `/api/v1` endpoint, the wire schemas, and the session
//! cookie security scheme. Swagger UI serves the document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::assistant::{DialogueState, DialogueStep, RequestSummary};
use crate::domain::ports::RequestStats;
use crate::domain::request::{Category, ConversationTurn, Priority, Speaker, Status};
use crate::domain::user::Role;
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::accounts::{LoginRequest, ProfileResponse, RegisterRequest};
use crate::inbound::http::assistant::{StepRequest, StepResponse};
use crate::inbound::http::requests::{
    NotesUpdate, RequestResponse, RequestWithResident, StatusUpdate,
};
use crate::inbound::http::staff::BoardResponse;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or /register.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Domovoy backend API",
        description = "Session-authenticated intake and triage of building \
                       maintenance requests."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::me,
        crate::inbound::http::assistant::step,
        crate::inbound::http::requests::submit,
        crate::inbound::http::requests::list_own,
        crate::inbound::http::requests::detail,
        crate::inbound::http::requests::update_status,
        crate::inbound::http::requests::update_notes,
        crate::inbound::http::staff::board,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        Category,
        Priority,
        Status,
        Speaker,
        ConversationTurn,
        DialogueState,
        DialogueStep,
        RequestSummary,
        RequestStats,
        RegisterRequest,
        LoginRequest,
        ProfileResponse,
        StepRequest,
        StepResponse,
        StatusUpdate,
        NotesUpdate,
        RequestResponse,
        RequestWithResident,
        BoardResponse,
    )),
    tags(
        (name = "accounts", description = "Registration, login, and profile"),
        (name = "assistant", description = "Scripted intake dialogue"),
        (name = "requests", description = "Maintenance request lifecycle"),
        (name = "staff", description = "Triage board"),
        (name = "health", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_api_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/register",
            "/api/v1/login",
            "/api/v1/logout",
            "/api/v1/me",
            "/api/v1/assistant/step",
            "/api/v1/requests",
            "/api/v1/requests/{id}",
            "/api/v1/requests/{id}/status",
            "/api/v1/requests/{id}/notes",
            "/api/v1/staff/requests",
            "/health/ready",
            "/health/live",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing OpenAPI path: {path}"
            );
        }
    }

    #[test]
    fn security_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
