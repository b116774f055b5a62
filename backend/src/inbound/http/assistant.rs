//! Intake assistant API handler.
//!
//! ```text
//! POST /api/v1/assistant/step {"message":"Течет с потолка"}
//! ```
//!
//! The dialogue state travels with the client: the response carries the next
//! state, and the client echoes it back with the following message.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::assistant::{self, DialogueState, RequestSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/assistant/step`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    /// State from the previous response; omit to start a dialogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DialogueState>,
    /// The resident's message.
    pub message: String,
}

/// One assistant turn.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    /// Canned assistant reply.
    pub reply: String,
    /// State to echo back with the next message.
    pub state: DialogueState,
    /// Submission prefill, present once the script completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RequestSummary>,
}

/// Advance the scripted intake dialogue by one message.
#[utoipa::path(
    post,
    path = "/api/v1/assistant/step",
    request_body = StepRequest,
    responses(
        (status = 200, description = "Next assistant turn", body = StepResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["assistant"],
    operation_id = "assistantStep"
)]
#[post("/assistant/step")]
pub async fn step(
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: web::Json<StepRequest>,
) -> ApiResult<web::Json<StepResponse>> {
    super::auth::require_user(&session, state.directory.as_ref()).await?;
    let payload = payload.into_inner();
    if payload.message.trim().is_empty() {
        return Err(Error::invalid_request("message must not be empty").into());
    }

    let outcome = assistant::advance(payload.state.unwrap_or_default(), &payload.message);
    Ok(web::Json(StepResponse {
        reply: outcome.reply.to_owned(),
        state: outcome.state,
        summary: outcome.summary,
    }))
}
