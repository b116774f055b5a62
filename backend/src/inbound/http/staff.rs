//! Staff triage board handler.
//!
//! ```text
//! GET /api/v1/staff/requests?status=new&priority=urgent&category=leak
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::ports::{RequestFilter, RequestStats};
use crate::domain::request::{Category, Priority, Status};
use crate::inbound::http::ApiResult;
use crate::inbound::http::requests::{RequestWithResident, with_resident_name};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Filter query for the staff board. All criteria are optional and combine
/// with AND.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BoardQuery {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}

impl From<BoardQuery> for RequestFilter {
    fn from(query: BoardQuery) -> Self {
        Self {
            status: query.status,
            priority: query.priority,
            category: query.category,
        }
    }
}

/// Staff board payload: filtered listing plus counters over the full set.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub requests: Vec<RequestWithResident>,
    /// Counters ignore the filter so the header stays stable while
    /// narrowing the list.
    pub stats: RequestStats,
}

/// List every request for triage. Staff only.
#[utoipa::path(
    get,
    path = "/api/v1/staff/requests",
    params(BoardQuery),
    responses(
        (status = 200, description = "Triage board", body = BoardResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["staff"],
    operation_id = "staffBoard"
)]
#[get("/staff/requests")]
pub async fn board(
    session: SessionContext,
    state: web::Data<HttpState>,
    query: web::Query<BoardQuery>,
) -> ApiResult<web::Json<BoardResponse>> {
    super::auth::require_staff(&session, state.directory.as_ref()).await?;

    let filter = RequestFilter::from(query.into_inner());
    let requests = state.board.list_all(&filter).await?;
    let stats = state.board.stats().await?;

    let mut enriched = Vec::with_capacity(requests.len());
    for request in &requests {
        enriched.push(with_resident_name(request, state.directory.as_ref()).await?);
    }
    Ok(web::Json(BoardResponse {
        requests: enriched,
        stats,
    }))
}
