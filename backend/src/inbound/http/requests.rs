//! Maintenance request API handlers.
//!
//! ```text
//! POST /api/v1/requests              multipart form + photos
//! GET  /api/v1/requests              own requests, newest first
//! GET  /api/v1/requests/{id}         detail with resident name
//! PUT  /api/v1/requests/{id}/status  staff only
//! PUT  /api/v1/requests/{id}/notes   staff only
//! ```

use actix_multipart::form::MultipartForm;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{AccountQuery, PhotoUpload};
use crate::domain::request::{
    Category, ConversationTurn, MaintenanceRequest, Priority, RequestId, Status,
};
use crate::domain::{Apartment, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Maximum photos per request.
pub const MAX_PHOTOS: usize = 5;
/// Maximum size of a single photo in bytes.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_PHOTO_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Multipart submission form for `POST /api/v1/requests`.
#[derive(MultipartForm)]
pub struct SubmitForm {
    pub category: Text<String>,
    pub description: Text<String>,
    pub priority: Text<String>,
    /// JSON array of conversation turns, if the assistant was used.
    pub conversation: Option<Text<String>>,
    pub apartment: Option<Text<String>>,
    pub photos: Vec<TempFile>,
}

/// Body for `PUT /api/v1/requests/{id}/status`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct StatusUpdate {
    pub status: Status,
}

/// Body for `PUT /api/v1/requests/{id}/notes`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct NotesUpdate {
    pub notes: String,
}

/// Wire view of a maintenance request.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: String,
    pub owner_id: String,
    pub category: Category,
    pub category_label: String,
    pub priority: Priority,
    pub priority_label: String,
    pub status: Status,
    pub status_label: String,
    pub description: String,
    pub apartment: String,
    pub conversation: Vec<ConversationTurn>,
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&MaintenanceRequest> for RequestResponse {
    fn from(request: &MaintenanceRequest) -> Self {
        Self {
            id: request.id.to_string(),
            owner_id: request.owner.to_string(),
            category: request.category,
            category_label: request.category.label().to_owned(),
            priority: request.priority,
            priority_label: request.priority.label().to_owned(),
            status: request.status,
            status_label: request.status.label().to_owned(),
            description: request.description.clone(),
            apartment: request.apartment.clone(),
            conversation: request.conversation.clone(),
            photos: request
                .photos
                .iter()
                .map(|photo| photo.as_str().to_owned())
                .collect(),
            staff_notes: request.staff_notes.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
            resolved_at: request.resolved_at,
        }
    }
}

/// [`RequestResponse`] enriched with the resident's display name.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithResident {
    #[serde(flatten)]
    pub request: RequestResponse,
    pub resident_name: String,
}

pub(super) async fn with_resident_name(
    request: &MaintenanceRequest,
    directory: &dyn AccountQuery,
) -> Result<RequestWithResident, Error> {
    let resident_name = directory
        .find(&request.owner)
        .await?
        .map(|owner| owner.name().as_str().to_owned())
        .unwrap_or_else(|| "Неизвестный житель".to_owned());
    Ok(RequestWithResident {
        request: RequestResponse::from(request),
        resident_name,
    })
}

fn is_allowed_photo_type(content_type: &Mime) -> bool {
    ALLOWED_PHOTO_TYPES.contains(&content_type.essence_str())
}

fn validate_photo(photo: &TempFile) -> Result<(), Error> {
    if photo.size > MAX_PHOTO_BYTES {
        return Err(Error::invalid_request(
            "Файл слишком большой. Максимальный размер: 5 МБ",
        ));
    }
    let accepted = photo.content_type.as_ref().is_some_and(is_allowed_photo_type);
    if !accepted {
        return Err(Error::invalid_request(
            "Недопустимый тип файла. Разрешены: JPEG, PNG, GIF, WebP",
        ));
    }
    Ok(())
}

async fn collect_photos(photos: Vec<TempFile>) -> Result<Vec<PhotoUpload>, Error> {
    if photos.len() > MAX_PHOTOS {
        return Err(Error::invalid_request(
            "Можно приложить не более 5 фотографий",
        ));
    }
    let mut uploads = Vec::with_capacity(photos.len());
    for photo in photos {
        validate_photo(&photo)?;
        let bytes = tokio::fs::read(photo.file.path())
            .await
            .map_err(|error| Error::internal(format!("failed to read upload: {error}")))?;
        uploads.push(PhotoUpload {
            file_name: photo.file_name,
            content_type: photo.content_type.map(|mime| mime.essence_str().to_owned()),
            bytes,
        });
    }
    Ok(uploads)
}

fn parse_conversation(raw: Option<String>) -> Result<Vec<ConversationTurn>, Error> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
            .map_err(|error| Error::invalid_request(format!("malformed conversation: {error}"))),
        _ => Ok(Vec::new()),
    }
}

/// File a maintenance request with optional photos.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    responses(
        (status = 201, description = "Request opened", body = RequestResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["requests"],
    operation_id = "submitRequest"
)]
#[post("/requests")]
pub async fn submit(
    session: SessionContext,
    state: web::Data<HttpState>,
    MultipartForm(form): MultipartForm<SubmitForm>,
) -> ApiResult<HttpResponse> {
    let user = super::auth::require_user(&session, state.directory.as_ref()).await?;

    let description = form.description.into_inner();
    if description.trim().is_empty() {
        return Err(Error::invalid_request("description must not be empty").into());
    }
    let category = Category::parse_lenient(&form.category);
    let priority: Priority = form
        .priority
        .parse()
        .map_err(|_| Error::invalid_request("unknown priority"))?;
    let conversation = parse_conversation(form.conversation.map(Text::into_inner))?;
    let apartment = form
        .apartment
        .map(Text::into_inner)
        .filter(|apartment| !apartment.trim().is_empty())
        .map(Apartment::new)
        .transpose()
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    let photos = collect_photos(form.photos).await?;

    let request = state
        .intake
        .submit(crate::domain::ports::RequestSubmission {
            submitter: user,
            category,
            priority,
            description,
            apartment,
            conversation,
            photos,
        })
        .await?;
    Ok(HttpResponse::Created().json(RequestResponse::from(&request)))
}

/// List the authenticated resident's own requests, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    responses(
        (status = 200, description = "Own requests", body = [RequestResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["requests"],
    operation_id = "listOwnRequests"
)]
#[get("/requests")]
pub async fn list_own(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<RequestResponse>>> {
    let user = super::auth::require_user(&session, state.directory.as_ref()).await?;
    let requests = state.board.list_for(user.id()).await?;
    Ok(web::Json(
        requests.iter().map(RequestResponse::from).collect(),
    ))
}

/// Fetch one request with the resident's name.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request detail", body = RequestWithResident),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["requests"],
    operation_id = "getRequest"
)]
#[get("/requests/{id}")]
pub async fn detail(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestWithResident>> {
    super::auth::require_user(&session, state.directory.as_ref()).await?;
    let id = RequestId::parse(&path).map_err(|_| Error::not_found("request not found"))?;
    let request = state.board.fetch(&id).await?;
    let enriched = with_resident_name(&request, state.directory.as_ref()).await?;
    Ok(web::Json(enriched))
}

/// Change a request's status. Staff only.
#[utoipa::path(
    put,
    path = "/api/v1/requests/{id}/status",
    params(("id" = String, Path, description = "Request identifier")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Updated request", body = RequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["requests"],
    operation_id = "updateRequestStatus"
)]
#[put("/requests/{id}/status")]
pub async fn update_status(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<StatusUpdate>,
) -> ApiResult<web::Json<RequestResponse>> {
    super::auth::require_staff(&session, state.directory.as_ref()).await?;
    let id = RequestId::parse(&path).map_err(|_| Error::not_found("request not found"))?;
    let updated = state.intake.update_status(&id, payload.status).await?;
    Ok(web::Json(RequestResponse::from(&updated)))
}

/// Overwrite a request's staff notes. Staff only.
#[utoipa::path(
    put,
    path = "/api/v1/requests/{id}/notes",
    params(("id" = String, Path, description = "Request identifier")),
    request_body = NotesUpdate,
    responses(
        (status = 200, description = "Updated request", body = RequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["requests"],
    operation_id = "updateRequestNotes"
)]
#[put("/requests/{id}/notes")]
pub async fn update_notes(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<NotesUpdate>,
) -> ApiResult<web::Json<RequestResponse>> {
    super::auth::require_staff(&session, state.directory.as_ref()).await?;
    let id = RequestId::parse(&path).map_err(|_| Error::not_found("request not found"))?;
    let updated = state
        .intake
        .update_notes(&id, payload.into_inner().notes)
        .await?;
    Ok(web::Json(RequestResponse::from(&updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{
        login_as_resident, login_as_staff, multipart_submission, test_app, test_state,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn submission_requires_a_session() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let (content_type, body) = multipart_submission("leak", "Течет", "high", None, &[]);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn submitted_request_starts_new_and_lists_for_owner() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = login_as_resident(&app).await;

        let (content_type, body) = multipart_submission(
            "leak",
            "Течет с потолка",
            "high",
            Some("42"),
            &[("leak.png", "image/png", b"\x89PNG fake")],
        );
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .cookie(cookie.clone())
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: RequestResponse = actix_test::read_body_json(res).await;
        assert_eq!(created.status, Status::New);
        assert_eq!(created.category_label, "Протечка");
        assert_eq!(created.photos.len(), 1);
        assert!(created.photos[0].starts_with("/uploads/"));

        let list_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/requests")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(list_res.status(), StatusCode::OK);
        let listed: Vec<RequestResponse> = actix_test::read_body_json(list_res).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_category_degrades_to_other() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = login_as_resident(&app).await;

        let (content_type, body) = multipart_submission("gremlins", "шум", "low", None, &[]);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .cookie(cookie)
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: RequestResponse = actix_test::read_body_json(res).await;
        assert_eq!(created.category, Category::Other);
        assert_eq!(created.category_label, "Другое");
    }

    #[rstest]
    #[actix_web::test]
    async fn non_image_upload_is_rejected() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = login_as_resident(&app).await;

        let (content_type, body) = multipart_submission(
            "leak",
            "Течет",
            "high",
            None,
            &[("notes.txt", "text/plain", b"not an image")],
        );
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .cookie(cookie)
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let payload: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            payload["message"],
            "Недопустимый тип файла. Разрешены: JPEG, PNG, GIF, WebP"
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn sixth_photo_is_rejected() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = login_as_resident(&app).await;

        let photo: (&str, &str, &[u8]) = ("p.png", "image/png", b"x");
        let photos = [photo; 6];
        let (content_type, body) =
            multipart_submission("leak", "Течет", "high", None, &photos);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .cookie(cookie)
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn resident_cannot_mutate_status() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = login_as_resident(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!(
                    "/api/v1/requests/{}/status",
                    RequestId::random()
                ))
                .cookie(cookie)
                .set_json(json!({ "status": "resolved" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn staff_status_update_stamps_resolution_and_bumps_updated_at() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let resident = login_as_resident(&app).await;

        let (content_type, body) = multipart_submission("leak", "Течет", "high", None, &[]);
        let created_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .cookie(resident)
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        let created: RequestResponse = actix_test::read_body_json(created_res).await;

        let staff = login_as_staff(&app).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/requests/{}/status", created.id))
                .cookie(staff.clone())
                .set_json(json!({ "status": "resolved" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let updated: RequestResponse = actix_test::read_body_json(res).await;
        assert_eq!(updated.status, Status::Resolved);
        assert_eq!(updated.status_label, "Решена");
        assert!(updated.resolved_at.is_some());
        assert!(updated.updated_at > created.updated_at);

        let detail_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/requests/{}", created.id))
                .cookie(staff)
                .to_request(),
        )
        .await;
        assert_eq!(detail_res.status(), StatusCode::OK);
        let detail_body: Value = actix_test::read_body_json(detail_res).await;
        assert_eq!(detail_body["status"], "resolved");
        assert_eq!(detail_body["residentName"], "Мария Петрова");
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_request_is_404() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = login_as_resident(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/requests/{}", RequestId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn notes_update_overwrites_verbatim() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let resident = login_as_resident(&app).await;

        let (content_type, body) = multipart_submission("other", "шум", "low", None, &[]);
        let created_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/requests")
                .cookie(resident)
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request(),
        )
        .await;
        let created: RequestResponse = actix_test::read_body_json(created_res).await;

        let staff = login_as_staff(&app).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/requests/{}/notes", created.id))
                .cookie(staff)
                .set_json(json!({ "notes": "  мастер придет завтра  " }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let updated: RequestResponse = actix_test::read_body_json(res).await;
        assert_eq!(updated.staff_notes.as_deref(), Some("  мастер придет завтра  "));
    }
}
