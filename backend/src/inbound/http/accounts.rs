//! Account API handlers.
//!
//! ```text
//! POST /api/v1/register {"email":"a@b.com","password":"secret1",...}
//! POST /api/v1/login    {"email":"a@b.com","password":"secret1"}
//! POST /api/v1/logout
//! GET  /api/v1/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::auth::{CredentialError, Credentials, Password, Registration};
use crate::domain::user::UserValidationError;
use crate::domain::{Apartment, Email, Error, FullName, Role, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration request body for `POST /api/v1/register`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account, returned on register, login, and `/me`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().as_str().to_owned(),
            name: user.name().as_str().to_owned(),
            role: user.role(),
            apartment: user.apartment().map(|a| a.as_str().to_owned()),
        }
    }
}

fn map_user_validation(field: &str, err: UserValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

fn map_credential_error(err: CredentialError) -> Error {
    let field = match err {
        CredentialError::PasswordTooShort => "password",
        CredentialError::ConfirmationMismatch => "confirmPassword",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Create a resident account and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ProfileResponse,
         headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = Email::new(&payload.email).map_err(|err| map_user_validation("email", err))?;
    let name = FullName::new(payload.name).map_err(|err| map_user_validation("name", err))?;
    let apartment = payload
        .apartment
        .map(Apartment::new)
        .transpose()
        .map_err(|err| map_user_validation("apartment", err))?;
    let password = Password::new(payload.password).map_err(map_credential_error)?;
    let registration =
        Registration::new(email, password, &payload.confirm_password, name, apartment)
            .map_err(map_credential_error)?;

    let user = state.accounts.register(registration).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Created().json(ProfileResponse::from(&user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = ProfileResponse,
         headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    // Malformed emails earn the same uniform rejection as wrong passwords.
    let email =
        Email::new(&payload.email).map_err(|_| Error::unauthorized("invalid email or password"))?;
    let password = Password::new(payload.password)
        .map_err(|_| Error::unauthorized("invalid email or password"))?;

    let user = state
        .accounts
        .login(Credentials { email, password })
        .await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&user)))
}

/// Drop the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 500, description = "Internal server error")
    ),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Return the authenticated account's profile.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["accounts"],
    operation_id = "me"
)]
#[get("/me")]
pub async fn me(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user = super::auth::require_user(&session, state.directory.as_ref()).await?;
    Ok(web::Json(ProfileResponse::from(&user)))
}
