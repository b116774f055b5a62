//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix session so handlers only deal with domain-friendly
//! operations: persisting a user id at login, reading it back, and purging
//! at logout. The payload carries its own expiry alongside the cookie TTL so
//! a stale payload reads as no session.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const EXPIRES_AT_KEY: &str = "expires_at";

/// How long a login stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user's id with a fresh expiry.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.persist_user_until(user_id, Utc::now() + Duration::days(SESSION_TTL_DAYS))
    }

    pub(crate) fn persist_user_until(
        &self,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .and_then(|()| self.0.insert(EXPIRES_AT_KEY, expires_at.to_rfc3339()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current user id, treating missing, malformed, or expired
    /// payloads as no session.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let read = |key: &str| {
            self.0
                .get::<String>(key)
                .map_err(|error| Error::internal(format!("failed to read session: {error}")))
        };
        let Some(raw_id) = read(USER_ID_KEY)? else {
            return Ok(None);
        };
        let Some(raw_expiry) = read(EXPIRES_AT_KEY)? else {
            return Ok(None);
        };
        let expires_at = match DateTime::parse_from_rfc3339(&raw_expiry) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(error) => {
                warn!("invalid expiry in session cookie: {error}");
                return Ok(None);
            }
        };
        if expires_at <= Utc::now() {
            return Ok(None);
        }
        match UserId::parse(&raw_id) {
            Ok(id) => Ok(Some(id)),
            Err(error) => {
                warn!("invalid user id in session cookie: {error}");
                Ok(None)
            }
        }
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop the session entirely.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
