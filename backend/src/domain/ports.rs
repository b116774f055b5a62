//! Ports connecting the domain to its adapters.
//!
//! Driven ports (`UserRepository`, `RequestRepository`, `PhotoStore`) are
//! implemented by outbound adapters; driving ports (`AccountCommand` and
//! friends) are implemented by the domain services and consumed by the HTTP
//! adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

use super::error::Error;
use super::request::{
    Category, ConversationTurn, MaintenanceRequest, PhotoReference, Priority, RequestId, Status,
};
use super::user::{Apartment, Email, User, UserId};
use super::auth::{Credentials, Registration};

/// Failures surfaced by user stores.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UserRepositoryError {
    /// The backing store is unreachable.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// A read or write failed.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// Insert collided with an existing email.
    #[error("email already registered")]
    DuplicateEmail,
}

impl UserRepositoryError {
    /// Build a [`UserRepositoryError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`UserRepositoryError::Query`].
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Failures surfaced by request stores.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RequestRepositoryError {
    /// The backing store is unreachable.
    #[error("request store connection failed: {message}")]
    Connection { message: String },
    /// A read or write failed.
    #[error("request store query failed: {message}")]
    Query { message: String },
}

impl RequestRepositoryError {
    /// Build a [`RequestRepositoryError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`RequestRepositoryError::Query`].
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Failures surfaced by photo stores.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PhotoStoreError {
    /// The upload violates a validation rule (size, type, count).
    #[error("photo rejected: {message}")]
    Rejected { message: String },
    /// Writing the photo failed.
    #[error("photo store io failure: {message}")]
    Io { message: String },
}

impl PhotoStoreError {
    /// Build a [`PhotoStoreError::Rejected`].
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Build a [`PhotoStoreError::Io`].
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

/// Stores and retrieves user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Fails with [`UserRepositoryError::DuplicateEmail`]
    /// if the email is taken.
    async fn insert(&self, user: User) -> Result<(), UserRepositoryError>;

    /// Fetch a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by normalized email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError>;

    /// Replace a stored account with an updated copy. Fails with
    /// [`UserRepositoryError::Query`] when the id is unknown and with
    /// [`UserRepositoryError::DuplicateEmail`] when the new email belongs
    /// to another account.
    async fn update(&self, user: User) -> Result<(), UserRepositoryError>;
}

/// Stores and retrieves maintenance requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Persist a new request.
    async fn insert(&self, request: MaintenanceRequest) -> Result<(), RequestRepositoryError>;

    /// Fetch a request by id.
    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<MaintenanceRequest>, RequestRepositoryError>;

    /// List a resident's own requests, newest first.
    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<MaintenanceRequest>, RequestRepositoryError>;

    /// List every request, newest first.
    async fn list_all(&self) -> Result<Vec<MaintenanceRequest>, RequestRepositoryError>;

    /// Replace a stored request with an updated copy.
    async fn update(&self, request: MaintenanceRequest) -> Result<(), RequestRepositoryError>;

    /// Remove a request, reporting whether a stored row existed.
    async fn delete(&self, id: &RequestId) -> Result<bool, RequestRepositoryError>;
}

/// An uploaded photo awaiting storage.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Declared content type, e.g. `image/png`.
    pub content_type: Option<String>,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Persists photos and yields serveable references.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store one photo, returning its public reference.
    async fn save(&self, upload: PhotoUpload) -> Result<PhotoReference, PhotoStoreError>;
}

/// Optional narrowing applied to the staff board listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}

impl RequestFilter {
    /// Whether a request passes every present criterion.
    pub fn matches(&self, request: &MaintenanceRequest) -> bool {
        self.status.is_none_or(|status| request.status == status)
            && self
                .priority
                .is_none_or(|priority| request.priority == priority)
            && self
                .category
                .is_none_or(|category| request.category == category)
    }
}

/// Aggregate counters for the staff board header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub urgent: usize,
}

impl RequestStats {
    /// Count over an unfiltered request set.
    pub fn tally<'a>(requests: impl IntoIterator<Item = &'a MaintenanceRequest>) -> Self {
        let mut stats = Self::default();
        for request in requests {
            stats.total += 1;
            match request.status {
                Status::New => stats.new += 1,
                Status::InProgress => stats.in_progress += 1,
                Status::Resolved => stats.resolved += 1,
                Status::Closed => {}
            }
            if request.priority == Priority::Urgent {
                stats.urgent += 1;
            }
        }
        stats
    }
}

/// Everything needed to open a request on behalf of a resident.
#[derive(Debug)]
pub struct RequestSubmission {
    pub submitter: User,
    pub category: Category,
    pub priority: Priority,
    pub description: String,
    /// Apartment from the form; falls back to the profile, then `"N/A"`.
    pub apartment: Option<Apartment>,
    pub conversation: Vec<ConversationTurn>,
    pub photos: Vec<PhotoUpload>,
}

/// Account mutations driven by the HTTP adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register a new resident account.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Verify credentials and return the matching account.
    async fn login(&self, credentials: Credentials) -> Result<User, Error>;
}

/// Account lookups driven by the HTTP adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Fetch an account by id.
    async fn find(&self, id: &UserId) -> Result<Option<User>, Error>;
}

/// Request mutations driven by the HTTP adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestCommand: Send + Sync {
    /// Store photos and open a request.
    async fn submit(&self, submission: RequestSubmission) -> Result<MaintenanceRequest, Error>;

    /// Change a request's status, stamping `resolved_at` when appropriate.
    async fn update_status(
        &self,
        id: &RequestId,
        status: Status,
    ) -> Result<MaintenanceRequest, Error>;

    /// Overwrite the staff notes on a request.
    async fn update_notes(&self, id: &RequestId, notes: String)
    -> Result<MaintenanceRequest, Error>;
}

/// Request lookups driven by the HTTP adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestQuery: Send + Sync {
    /// Fetch one request, failing with not-found if absent.
    async fn fetch(&self, id: &RequestId) -> Result<MaintenanceRequest, Error>;

    /// List the requests owned by one resident, newest first.
    async fn list_for(&self, owner: &UserId) -> Result<Vec<MaintenanceRequest>, Error>;

    /// List every request passing the filter, newest first.
    async fn list_all(&self, filter: &RequestFilter) -> Result<Vec<MaintenanceRequest>, Error>;

    /// Aggregate counters over the full request set.
    async fn stats(&self) -> Result<RequestStats, Error>;
}
