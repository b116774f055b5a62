//! Maintenance request aggregate and its enumerations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Parse failures for request enumerations.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RequestParseError {
    /// Identifier was not a valid UUID.
    #[error("request id must be a valid UUID")]
    InvalidId,
    /// Unknown priority value.
    #[error("unknown priority: {0}")]
    UnknownPriority(String),
    /// Unknown status value.
    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

/// Stable request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random [`RequestId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form.
    pub fn parse(raw: &str) -> Result<Self, RequestParseError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| RequestParseError::InvalidId)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Problem category a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Leak,
    Elevator,
    Heating,
    Electrical,
    Plumbing,
    Other,
}

impl Category {
    /// Russian display label shown on the staff board.
    pub fn label(self) -> &'static str {
        match self {
            Self::Leak => "Протечка",
            Self::Elevator => "Лифт",
            Self::Heating => "Отопление",
            Self::Electrical => "Электрика",
            Self::Plumbing => "Сантехника",
            Self::Other => "Другое",
        }
    }

    /// Wire name used in JSON payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leak => "leak",
            Self::Elevator => "elevator",
            Self::Heating => "heating",
            Self::Electrical => "electrical",
            Self::Plumbing => "plumbing",
            Self::Other => "other",
        }
    }

    /// Parse a category name, folding anything unknown into [`Self::Other`].
    ///
    /// Submission payloads carry the assistant's classification, but clients
    /// may send arbitrary strings; unknowns degrade rather than fail.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "leak" => Self::Leak,
            "elevator" => Self::Elevator,
            "heating" => Self::Heating,
            "electrical" => Self::Electrical,
            "plumbing" => Self::Plumbing,
            _ => Self::Other,
        }
    }
}

/// Urgency assigned at intake.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Russian display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Низкий",
            Self::Medium => "Средний",
            Self::High => "Высокий",
            Self::Urgent => "Срочно",
        }
    }

    /// Wire name used in JSON payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = RequestParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(RequestParseError::UnknownPriority(other.to_owned())),
        }
    }
}

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    /// Russian display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "Новая",
            Self::InProgress => "В работе",
            Self::Resolved => "Решена",
            Self::Closed => "Закрыта",
        }
    }

    /// Wire name used in JSON payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for Status {
    type Err = RequestParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(RequestParseError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message of the intake dialogue, stored verbatim with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Opaque reference to a stored photo, e.g. `/uploads/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PhotoReference(String);

impl PhotoReference {
    /// Wrap a reference produced by a photo store.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Borrow the reference.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Fields captured at submission time.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub owner: UserId,
    pub category: Category,
    pub priority: Priority,
    pub description: String,
    pub apartment: String,
    pub conversation: Vec<ConversationTurn>,
    pub photos: Vec<PhotoReference>,
}

/// Partial update applied by staff.
///
/// `None` fields are left untouched; `Some` fields overwrite.
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    pub status: Option<Status>,
    pub staff_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A maintenance request as stored and triaged.
///
/// ## Invariants
/// - `updated_at` increases strictly on every applied patch, even when two
///   patches land within clock resolution.
/// - `resolved_at` is set exactly when a status update lands on
///   [`Status::Resolved`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub owner: UserId,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub description: String,
    pub apartment: String,
    pub conversation: Vec<ConversationTurn>,
    pub photos: Vec<PhotoReference>,
    pub staff_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl MaintenanceRequest {
    /// Open a fresh request from a draft. Status starts at [`Status::New`].
    pub fn open(draft: RequestDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::random(),
            owner: draft.owner,
            category: draft.category,
            priority: draft.priority,
            status: Status::New,
            description: draft.description,
            apartment: draft.apartment,
            conversation: draft.conversation,
            photos: draft.photos,
            staff_notes: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Apply a patch, bumping `updated_at` strictly past its previous value.
    pub fn merged(mut self, patch: RequestPatch, now: DateTime<Utc>) -> Self {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.staff_notes {
            self.staff_notes = Some(notes);
        }
        if let Some(resolved_at) = patch.resolved_at {
            self.resolved_at = Some(resolved_at);
        }
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
        self
    }
}
