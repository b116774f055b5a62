//! User aggregate and its validated components.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::PasswordDigest;

/// Validation failures raised when constructing user components.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UserValidationError {
    /// Identifier was not a valid UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email did not match the accepted shape.
    #[error("email address is not valid")]
    InvalidEmail,
    /// Name was missing or blank once trimmed.
    #[error("name must not be empty")]
    EmptyName,
    /// Apartment was missing or blank once trimmed.
    #[error("apartment must not be empty")]
    EmptyApartment,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role attached to every account.
///
/// Stringly-typed role comparisons in the original are replaced by a closed
/// enum so role gates are exhaustive and reviewable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A building resident who files requests.
    Resident,
    /// Maintenance staff permitted to triage all requests.
    Staff,
}

impl Role {
    /// Whether this role grants access to staff-only operations.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Staff)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliberately loose: one @, non-empty local part, dotted domain.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address, stored trimmed and lowercased.
///
/// ## Invariants
/// - Non-empty after trimming.
/// - Matches `local@domain.tld` loosely; full RFC validation is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    ///
    /// # Examples
    /// ```
    /// use domovoy_backend::domain::Email;
    ///
    /// let email = Email::new("  Resident@Demo.com ").expect("valid email");
    /// assert_eq!(email.as_str(), "resident@demo.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&normalized) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalized address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Display name of the account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Validate and construct a [`FullName`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = raw.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

impl TryFrom<String> for FullName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Apartment label as entered by the resident, e.g. `"42"`.
///
/// No plausibility check beyond non-emptiness; the assistant only ever
/// extracts digit runs but profiles may carry arbitrary labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Apartment(String);

impl Apartment {
    /// Validate and construct an [`Apartment`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let label = raw.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyApartment);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the label.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Apartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Apartment> for String {
    fn from(value: Apartment) -> Self {
        value.0
    }
}

impl TryFrom<String> for Apartment {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Application user.
///
/// ## Invariants
/// - `email` is unique across the user store at creation-check time.
/// - The password digest never leaves the domain via serialization; wire
///   payloads are built from getters by the HTTP adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    email: Email,
    password: PasswordDigest,
    name: FullName,
    role: Role,
    apartment: Option<Apartment>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from validated components.
    pub fn new(
        id: UserId,
        email: Email,
        password: PasswordDigest,
        name: FullName,
        role: Role,
        apartment: Option<Apartment>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password,
            name,
            role,
            apartment,
            created_at,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Stored password digest.
    pub fn password(&self) -> &PasswordDigest {
        &self.password
    }

    /// Display name.
    pub fn name(&self) -> &FullName {
        &self.name
    }

    /// Account role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Apartment label, if known.
    pub fn apartment(&self) -> Option<&Apartment> {
        self.apartment.as_ref()
    }

    /// Creation instant.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
