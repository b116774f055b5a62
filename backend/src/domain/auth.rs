//! Credential types for registration and login.
//!
//! The digest scheme is deliberately lightweight (salted SHA-256) and lives
//! behind [`PasswordDigest`] so a real KDF can replace it without touching
//! callers.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error as ThisError;
use zeroize::Zeroizing;

use super::user::{Apartment, Email, FullName};

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

const DIGEST_SALT: &str = "domovoy.v1";

/// Validation failures for credential material.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CredentialError {
    /// Password shorter than [`MIN_PASSWORD_CHARS`].
    #[error("password must be at least {MIN_PASSWORD_CHARS} characters")]
    PasswordTooShort,
    /// Password and its confirmation differ.
    #[error("passwords do not match")]
    ConfirmationMismatch,
}

/// A plaintext password held only long enough to digest or verify.
///
/// The buffer is zeroed on drop.
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept a password, enforcing the minimum length.
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialError> {
        let raw = Zeroizing::new(raw.into());
        if raw.chars().count() < MIN_PASSWORD_CHARS {
            return Err(CredentialError::PasswordTooShort);
        }
        Ok(Self(raw))
    }

    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Hex-encoded salted SHA-256 digest of a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Digest a plaintext password.
    pub fn derive(password: &Password) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DIGEST_SALT.as_bytes());
        hasher.update(password.as_str().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Check a plaintext candidate against this digest.
    pub fn matches(&self, candidate: &Password) -> bool {
        Self::derive(candidate) == *self
    }
}

/// Login credentials as supplied by the HTTP adapter.
#[derive(Debug)]
pub struct Credentials {
    /// Login email, already normalized.
    pub email: Email,
    /// Plaintext password to verify.
    pub password: Password,
}

/// Validated registration payload.
///
/// Confirmation matching happens before construction; a [`Registration`]
/// always carries a usable password.
#[derive(Debug)]
pub struct Registration {
    pub email: Email,
    pub password: Password,
    pub name: FullName,
    pub apartment: Option<Apartment>,
}

impl Registration {
    /// Build a registration, checking that the confirmation repeats the
    /// password exactly.
    pub fn new(
        email: Email,
        password: Password,
        confirmation: &str,
        name: FullName,
        apartment: Option<Apartment>,
    ) -> Result<Self, CredentialError> {
        if password.as_str() != confirmation {
            return Err(CredentialError::ConfirmationMismatch);
        }
        Ok(Self {
            email,
            password,
            name,
            apartment,
        })
    }
}
