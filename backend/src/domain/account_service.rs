//! Account registration and login over a [`UserRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use super::auth::{Credentials, PasswordDigest, Registration};
use super::error::Error;
use super::ports::{AccountCommand, AccountQuery, UserRepository, UserRepositoryError};
use super::user::{Role, User, UserId};

/// Message shared by every login failure so responses do not reveal whether
/// the email exists.
const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Implements [`AccountCommand`] and [`AccountQuery`] over a user store.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    /// Build the service over a user store.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    fn store_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::DuplicateEmail => Error::conflict("user already exists"),
            other => {
                warn!(error = %other, "user store failure");
                Error::internal("user store unavailable")
            }
        }
    }
}

#[async_trait]
impl AccountCommand for AccountService {
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        // Lookup-then-insert; the store's own duplicate check backstops the
        // race between the two steps.
        if self
            .users
            .find_by_email(&registration.email)
            .await
            .map_err(Self::store_error)?
            .is_some()
        {
            return Err(Error::conflict("user already exists"));
        }

        let user = User::new(
            UserId::random(),
            registration.email,
            PasswordDigest::derive(&registration.password),
            registration.name,
            Role::Resident,
            registration.apartment,
            Utc::now(),
        );
        self.users
            .insert(user.clone())
            .await
            .map_err(Self::store_error)?;
        Ok(user)
    }

    async fn login(&self, credentials: Credentials) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(&credentials.email)
            .await
            .map_err(Self::store_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_CREDENTIALS))?;
        if !user.password().matches(&credentials.password) {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(user)
    }
}

#[async_trait]
impl AccountQuery for AccountService {
    async fn find(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(Self::store_error)
    }
}
