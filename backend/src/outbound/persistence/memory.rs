//! In-memory repositories backing the default deployment.
//!
//! Both stores keep their rows in a `Mutex<HashMap>`; a poisoned lock is
//! reported as a query failure rather than panicking the worker.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::auth::{Password, PasswordDigest};
use crate::domain::ports::{
    RequestRepository, RequestRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::request::{MaintenanceRequest, RequestId};
use crate::domain::user::{Apartment, Email, FullName, Role, User, UserId};

/// User store over a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the two demo accounts
    /// (`resident@demo.com` and `staff@demo.com`, password `password123`).
    pub fn seeded_with_demo_accounts() -> Self {
        let store = Self::new();
        let password = Password::new("password123")
            .unwrap_or_else(|error| panic!("demo password rejected: {error}"));
        let digest = PasswordDigest::derive(&password);
        let demo = |email: &str, name: &str, role: Role, apartment: Option<&str>| {
            User::new(
                UserId::random(),
                Email::new(email).unwrap_or_else(|error| panic!("demo email rejected: {error}")),
                digest.clone(),
                FullName::new(name).unwrap_or_else(|error| panic!("demo name rejected: {error}")),
                role,
                apartment.map(|a| {
                    Apartment::new(a)
                        .unwrap_or_else(|error| panic!("demo apartment rejected: {error}"))
                }),
                Utc::now(),
            )
        };
        {
            let mut users = store
                .users
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for user in [
                demo(
                    "resident@demo.com",
                    "Мария Петрова",
                    Role::Resident,
                    Some("42"),
                ),
                demo("staff@demo.com", "Иван Сидоров", Role::Staff, None),
            ] {
                users.insert(*user.id().as_uuid(), user);
            }
        }
        store
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, User>>, UserRepositoryError> {
        self.users
            .lock()
            .map_err(|_| UserRepositoryError::query("user store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<(), UserRepositoryError> {
        let mut users = self.locked()?;
        if users
            .values()
            .any(|existing| existing.email() == user.email())
        {
            return Err(UserRepositoryError::DuplicateEmail);
        }
        users.insert(*user.id().as_uuid(), user);
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.locked()?.get(id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .locked()?
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn update(&self, user: User) -> Result<(), UserRepositoryError> {
        let mut users = self.locked()?;
        if !users.contains_key(user.id().as_uuid()) {
            return Err(UserRepositoryError::query("user not found"));
        }
        if users
            .values()
            .any(|existing| existing.id() != user.id() && existing.email() == user.email())
        {
            return Err(UserRepositoryError::DuplicateEmail);
        }
        users.insert(*user.id().as_uuid(), user);
        Ok(())
    }
}

/// Request store over a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryRequestRepository {
    requests: Mutex<HashMap<Uuid, MaintenanceRequest>>,
}

impl InMemoryRequestRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, MaintenanceRequest>>, RequestRepositoryError>
    {
        self.requests
            .lock()
            .map_err(|_| RequestRepositoryError::query("request store lock poisoned"))
    }

    fn newest_first(mut requests: Vec<MaintenanceRequest>) -> Vec<MaintenanceRequest> {
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn insert(&self, request: MaintenanceRequest) -> Result<(), RequestRepositoryError> {
        self.locked()?.insert(*request.id.as_uuid(), request);
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<MaintenanceRequest>, RequestRepositoryError> {
        Ok(self.locked()?.get(id.as_uuid()).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<MaintenanceRequest>, RequestRepositoryError> {
        let owned = self
            .locked()?
            .values()
            .filter(|request| request.owner == *owner)
            .cloned()
            .collect();
        Ok(Self::newest_first(owned))
    }

    async fn list_all(&self) -> Result<Vec<MaintenanceRequest>, RequestRepositoryError> {
        let all = self.locked()?.values().cloned().collect();
        Ok(Self::newest_first(all))
    }

    async fn update(&self, request: MaintenanceRequest) -> Result<(), RequestRepositoryError> {
        self.locked()?.insert(*request.id.as_uuid(), request);
        Ok(())
    }

    async fn delete(&self, id: &RequestId) -> Result<bool, RequestRepositoryError> {
        Ok(self.locked()?.remove(id.as_uuid()).is_some())
    }
}
