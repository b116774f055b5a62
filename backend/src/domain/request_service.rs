//! Request intake and triage over the request and photo stores.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use super::error::Error;
use super::ports::{
    PhotoStore, PhotoStoreError, RequestCommand, RequestFilter, RequestQuery, RequestRepository,
    RequestRepositoryError, RequestStats, RequestSubmission,
};
use super::request::{MaintenanceRequest, RequestDraft, RequestId, RequestPatch, Status};
use super::user::UserId;

/// Implements [`RequestCommand`] and [`RequestQuery`].
pub struct RequestService {
    requests: Arc<dyn RequestRepository>,
    photos: Arc<dyn PhotoStore>,
}

impl RequestService {
    /// Build the service over a request store and a photo store.
    pub fn new(requests: Arc<dyn RequestRepository>, photos: Arc<dyn PhotoStore>) -> Self {
        Self { requests, photos }
    }

    fn store_error(error: RequestRepositoryError) -> Error {
        warn!(error = %error, "request store failure");
        Error::internal("request store unavailable")
    }

    fn photo_error(error: PhotoStoreError) -> Error {
        match error {
            PhotoStoreError::Rejected { message } => Error::invalid_request(message),
            PhotoStoreError::Io { message } => {
                warn!(error = %message, "photo store failure");
                Error::internal("photo store unavailable")
            }
        }
    }

    async fn load(&self, id: &RequestId) -> Result<MaintenanceRequest, Error> {
        self.requests
            .find_by_id(id)
            .await
            .map_err(Self::store_error)?
            .ok_or_else(|| Error::not_found("request not found"))
    }

    async fn apply(
        &self,
        id: &RequestId,
        patch: RequestPatch,
    ) -> Result<MaintenanceRequest, Error> {
        let current = self.load(id).await?;
        let updated = current.merged(patch, Utc::now());
        self.requests
            .update(updated.clone())
            .await
            .map_err(Self::store_error)?;
        Ok(updated)
    }
}

#[async_trait]
impl RequestCommand for RequestService {
    async fn submit(&self, submission: RequestSubmission) -> Result<MaintenanceRequest, Error> {
        // Store photos before opening the request so a rejected upload never
        // leaves a half-filed request behind.
        let mut references = Vec::with_capacity(submission.photos.len());
        for upload in submission.photos {
            let reference = self.photos.save(upload).await.map_err(Self::photo_error)?;
            references.push(reference);
        }

        let apartment = submission
            .apartment
            .map(|apartment| apartment.as_str().to_owned())
            .or_else(|| {
                submission
                    .submitter
                    .apartment()
                    .map(|apartment| apartment.as_str().to_owned())
            })
            .unwrap_or_else(|| "N/A".to_owned());

        let draft = RequestDraft {
            owner: *submission.submitter.id(),
            category: submission.category,
            priority: submission.priority,
            description: submission.description,
            apartment,
            conversation: submission.conversation,
            photos: references,
        };
        let request = MaintenanceRequest::open(draft, Utc::now());
        self.requests
            .insert(request.clone())
            .await
            .map_err(Self::store_error)?;
        info!(
            request = %request.id,
            category = request.category.as_str(),
            priority = request.priority.as_str(),
            "request opened"
        );
        Ok(request)
    }

    async fn update_status(
        &self,
        id: &RequestId,
        status: Status,
    ) -> Result<MaintenanceRequest, Error> {
        let patch = RequestPatch {
            status: Some(status),
            resolved_at: (status == Status::Resolved).then(Utc::now),
            ..RequestPatch::default()
        };
        self.apply(id, patch).await
    }

    async fn update_notes(
        &self,
        id: &RequestId,
        notes: String,
    ) -> Result<MaintenanceRequest, Error> {
        let patch = RequestPatch {
            staff_notes: Some(notes),
            ..RequestPatch::default()
        };
        self.apply(id, patch).await
    }
}

#[async_trait]
impl RequestQuery for RequestService {
    async fn fetch(&self, id: &RequestId) -> Result<MaintenanceRequest, Error> {
        self.load(id).await
    }

    async fn list_for(&self, owner: &UserId) -> Result<Vec<MaintenanceRequest>, Error> {
        self.requests
            .list_by_owner(owner)
            .await
            .map_err(Self::store_error)
    }

    async fn list_all(&self, filter: &RequestFilter) -> Result<Vec<MaintenanceRequest>, Error> {
        let all = self.requests.list_all().await.map_err(Self::store_error)?;
        Ok(all
            .into_iter()
            .filter(|request| filter.matches(request))
            .collect())
    }

    async fn stats(&self) -> Result<RequestStats, Error> {
        let all = self.requests.list_all().await.map_err(Self::store_error)?;
        Ok(RequestStats::tally(&all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockPhotoStore, MockRequestRepository, PhotoUpload};
    use crate::domain::request::{Category, PhotoReference, Priority};
    use crate::domain::user::{Apartment, Email, FullName, Role, User};
    use crate::domain::auth::{Password, PasswordDigest};
    use rstest::rstest;

    fn resident(apartment: Option<&str>) -> User {
        let password = Password::new("password123").expect("valid");
        User::new(
            UserId::random(),
            Email::new("resident@demo.com").expect("valid"),
            PasswordDigest::derive(&password),
            FullName::new("Мария Петрова").expect("valid"),
            Role::Resident,
            apartment.map(|a| Apartment::new(a).expect("valid")),
            Utc::now(),
        )
    }

    fn submission(submitter: User, apartment: Option<&str>) -> RequestSubmission {
        RequestSubmission {
            submitter,
            category: Category::Leak,
            priority: Priority::High,
            description: "Течет с потолка".into(),
            apartment: apartment.map(|a| Apartment::new(a).expect("valid")),
            conversation: Vec::new(),
            photos: Vec::new(),
        }
    }

    fn upload() -> PhotoUpload {
        PhotoUpload {
            file_name: Some("leak.png".into()),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        }
    }

    #[rstest]
    #[case::from_form(Some("7"), Some("42"), "7")]
    #[case::from_profile(None, Some("42"), "42")]
    #[case::unknown(None, None, "N/A")]
    #[actix_rt::test]
    async fn submit_resolves_apartment_with_fallback(
        #[case] form: Option<&str>,
        #[case] profile: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut requests = MockRequestRepository::new();
        let expected_owned = expected.to_owned();
        requests.expect_insert().returning(move |request| {
            assert_eq!(request.apartment, expected_owned);
            Ok(())
        });
        let photos = MockPhotoStore::new();
        let service = RequestService::new(Arc::new(requests), Arc::new(photos));

        let request = service
            .submit(submission(resident(profile), form))
            .await
            .expect("submitted");
        assert_eq!(request.apartment, expected);
        assert_eq!(request.status, Status::New);
    }

    #[rstest]
    #[actix_rt::test]
    async fn submit_aborts_before_insert_when_a_photo_is_rejected() {
        let mut requests = MockRequestRepository::new();
        requests.expect_insert().never();
        let mut photos = MockPhotoStore::new();
        photos
            .expect_save()
            .returning(|_| Err(PhotoStoreError::rejected("file too large")));
        let service = RequestService::new(Arc::new(requests), Arc::new(photos));

        let mut submission = submission(resident(None), None);
        submission.photos.push(upload());
        let err = service.submit(submission).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "file too large");
    }

    #[rstest]
    #[actix_rt::test]
    async fn submit_attaches_saved_photo_references() {
        let mut requests = MockRequestRepository::new();
        requests.expect_insert().returning(|request| {
            assert_eq!(request.photos.len(), 2);
            assert!(request.photos[0].as_str().starts_with("/uploads/"));
            Ok(())
        });
        let mut photos = MockPhotoStore::new();
        let mut counter = 0;
        photos.expect_save().returning(move |_| {
            counter += 1;
            Ok(PhotoReference::new(format!("/uploads/photo-{counter}.png")))
        });
        let service = RequestService::new(Arc::new(requests), Arc::new(photos));

        let mut submission = submission(resident(None), None);
        submission.photos.push(upload());
        submission.photos.push(upload());
        let request = service.submit(submission).await.expect("submitted");
        assert_eq!(request.photos.len(), 2);
    }

    #[rstest]
    #[actix_rt::test]
    async fn update_status_to_resolved_stamps_resolved_at() {
        let stored = MaintenanceRequest::open(
            RequestDraft {
                owner: UserId::random(),
                category: Category::Leak,
                priority: Priority::High,
                description: "x".into(),
                apartment: "1".into(),
                conversation: Vec::new(),
                photos: Vec::new(),
            },
            Utc::now(),
        );
        let id = stored.id;
        let mut requests = MockRequestRepository::new();
        let find_copy = stored.clone();
        requests
            .expect_find_by_id()
            .returning(move |_| Ok(Some(find_copy.clone())));
        requests.expect_update().returning(|request| {
            assert_eq!(request.status, Status::Resolved);
            assert!(request.resolved_at.is_some());
            Ok(())
        });
        let service = RequestService::new(Arc::new(requests), Arc::new(MockPhotoStore::new()));

        let updated = service
            .update_status(&id, Status::Resolved)
            .await
            .expect("updated");
        assert!(updated.resolved_at.is_some());
        assert!(updated.updated_at > stored.updated_at);
    }

    #[rstest]
    #[actix_rt::test]
    async fn update_status_off_resolved_leaves_resolved_at_alone() {
        let stored = MaintenanceRequest::open(
            RequestDraft {
                owner: UserId::random(),
                category: Category::Other,
                priority: Priority::Low,
                description: "x".into(),
                apartment: "1".into(),
                conversation: Vec::new(),
                photos: Vec::new(),
            },
            Utc::now(),
        );
        let id = stored.id;
        let mut requests = MockRequestRepository::new();
        requests
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        requests.expect_update().returning(|request| {
            assert!(request.resolved_at.is_none());
            Ok(())
        });
        let service = RequestService::new(Arc::new(requests), Arc::new(MockPhotoStore::new()));

        let updated = service
            .update_status(&id, Status::InProgress)
            .await
            .expect("updated");
        assert_eq!(updated.status, Status::InProgress);
        assert!(updated.resolved_at.is_none());
    }

    #[rstest]
    #[actix_rt::test]
    async fn fetch_missing_request_is_not_found() {
        let mut requests = MockRequestRepository::new();
        requests.expect_find_by_id().returning(|_| Ok(None));
        let service = RequestService::new(Arc::new(requests), Arc::new(MockPhotoStore::new()));

        let err = service
            .fetch(&RequestId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[actix_rt::test]
    async fn list_all_applies_filter_in_service() {
        let make = |status: Status| {
            MaintenanceRequest::open(
                RequestDraft {
                    owner: UserId::random(),
                    category: Category::Other,
                    priority: Priority::Low,
                    description: "x".into(),
                    apartment: "1".into(),
                    conversation: Vec::new(),
                    photos: Vec::new(),
                },
                Utc::now(),
            )
            .merged(
                RequestPatch {
                    status: Some(status),
                    ..RequestPatch::default()
                },
                Utc::now(),
            )
        };
        let stored = vec![make(Status::New), make(Status::Resolved)];
        let mut requests = MockRequestRepository::new();
        requests
            .expect_list_all()
            .returning(move || Ok(stored.clone()));
        let service = RequestService::new(Arc::new(requests), Arc::new(MockPhotoStore::new()));

        let filter = RequestFilter {
            status: Some(Status::Resolved),
            ..RequestFilter::default()
        };
        let listed = service.list_all(&filter).await.expect("listed");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, Status::Resolved);
    }
}
