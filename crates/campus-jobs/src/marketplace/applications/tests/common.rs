use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;

use crate::config::MarketplaceConfig;
use crate::marketplace::applications::{
    Application, ApplicationRepository, ApplyRequest, Removal,
};
use crate::marketplace::error::{MarketError, RepositoryError};
use crate::marketplace::fixtures::{start, Harness};
use crate::marketplace::identity::Actor;
use crate::marketplace::ids::{ApplicationId, JobId};
use crate::marketplace::jobs::{JobListing, JobRepository};
use crate::marketplace::store::MemoryStore;
use crate::marketplace::{ManualClock, Marketplace, Repositories};

/// A harness with one employer, one posting and one student ready to apply.
pub(super) struct Board {
    pub(super) harness: Harness,
    pub(super) employer: Actor,
    pub(super) student: Actor,
    pub(super) listing: JobListing,
}

impl Board {
    pub(super) fn job_id(&self) -> JobId {
        self.listing.job.id.clone()
    }

    pub(super) fn apply_as(&self, student: &Actor) -> Result<Application, MarketError> {
        self.harness.marketplace.applications.apply(
            student,
            ApplyRequest {
                job: self.job_id(),
                cover_letter: "I would love to join.".to_string(),
            },
        )
    }

    pub(super) fn application_count(&self) -> u32 {
        self.harness
            .store
            .jobs
            .fetch(&self.job_id())
            .expect("store available")
            .expect("job present")
            .application_count
    }
}

pub(super) fn board() -> Board {
    let harness = Harness::new();
    let employer = harness.employer("hr@acme.test");
    let student = harness.student("kim@uni.test");
    let listing = harness.post_job(&employer, "Data Analyst");
    Board {
        harness,
        employer,
        student,
        listing,
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify(
        &self,
        _id: &ApplicationId,
        _edit: &mut dyn FnMut(&mut Application),
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove_if(
        &self,
        _id: &ApplicationId,
        _guard: &dyn Fn(&Application) -> bool,
    ) -> Result<Removal, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn matching(
        &self,
        _filter: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Applications table whose rows are withdrawn the moment they are stored, the way a
/// client guessing the next id could race the submitting request.
pub(super) struct WithdrawnOnInsert {
    pub(super) store: MemoryStore,
}

impl ApplicationRepository for WithdrawnOnInsert {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let stored = self.store.applications.insert(application)?;
        let removal = self.store.applications.remove_if(&stored.id, &|_| true)?;
        if let Removal::Removed(removed) = removal {
            self.store.jobs.adjust_application_count(&removed.job, -1)?;
        }
        Ok(stored)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.store.applications.fetch(id)
    }

    fn modify(
        &self,
        id: &ApplicationId,
        edit: &mut dyn FnMut(&mut Application),
    ) -> Result<Application, RepositoryError> {
        self.store.applications.modify(id, edit)
    }

    fn remove_if(
        &self,
        id: &ApplicationId,
        guard: &dyn Fn(&Application) -> bool,
    ) -> Result<Removal, RepositoryError> {
        self.store.applications.remove_if(id, guard)
    }

    fn matching(
        &self,
        filter: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.store.applications.matching(filter)
    }
}

pub(super) fn racing_withdrawals() -> (Marketplace, MemoryStore) {
    let store = MemoryStore::default();
    let repositories = Repositories {
        applications: Arc::new(WithdrawnOnInsert {
            store: store.clone(),
        }),
        ..store.repositories()
    };
    let marketplace = Marketplace::new(
        repositories,
        Arc::new(store.blobs.clone()),
        Arc::new(ManualClock::new(start())),
        MarketplaceConfig::default(),
    );
    (marketplace, store)
}

/// Marketplace whose application table is offline while every other table works.
pub(super) fn offline_applications() -> (Arc<Marketplace>, MemoryStore) {
    let store = MemoryStore::default();
    let repositories = Repositories {
        applications: Arc::new(UnavailableApplications),
        ..store.repositories()
    };
    let marketplace = Marketplace::new(
        repositories,
        Arc::new(store.blobs.clone()),
        Arc::new(ManualClock::new(start())),
        MarketplaceConfig::default(),
    );
    (Arc::new(marketplace), store)
}

pub(super) fn json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializes")))
        .expect("request builds")
}

pub(super) fn authorized_get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
