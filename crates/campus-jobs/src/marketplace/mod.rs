//! Campus job marketplace: identity, postings, applications and employer statistics.

pub mod applications;
pub mod authz;
pub mod clock;
pub mod error;
pub mod identity;
pub mod ids;
pub mod jobs;
pub mod page;
pub mod reconcile;
pub mod router;
pub mod stats;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

use std::sync::Arc;

use crate::config::MarketplaceConfig;

pub use applications::{ApplicationRepository, ApplicationService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{MarketError, RepositoryError};
pub use identity::{
    BlobStore, CompanyRepository, IdentityService, SessionRepository, UserRepository,
};
pub use ids::{ApplicationId, CompanyId, JobId, UserId};
pub use jobs::{JobRepository, JobService};
pub use page::{Page, PageRequest, Pagination};
pub use reconcile::{ReconcileReport, Reconciler};
pub use router::marketplace_router;
pub use stats::StatisticsService;
pub use store::MemoryStore;
pub use validation::ValidationErrors;

/// Storage seams, one per aggregate.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
}

/// Every marketplace service wired over one set of repositories.
pub struct Marketplace {
    pub identity: Arc<IdentityService>,
    pub jobs: JobService,
    pub applications: ApplicationService,
    pub statistics: StatisticsService,
    pub reconciler: Reconciler,
    pub config: MarketplaceConfig,
}

impl Marketplace {
    pub fn new(
        repositories: Repositories,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        config: MarketplaceConfig,
    ) -> Self {
        let Repositories {
            users,
            sessions,
            companies,
            jobs,
            applications,
        } = repositories;

        let identity = Arc::new(IdentityService::new(
            users.clone(),
            sessions,
            companies.clone(),
            jobs.clone(),
            blobs,
            clock.clone(),
            config.clone(),
        ));
        let job_service = JobService::new(
            jobs.clone(),
            companies.clone(),
            users.clone(),
            applications.clone(),
            identity.clone(),
            clock.clone(),
            config.clone(),
        );
        let application_service = ApplicationService::new(
            applications.clone(),
            jobs.clone(),
            users,
            companies.clone(),
            clock.clone(),
            config.clone(),
        );
        let statistics = StatisticsService::new(jobs.clone(), applications.clone(), clock);
        let reconciler = Reconciler::new(jobs, companies, applications);

        Self {
            identity,
            jobs: job_service,
            applications: application_service,
            statistics,
            reconciler,
            config,
        }
    }

    /// Marketplace over a fresh in-memory store.
    pub fn in_memory(clock: Arc<dyn Clock>, config: MarketplaceConfig) -> (Self, MemoryStore) {
        let store = MemoryStore::default();
        let marketplace = Self::new(
            store.repositories(),
            Arc::new(store.blobs.clone()),
            clock,
            config,
        );
        (marketplace, store)
    }
}
