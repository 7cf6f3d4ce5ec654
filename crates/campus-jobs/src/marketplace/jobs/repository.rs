use crate::marketplace::error::RepositoryError;
use crate::marketplace::ids::{JobId, UserId};

use super::domain::Job;

/// Stored job before and after an edit.
#[derive(Debug, Clone)]
pub struct JobChange {
    pub before: Job,
    pub after: Job,
}

/// Job table. Counter columns only move through the `increment_*`/`adjust_*`/`set_*` calls;
/// `modify` restores them after the edit runs.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn modify(
        &self,
        id: &JobId,
        edit: &mut dyn FnMut(&mut Job),
    ) -> Result<JobChange, RepositoryError>;
    /// Removes the job, handing it back to exactly one caller.
    fn remove(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn matching(&self, filter: &dyn Fn(&Job) -> bool) -> Result<Vec<Job>, RepositoryError>;
    fn by_employer(&self, employer: &UserId) -> Result<Vec<Job>, RepositoryError> {
        self.matching(&|job| &job.employer == employer)
    }
    /// Bumps the view counter and returns the job as read.
    fn increment_views(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    /// Atomically adds `delta` to `application_count`, flooring at zero. Returns the new value.
    fn adjust_application_count(&self, id: &JobId, delta: i64) -> Result<u32, RepositoryError>;
    fn set_application_count(&self, id: &JobId, count: u32) -> Result<(), RepositoryError>;
}
