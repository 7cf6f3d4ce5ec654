use crate::marketplace::error::RepositoryError;
use crate::marketplace::ids::{ApplicationId, JobId};

use super::domain::Application;

/// Outcome of a guarded delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(Application),
    /// The guard refused; the stored row is returned untouched.
    Retained(Application),
    Missing,
}

/// Application table. `insert` enforces the (job, applicant) unique index.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn modify(
        &self,
        id: &ApplicationId,
        edit: &mut dyn FnMut(&mut Application),
    ) -> Result<Application, RepositoryError>;
    /// Deletes the row only if `guard` accepts it, checked under the same lock as the delete.
    fn remove_if(
        &self,
        id: &ApplicationId,
        guard: &dyn Fn(&Application) -> bool,
    ) -> Result<Removal, RepositoryError>;
    fn matching(
        &self,
        filter: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn count_for_job(&self, job: &JobId) -> Result<u32, RepositoryError> {
        Ok(self.matching(&|application| &application.job == job)?.len() as u32)
    }
}
