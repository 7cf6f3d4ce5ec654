use crate::marketplace::error::RepositoryError;
use crate::marketplace::ids::{CompanyId, JobId, UserId};

use super::domain::{BlobUpload, Company, Session, User};

/// User table. Email uniqueness is enforced by `insert`.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Applies `edit` to the stored row under the table lock and returns the updated row.
    fn modify(
        &self,
        id: &UserId,
        edit: &mut dyn FnMut(&mut User),
    ) -> Result<User, RepositoryError>;
    /// Compare-and-set on the employer's company reference: sets `company` when none is
    /// attached yet, or when the attached one is `replacing`, and returns whichever company
    /// ends up attached.
    fn attach_company(
        &self,
        id: &UserId,
        company: &CompanyId,
        replacing: Option<&CompanyId>,
    ) -> Result<CompanyId, RepositoryError>;
    /// Drops `job` from every saved list and returns how many users held it.
    fn forget_saved_job(&self, job: &JobId) -> Result<usize, RepositoryError>;
}

pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: Session) -> Result<(), RepositoryError>;
    fn fetch(&self, token_hash: &str) -> Result<Option<Session>, RepositoryError>;
    fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError>;
    fn revoke_for_user(&self, user: &UserId) -> Result<usize, RepositoryError>;
}

/// Company table with its denormalized job counter.
pub trait CompanyRepository: Send + Sync {
    fn insert(&self, company: Company) -> Result<Company, RepositoryError>;
    /// Idempotent upsert keyed by `company.owner`: returns the owner's existing company if one
    /// was already provisioned, otherwise stores and returns `company`.
    fn provision_for_owner(&self, company: Company) -> Result<Company, RepositoryError>;
    fn fetch(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn modify(
        &self,
        id: &CompanyId,
        edit: &mut dyn FnMut(&mut Company),
    ) -> Result<Company, RepositoryError>;
    /// Atomically adds `delta` to `job_count`, flooring at zero. Returns the new value.
    fn adjust_job_count(&self, id: &CompanyId, delta: i64) -> Result<u32, RepositoryError>;
    fn set_job_count(&self, id: &CompanyId, count: u32) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<Company>, RepositoryError>;
}

/// Opaque file storage for resumes and avatars.
pub trait BlobStore: Send + Sync {
    fn store(&self, upload: BlobUpload) -> Result<String, BlobError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob storage unavailable: {0}")]
    Transport(String),
}
