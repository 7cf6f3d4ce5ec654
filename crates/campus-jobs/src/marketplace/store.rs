//! Mutex-guarded in-memory tables. Every uniqueness rule and counter adjustment runs under the
//! lock of the table it touches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::applications::{Application, ApplicationRepository, Removal};
use super::error::RepositoryError;
use super::identity::{
    BlobError, BlobStore, BlobUpload, Company, CompanyRepository, Session, SessionRepository,
    User, UserRepository,
};
use super::ids::{ApplicationId, CompanyId, JobId, UserId};
use super::jobs::{Job, JobChange, JobRepository};
use super::Repositories;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
}

fn apply_delta(current: u32, delta: i64) -> u32 {
    (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

#[derive(Default)]
struct UserTable {
    rows: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

#[derive(Default, Clone)]
pub struct MemoryUsers {
    table: Arc<Mutex<UserTable>>,
}

impl UserRepository for MemoryUsers {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut table = lock(&self.table)?;
        if table.rows.contains_key(&user.id) || table.by_email.contains_key(&user.email) {
            return Err(RepositoryError::Conflict);
        }
        table.by_email.insert(user.email.clone(), user.id.clone());
        table.rows.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.table)?.rows.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let table = lock(&self.table)?;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    fn modify(
        &self,
        id: &UserId,
        edit: &mut dyn FnMut(&mut User),
    ) -> Result<User, RepositoryError> {
        let mut table = lock(&self.table)?;
        let user = table.rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let (id, email) = (user.id.clone(), user.email.clone());
        edit(user);
        // Identity columns are not editable through `modify`.
        user.id = id;
        user.email = email;
        Ok(user.clone())
    }

    fn attach_company(
        &self,
        id: &UserId,
        company: &CompanyId,
        replacing: Option<&CompanyId>,
    ) -> Result<CompanyId, RepositoryError> {
        let mut table = lock(&self.table)?;
        let user = table.rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if user.company.is_none() || user.company.as_ref() == replacing {
            user.company = Some(company.clone());
        }
        Ok(user.company.clone().unwrap_or_else(|| company.clone()))
    }

    fn forget_saved_job(&self, job: &JobId) -> Result<usize, RepositoryError> {
        let mut table = lock(&self.table)?;
        Ok(table
            .rows
            .values_mut()
            .map(|user| user.saved_jobs.remove(job))
            .filter(|removed| *removed)
            .count())
    }
}

#[derive(Default, Clone)]
pub struct MemorySessions {
    rows: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionRepository for MemorySessions {
    fn insert(&self, session: Session) -> Result<(), RepositoryError> {
        let mut rows = lock(&self.rows)?;
        if rows.contains_key(&session.token_hash) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(session.token_hash.clone(), session);
        Ok(())
    }

    fn fetch(&self, token_hash: &str) -> Result<Option<Session>, RepositoryError> {
        Ok(lock(&self.rows)?.get(token_hash).cloned())
    }

    fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        Ok(lock(&self.rows)?.remove(token_hash).is_some())
    }

    fn revoke_for_user(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let before = rows.len();
        rows.retain(|_, session| &session.user != user);
        Ok(before - rows.len())
    }
}

#[derive(Default, Clone)]
pub struct MemoryCompanies {
    rows: Arc<Mutex<HashMap<CompanyId, Company>>>,
}

impl CompanyRepository for MemoryCompanies {
    fn insert(&self, company: Company) -> Result<Company, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let owner_taken = company.owner.as_ref().is_some_and(|owner| {
            rows.values()
                .any(|existing| existing.owner.as_ref() == Some(owner))
        });
        if rows.contains_key(&company.id) || owner_taken {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(company.id.clone(), company.clone());
        Ok(company)
    }

    fn provision_for_owner(&self, company: Company) -> Result<Company, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        if let Some(owner) = &company.owner {
            if let Some(existing) = rows
                .values()
                .find(|existing| existing.owner.as_ref() == Some(owner))
            {
                return Ok(existing.clone());
            }
        }
        rows.insert(company.id.clone(), company.clone());
        Ok(company)
    }

    fn fetch(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(lock(&self.rows)?.get(id).cloned())
    }

    fn modify(
        &self,
        id: &CompanyId,
        edit: &mut dyn FnMut(&mut Company),
    ) -> Result<Company, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let company = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let (id, job_count, owner) = (
            company.id.clone(),
            company.job_count,
            company.owner.clone(),
        );
        edit(company);
        company.id = id;
        company.job_count = job_count;
        company.owner = owner;
        Ok(company.clone())
    }

    fn adjust_job_count(&self, id: &CompanyId, delta: i64) -> Result<u32, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let company = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        company.job_count = apply_delta(company.job_count, delta);
        Ok(company.job_count)
    }

    fn set_job_count(&self, id: &CompanyId, count: u32) -> Result<(), RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let company = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        company.job_count = count;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(lock(&self.rows)?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryJobs {
    rows: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl JobRepository for MemoryJobs {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        if rows.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(lock(&self.rows)?.get(id).cloned())
    }

    fn modify(
        &self,
        id: &JobId,
        edit: &mut dyn FnMut(&mut Job),
    ) -> Result<JobChange, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let job = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let before = job.clone();
        edit(job);
        job.id = before.id.clone();
        job.employer = before.employer.clone();
        job.company = before.company.clone();
        job.views = before.views;
        job.application_count = before.application_count;
        job.created_at = before.created_at;
        Ok(JobChange {
            after: job.clone(),
            before,
        })
    }

    fn remove(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(lock(&self.rows)?.remove(id))
    }

    fn matching(&self, filter: &dyn Fn(&Job) -> bool) -> Result<Vec<Job>, RepositoryError> {
        Ok(lock(&self.rows)?
            .values()
            .filter(|job| filter(job))
            .cloned()
            .collect())
    }

    fn increment_views(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        Ok(rows.get_mut(id).map(|job| {
            job.views = job.views.saturating_add(1);
            job.clone()
        }))
    }

    fn adjust_application_count(&self, id: &JobId, delta: i64) -> Result<u32, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let job = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.application_count = apply_delta(job.application_count, delta);
        Ok(job.application_count)
    }

    fn set_application_count(&self, id: &JobId, count: u32) -> Result<(), RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let job = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.application_count = count;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryApplications {
    rows: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let duplicate = rows.values().any(|existing| {
            existing.job == application.job && existing.applicant == application.applicant
        });
        if duplicate || rows.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(lock(&self.rows)?.get(id).cloned())
    }

    fn modify(
        &self,
        id: &ApplicationId,
        edit: &mut dyn FnMut(&mut Application),
    ) -> Result<Application, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let application = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let before = application.clone();
        edit(application);
        application.id = before.id;
        application.job = before.job;
        application.applicant = before.applicant;
        application.applied_at = before.applied_at;
        Ok(application.clone())
    }

    fn remove_if(
        &self,
        id: &ApplicationId,
        guard: &dyn Fn(&Application) -> bool,
    ) -> Result<Removal, RepositoryError> {
        let mut rows = lock(&self.rows)?;
        let Some(application) = rows.get(id) else {
            return Ok(Removal::Missing);
        };
        if !guard(application) {
            return Ok(Removal::Retained(application.clone()));
        }
        Ok(rows
            .remove(id)
            .map(Removal::Removed)
            .unwrap_or(Removal::Missing))
    }

    fn matching(
        &self,
        filter: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock(&self.rows)?
            .values()
            .filter(|application| filter(application))
            .cloned()
            .collect())
    }
}

/// Keeps uploads in memory and hands out `memory://` references.
#[derive(Default, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, BlobUpload>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryBlobStore {
    pub fn get(&self, reference: &str) -> Option<BlobUpload> {
        self.blobs.lock().ok()?.get(reference).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, upload: BlobUpload) -> Result<String, BlobError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let reference = format!("memory://uploads/{id:06}/{}", upload.file_name);
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Transport("blob lock poisoned".to_string()))?;
        blobs.insert(reference.clone(), upload);
        Ok(reference)
    }
}

/// Every table of the marketplace, sharing nothing but the process.
#[derive(Default, Clone)]
pub struct MemoryStore {
    pub users: MemoryUsers,
    pub sessions: MemorySessions,
    pub companies: MemoryCompanies,
    pub jobs: MemoryJobs,
    pub applications: MemoryApplications,
    pub blobs: MemoryBlobStore,
}

impl MemoryStore {
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.users.clone()),
            sessions: Arc::new(self.sessions.clone()),
            companies: Arc::new(self.companies.clone()),
            jobs: Arc::new(self.jobs.clone()),
            applications: Arc::new(self.applications.clone()),
        }
    }
}
