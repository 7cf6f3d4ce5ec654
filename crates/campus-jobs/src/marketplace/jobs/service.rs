use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::MarketplaceConfig;
use crate::marketplace::applications::ApplicationRepository;
use crate::marketplace::authz;
use crate::marketplace::clock::Clock;
use crate::marketplace::error::{MarketError, RepositoryError};
use crate::marketplace::identity::{
    Actor, CompanyRepository, IdentityService, Role, UserRepository,
};
use crate::marketplace::ids::JobId;
use crate::marketplace::page::{Page, PageRequest};
use crate::marketplace::stats::StatusBreakdown;
use crate::marketplace::validation::ValidationErrors;

use super::domain::{
    EmployerJobView, Job, JobContact, JobDraft, JobListing, JobPatch, DEFAULT_EXPERIENCE,
    DEFAULT_WORK_HOURS,
};
use super::query::{EmployerJobStatus, JobFilter, JobSort};
use super::repository::JobRepository;

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 5000;
const LOCATION_MAX: usize = 100;
const SALARY_TEXT_MAX: usize = 50;
const LIST_ITEM_MAX: usize = 500;
const LIST_MAX_ITEMS: usize = 20;
const VACANCIES_MAX: u32 = 1000;

/// Postings: creation with company provisioning, edits, deletion, public search.
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    companies: Arc<dyn CompanyRepository>,
    users: Arc<dyn UserRepository>,
    applications: Arc<dyn ApplicationRepository>,
    identity: Arc<IdentityService>,
    clock: Arc<dyn Clock>,
    config: MarketplaceConfig,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        companies: Arc<dyn CompanyRepository>,
        users: Arc<dyn UserRepository>,
        applications: Arc<dyn ApplicationRepository>,
        identity: Arc<IdentityService>,
        clock: Arc<dyn Clock>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            jobs,
            companies,
            users,
            applications,
            identity,
            clock,
            config,
        }
    }

    /// Publish a posting, provisioning the employer's company on first use.
    pub fn create_job(&self, actor: &Actor, draft: JobDraft) -> Result<JobListing, MarketError> {
        if !authz::has_role(actor, Role::Employer) {
            return Err(MarketError::Forbidden("only employers can post jobs"));
        }
        let now = self.clock.now();
        validate_draft(&draft, now)?;

        let employer = self.identity.user(&actor.id)?;
        let company = self
            .identity
            .ensure_company(&employer, draft.company_name.as_deref())?;

        let job = Job {
            id: JobId::generate(),
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            requirements: draft.requirements.clone(),
            responsibilities: draft.responsibilities.clone(),
            tags: draft.tags.clone(),
            salary: draft.compensation(),
            location: draft.location.trim().to_string(),
            job_type: draft.job_type.unwrap_or_default(),
            category: draft.category.unwrap_or_default(),
            work_hours: draft
                .work_hours
                .clone()
                .unwrap_or_else(|| DEFAULT_WORK_HOURS.to_string()),
            experience: draft
                .experience
                .clone()
                .unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string()),
            education: draft.education.unwrap_or_default(),
            vacancies: draft.vacancies.unwrap_or(1),
            employer: employer.id.clone(),
            company: company.id.clone(),
            contact: JobContact {
                name: draft.contact_name.clone().unwrap_or_else(|| employer.name.clone()),
                email: draft
                    .contact_email
                    .as_deref()
                    .map(|email| email.trim().to_ascii_lowercase())
                    .unwrap_or_else(|| employer.email.clone()),
                phone: draft.contact_phone.clone().or_else(|| employer.phone.clone()),
            },
            deadline: draft.deadline,
            is_active: true,
            is_featured: draft.is_featured.unwrap_or(false),
            views: 0,
            application_count: 0,
            created_at: now,
            updated_at: now,
        };

        let job = self.jobs.insert(job)?;
        self.adjust_company_jobs(&job, 1);
        info!(job = %job.id, company = %job.company, employer = %job.employer, "job posted");

        self.listing(job, now)
    }

    pub fn update_job(
        &self,
        actor: &Actor,
        id: &JobId,
        patch: JobPatch,
    ) -> Result<JobListing, MarketError> {
        let job = self.owned_job(actor, id)?;
        let now = self.clock.now();

        let mut preview = job.clone();
        patch.apply(&mut preview, now);
        let mut errors = job_errors(&preview);
        if let Some(Some(deadline)) = patch.deadline {
            if deadline <= now {
                errors.push("deadline", "must be in the future");
            }
        }
        errors.into_result()?;

        let change = self
            .jobs
            .modify(id, &mut |stored| patch.apply(stored, now))
            .map_err(job_not_found)?;

        match (change.before.is_active, change.after.is_active) {
            (true, false) => self.adjust_company_jobs(&change.after, -1),
            (false, true) => self.adjust_company_jobs(&change.after, 1),
            _ => {}
        }
        info!(job = %id, "job updated");

        self.listing(change.after, now)
    }

    /// Delete a posting. Its applications are kept; they become orphans.
    pub fn delete_job(&self, actor: &Actor, id: &JobId) -> Result<(), MarketError> {
        self.owned_job(actor, id)?;

        let removed = self
            .jobs
            .remove(id)?
            .ok_or(MarketError::NotFound("job"))?;
        if removed.is_active {
            self.adjust_company_jobs(&removed, -1);
        }
        if let Err(err) = self.users.forget_saved_job(id) {
            warn!(job = %id, error = %err, "failed to drop deleted job from saved lists");
        }
        info!(job = %id, company = %removed.company, "job deleted");
        Ok(())
    }

    /// Public detail read; every successful read counts as a view.
    pub fn get_job(&self, id: &JobId) -> Result<JobListing, MarketError> {
        let job = self
            .jobs
            .increment_views(id)?
            .ok_or(MarketError::NotFound("job"))?;
        self.listing(job, self.clock.now())
    }

    pub fn list_jobs(
        &self,
        filter: &JobFilter,
        sort: JobSort,
        page: PageRequest,
    ) -> Result<Page<JobListing>, MarketError> {
        let mut jobs = self
            .jobs
            .matching(&|job| job.is_active && filter.matches(job))?;
        sort.apply(&mut jobs);

        let now = self.clock.now();
        let page = Page::slice(jobs, page, &self.config);
        let items = self.listings(page.items, now)?;
        Ok(Page {
            items,
            pagination: page.pagination,
        })
    }

    /// The caller's own postings, each with a fresh application breakdown by status.
    pub fn list_employer_jobs(
        &self,
        actor: &Actor,
        status: EmployerJobStatus,
        page: PageRequest,
    ) -> Result<Page<EmployerJobView>, MarketError> {
        if !authz::has_role(actor, Role::Employer) {
            return Err(MarketError::Forbidden("only employers have postings"));
        }
        let now = self.clock.now();
        let mut jobs = self.jobs.by_employer(&actor.id)?;
        jobs.retain(|job| status.matches(job, now));
        JobSort::Newest.apply(&mut jobs);

        let page = Page::slice(jobs, page, &self.config);
        let on_page: Vec<JobId> = page.items.iter().map(|job| job.id.clone()).collect();
        let applications = self
            .applications
            .matching(&|application| on_page.contains(&application.job))?;

        let mut breakdowns: HashMap<JobId, StatusBreakdown> = HashMap::new();
        for application in &applications {
            breakdowns
                .entry(application.job.clone())
                .or_default()
                .record(application.status);
        }

        Ok(page.map(|job| EmployerJobView {
            is_expired: job.is_expired(now),
            applications: breakdowns.get(&job.id).copied().unwrap_or_default(),
            job,
        }))
    }

    pub fn list_featured(&self, limit: Option<usize>) -> Result<Vec<JobListing>, MarketError> {
        let limit = limit
            .unwrap_or(self.config.featured_limit)
            .clamp(1, self.config.max_page_size as usize);
        let mut jobs = self.jobs.matching(&|job| job.is_active && job.is_featured)?;
        JobSort::Newest.apply(&mut jobs);
        jobs.truncate(limit);
        self.listings(jobs, self.clock.now())
    }

    /// The caller's saved postings, most recently saved first. Deleted jobs are skipped.
    pub fn saved_jobs(&self, actor: &Actor) -> Result<Vec<JobListing>, MarketError> {
        let user = self.identity.user(&actor.id)?;
        let mut jobs = Vec::with_capacity(user.saved_jobs.len());
        for id in user.saved_jobs.newest_first() {
            if let Some(job) = self.jobs.fetch(id)? {
                jobs.push(job);
            }
        }
        self.listings(jobs, self.clock.now())
    }

    fn owned_job(&self, actor: &Actor, id: &JobId) -> Result<Job, MarketError> {
        let job = self.jobs.fetch(id)?.ok_or(MarketError::NotFound("job"))?;
        if !authz::can_mutate_job(actor, &job) {
            return Err(MarketError::Forbidden("only the posting employer can change this job"));
        }
        Ok(job)
    }

    /// Counter maintenance runs after the primary write; a failure is logged as drift for the
    /// reconciler rather than undoing the write.
    fn adjust_company_jobs(&self, job: &Job, delta: i64) {
        match self.companies.adjust_job_count(&job.company, delta) {
            Ok(count) => {
                info!(company = %job.company, job_count = count, "company job count adjusted")
            }
            Err(err) => warn!(
                company = %job.company,
                job = %job.id,
                delta,
                error = %err,
                "company job count drifted; reconciliation required"
            ),
        }
    }

    fn listing(&self, job: Job, now: DateTime<Utc>) -> Result<JobListing, MarketError> {
        let company = self.companies.fetch(&job.company)?;
        let employer = self.users.fetch(&job.employer)?;
        Ok(JobListing {
            is_expired: job.is_expired(now),
            company_profile: company.map(|company| company.summary()),
            employer_profile: employer.map(|employer| employer.employer_summary()),
            job,
        })
    }

    fn listings(&self, jobs: Vec<Job>, now: DateTime<Utc>) -> Result<Vec<JobListing>, MarketError> {
        jobs.into_iter().map(|job| self.listing(job, now)).collect()
    }
}

fn job_not_found(err: RepositoryError) -> MarketError {
    match err {
        RepositoryError::NotFound => MarketError::NotFound("job"),
        other => other.into(),
    }
}

fn validate_draft(draft: &JobDraft, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require_text("title", &draft.title, TITLE_MAX);
    errors.require_text("description", &draft.description, DESCRIPTION_MAX);
    errors.require_text("location", &draft.location, LOCATION_MAX);
    errors.optional_text("salary", draft.salary.as_deref(), SALARY_TEXT_MAX);
    errors.optional_text("company_name", draft.company_name.as_deref(), 100);
    list_errors(&mut errors, "requirements", &draft.requirements);
    list_errors(&mut errors, "responsibilities", &draft.responsibilities);
    list_errors(&mut errors, "tags", &draft.tags);
    if let (Some(min), Some(max)) = (draft.salary_min, draft.salary_max) {
        if min > max {
            errors.push("salary_min", "must not exceed salary_max");
        }
    }
    if let Some(vacancies) = draft.vacancies {
        if !(1..=VACANCIES_MAX).contains(&vacancies) {
            errors.push("vacancies", format!("must be between 1 and {VACANCIES_MAX}"));
        }
    }
    if let Some(email) = &draft.contact_email {
        errors.email("contact_email", email);
    }
    errors.phone("contact_phone", draft.contact_phone.as_deref());
    if let Some(deadline) = draft.deadline {
        if deadline <= now {
            errors.push("deadline", "must be in the future");
        }
    }
    errors.into_result()
}

/// Structural checks on a fully populated job, run again after every patch.
fn job_errors(job: &Job) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.require_text("title", &job.title, TITLE_MAX);
    errors.require_text("description", &job.description, DESCRIPTION_MAX);
    errors.require_text("location", &job.location, LOCATION_MAX);
    errors.require_text("salary", &job.salary.text, SALARY_TEXT_MAX);
    list_errors(&mut errors, "requirements", &job.requirements);
    list_errors(&mut errors, "responsibilities", &job.responsibilities);
    list_errors(&mut errors, "tags", &job.tags);
    if let (Some(min), Some(max)) = (job.salary.min, job.salary.max) {
        if min > max {
            errors.push("salary_min", "must not exceed salary_max");
        }
    }
    if !(1..=VACANCIES_MAX).contains(&job.vacancies) {
        errors.push("vacancies", format!("must be between 1 and {VACANCIES_MAX}"));
    }
    errors.email("contact_email", &job.contact.email);
    errors.phone("contact_phone", job.contact.phone.as_deref());
    errors
}

fn list_errors(errors: &mut ValidationErrors, field: &'static str, items: &[String]) {
    if items.len() > LIST_MAX_ITEMS {
        errors.push(field, format!("at most {LIST_MAX_ITEMS} entries"));
    }
    if items.iter().any(|item| item.chars().count() > LIST_ITEM_MAX) {
        errors.push(field, format!("entries must be at most {LIST_ITEM_MAX} characters"));
    }
}
