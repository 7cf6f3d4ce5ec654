use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::MarketplaceConfig;
use crate::marketplace::authz;
use crate::marketplace::clock::Clock;
use crate::marketplace::error::{MarketError, RepositoryError};
use crate::marketplace::identity::{Actor, CompanyRepository, Role, UserRepository};
use crate::marketplace::ids::{ApplicationId, JobId};
use crate::marketplace::jobs::{Job, JobRepository};
use crate::marketplace::page::{Page, PageRequest};
use crate::marketplace::validation::ValidationErrors;

use super::domain::{
    ApplicantSummary, Application, ApplicationSort, ApplicationStatus, ApplyRequest,
    EmployerApplicationView, StatusUpdate, StudentApplicationView, COVER_LETTER_MAX, NOTES_MAX,
};
use super::repository::{ApplicationRepository, Removal};

const INTERVIEW_LOCATION_MAX: usize = 200;

/// Narrowing applied to an employer's received applications.
#[derive(Debug, Clone, Default)]
pub struct ReceivedFilter {
    pub job: Option<JobId>,
    pub status: Option<ApplicationStatus>,
    pub sort: ApplicationSort,
}

/// Applying, reviewing and withdrawing, plus the `application_count` upkeep that goes with it.
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserRepository>,
    companies: Arc<dyn CompanyRepository>,
    clock: Arc<dyn Clock>,
    config: MarketplaceConfig,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserRepository>,
        companies: Arc<dyn CompanyRepository>,
        clock: Arc<dyn Clock>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            applications,
            jobs,
            users,
            companies,
            clock,
            config,
        }
    }

    /// Submit a student's application. The store's unique index decides duplicates, so two
    /// racing submissions for the same job produce exactly one application.
    pub fn apply(&self, actor: &Actor, request: ApplyRequest) -> Result<Application, MarketError> {
        if !authz::has_role(actor, Role::Student) {
            return Err(MarketError::Forbidden("only students can apply"));
        }
        let mut errors = ValidationErrors::new();
        errors.optional_text(
            "cover_letter",
            Some(request.cover_letter.as_str()),
            COVER_LETTER_MAX,
        );
        errors.into_result()?;

        let now = self.clock.now();
        let job = self
            .jobs
            .fetch(&request.job)?
            .ok_or(MarketError::NotFound("job"))?;
        if job.is_expired(now) {
            return Err(MarketError::DeadlinePassed);
        }
        if !job.is_active {
            return Err(MarketError::NotFound("job"));
        }

        // The count is raised before the row exists and lowered only after a row is gone, so
        // it never trails the rows and a racing withdrawal cannot be lost to the zero floor.
        let reserved = match self.jobs.adjust_application_count(&job.id, 1) {
            Ok(_) => true,
            Err(RepositoryError::NotFound) => return Err(MarketError::NotFound("job")),
            Err(err) => {
                warn!(
                    job = %job.id,
                    error = %err,
                    "application count drifted; reconciliation required"
                );
                false
            }
        };

        let application = Application::new(
            job.id.clone(),
            actor.id.clone(),
            request.cover_letter.trim().to_string(),
            now,
        );
        let application = match self.applications.insert(application) {
            Ok(application) => application,
            Err(err) => {
                if reserved {
                    self.release_reservation(&job.id);
                }
                return Err(match err {
                    RepositoryError::Conflict => {
                        MarketError::Conflict("already applied to this job")
                    }
                    other => other.into(),
                });
            }
        };

        info!(
            application = %application.id,
            job = %job.id,
            applicant = %actor.id,
            "application submitted"
        );
        Ok(application)
    }

    fn release_reservation(&self, job: &JobId) {
        if let Err(err) = self.jobs.adjust_application_count(job, -1) {
            warn!(
                job = %job,
                error = %err,
                "application count drifted; reconciliation required"
            );
        }
    }

    /// The caller's applications, newest first. Orphans of deleted jobs carry no job summary.
    pub fn list_for_student(
        &self,
        actor: &Actor,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<Page<StudentApplicationView>, MarketError> {
        if !authz::has_role(actor, Role::Student) {
            return Err(MarketError::Forbidden("only students have applications"));
        }
        let mut applications = self.applications.matching(&|application| {
            application.applicant == actor.id && status.map_or(true, |s| application.status == s)
        })?;
        applications.sort_by_key(|application| Reverse(application.applied_at));

        let now = self.clock.now();
        let page = Page::slice(applications, page, &self.config);
        let mut views = Vec::with_capacity(page.items.len());
        for application in page.items {
            let job = self.jobs.fetch(&application.job)?;
            let company = match &job {
                Some(job) => self.companies.fetch(&job.company)?,
                None => None,
            };
            views.push(StudentApplicationView {
                job_summary: job.map(|job| job.summary(now)),
                company_profile: company.map(|company| company.summary()),
                application,
            });
        }

        Ok(Page {
            items: views,
            pagination: page.pagination,
        })
    }

    /// Applications to the caller's jobs, joined with each applicant's profile.
    pub fn list_for_employer(
        &self,
        actor: &Actor,
        filter: &ReceivedFilter,
        page: PageRequest,
    ) -> Result<Page<EmployerApplicationView>, MarketError> {
        if !authz::has_role(actor, Role::Employer) {
            return Err(MarketError::Forbidden("only employers receive applications"));
        }
        let owned: HashMap<JobId, Job> = self
            .jobs
            .by_employer(&actor.id)?
            .into_iter()
            .map(|job| (job.id.clone(), job))
            .collect();
        if let Some(job) = &filter.job {
            if !owned.contains_key(job) {
                return Err(MarketError::NotFound("job"));
            }
        }

        let mut applications = self.applications.matching(&|application| {
            owned.contains_key(&application.job)
                && filter.job.as_ref().map_or(true, |job| &application.job == job)
                && filter.status.map_or(true, |s| application.status == s)
        })?;
        match filter.sort {
            ApplicationSort::Newest => {
                applications.sort_by_key(|application| Reverse(application.applied_at))
            }
            ApplicationSort::Oldest => {
                applications.sort_by_key(|application| application.applied_at)
            }
            ApplicationSort::Status => applications
                .sort_by_key(|application| (application.status, Reverse(application.applied_at))),
        }

        let now = self.clock.now();
        let page = Page::slice(applications, page, &self.config);
        let mut views = Vec::with_capacity(page.items.len());
        for application in page.items {
            let Some(job) = owned.get(&application.job) else {
                continue;
            };
            let applicant = self.users.fetch(&application.applicant)?;
            views.push(EmployerApplicationView {
                job_summary: job.summary(now),
                applicant_profile: applicant.as_ref().map(ApplicantSummary::from),
                application,
            });
        }

        Ok(Page {
            items: views,
            pagination: page.pagination,
        })
    }

    /// Employer decision on an application to one of their jobs.
    pub fn update_status(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        update: StatusUpdate,
    ) -> Result<Application, MarketError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or(MarketError::NotFound("application"))?;
        let job = self
            .jobs
            .fetch(&application.job)?
            .ok_or(MarketError::NotFound("job"))?;
        if !authz::can_mutate_application_status(actor, &application, &job) {
            return Err(MarketError::Forbidden(
                "only the employer who posted the job can review its applications",
            ));
        }

        let mut errors = ValidationErrors::new();
        errors.optional_text("notes", update.notes.as_deref(), NOTES_MAX);
        errors.optional_text(
            "interview_location",
            update.interview_location.as_deref(),
            INTERVIEW_LOCATION_MAX,
        );
        errors.into_result()?;

        let now = self.clock.now();
        let updated = self
            .applications
            .modify(id, &mut |stored| stored.record_review(&update, &actor.id, now))
            .map_err(|err| match err {
                RepositoryError::NotFound => MarketError::NotFound("application"),
                other => other.into(),
            })?;

        info!(
            application = %id,
            job = %job.id,
            from = application.status.label(),
            to = updated.status.label(),
            "application status changed"
        );
        Ok(updated)
    }

    /// Withdraw the caller's application unless it is shortlisted or accepted. The lock check
    /// and the delete run as one store operation.
    pub fn withdraw(&self, actor: &Actor, id: &ApplicationId) -> Result<(), MarketError> {
        let removal = self
            .applications
            .remove_if(id, &|application| authz::can_withdraw(actor, application))?;

        let application = match removal {
            Removal::Removed(application) => application,
            Removal::Missing => return Err(MarketError::NotFound("application")),
            Removal::Retained(application) => {
                if !authz::is_owner(&actor.id, &application.applicant) {
                    return Err(MarketError::NotFound("application"));
                }
                return Err(MarketError::InvalidState(
                    "shortlisted or accepted applications cannot be withdrawn",
                ));
            }
        };

        match self.jobs.adjust_application_count(&application.job, -1) {
            Ok(count) => info!(
                application = %application.id,
                job = %application.job,
                application_count = count,
                "application withdrawn"
            ),
            Err(RepositoryError::NotFound) => debug!(
                application = %application.id,
                job = %application.job,
                "withdrew an application whose job was deleted"
            ),
            Err(err) => warn!(
                application = %application.id,
                job = %application.job,
                error = %err,
                "application count drifted; reconciliation required"
            ),
        }
        Ok(())
    }
}
