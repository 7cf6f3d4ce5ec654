//! Recomputes denormalized counters from authoritative rows.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::applications::ApplicationRepository;
use super::error::MarketError;
use super::identity::CompanyRepository;
use super::ids::{CompanyId, JobId};
use super::jobs::JobRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    JobApplicationCount,
    CompanyJobCount,
}

/// One counter that disagreed with the rows it caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterCorrection {
    pub kind: CounterKind,
    pub entity: String,
    pub stored: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub jobs_checked: usize,
    pub companies_checked: usize,
    pub corrections: Vec<CounterCorrection>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

pub struct Reconciler {
    jobs: Arc<dyn JobRepository>,
    companies: Arc<dyn CompanyRepository>,
    applications: Arc<dyn ApplicationRepository>,
}

impl Reconciler {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        companies: Arc<dyn CompanyRepository>,
        applications: Arc<dyn ApplicationRepository>,
    ) -> Self {
        Self {
            jobs,
            companies,
            applications,
        }
    }

    /// Rewrites every `application_count` and `job_count` that drifted from the rows.
    ///
    /// Writes made while the pass runs can be counted on either side; running it again
    /// converges once traffic is quiet.
    pub fn run(&self) -> Result<ReconcileReport, MarketError> {
        let mut report = ReconcileReport::default();

        let mut per_job: HashMap<JobId, u32> = HashMap::new();
        for application in self.applications.matching(&|_| true)? {
            *per_job.entry(application.job).or_default() += 1;
        }

        let jobs = self.jobs.matching(&|_| true)?;
        let mut active_per_company: HashMap<CompanyId, u32> = HashMap::new();
        for job in &jobs {
            if job.is_active {
                *active_per_company.entry(job.company.clone()).or_default() += 1;
            }
            let actual = per_job.get(&job.id).copied().unwrap_or(0);
            if job.application_count != actual {
                warn!(
                    job = %job.id,
                    stored = job.application_count,
                    actual,
                    "application count drift corrected"
                );
                self.jobs.set_application_count(&job.id, actual)?;
                report.corrections.push(CounterCorrection {
                    kind: CounterKind::JobApplicationCount,
                    entity: job.id.to_string(),
                    stored: job.application_count,
                    actual,
                });
            }
        }
        report.jobs_checked = jobs.len();

        let companies = self.companies.list()?;
        for company in &companies {
            let actual = active_per_company.get(&company.id).copied().unwrap_or(0);
            if company.job_count != actual {
                warn!(
                    company = %company.id,
                    stored = company.job_count,
                    actual,
                    "company job count drift corrected"
                );
                self.companies.set_job_count(&company.id, actual)?;
                report.corrections.push(CounterCorrection {
                    kind: CounterKind::CompanyJobCount,
                    entity: company.id.to_string(),
                    stored: company.job_count,
                    actual,
                });
            }
        }
        report.companies_checked = companies.len();

        info!(
            jobs = report.jobs_checked,
            companies = report.companies_checked,
            corrections = report.corrections.len(),
            "counter reconciliation finished"
        );
        Ok(report)
    }
}
