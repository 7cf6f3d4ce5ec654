//! Read-only rollups for employer dashboards.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use super::applications::{Application, ApplicationRepository, ApplicationStatus};
use super::clock::Clock;
use super::error::MarketError;
use super::identity::{Actor, Role};
use super::ids::JobId;
use super::jobs::JobRepository;
use super::authz;

/// Width of the "recent" window.
pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub pending: u32,
    pub reviewed: u32,
    pub shortlisted: u32,
    pub rejected: u32,
    pub accepted: u32,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: ApplicationStatus) {
        let slot = match status {
            ApplicationStatus::Pending => &mut self.pending,
            ApplicationStatus::Reviewed => &mut self.reviewed,
            ApplicationStatus::Shortlisted => &mut self.shortlisted,
            ApplicationStatus::Rejected => &mut self.rejected,
            ApplicationStatus::Accepted => &mut self.accepted,
        };
        *slot += 1;
    }

    pub fn get(&self, status: ApplicationStatus) -> u32 {
        match status {
            ApplicationStatus::Pending => self.pending,
            ApplicationStatus::Reviewed => self.reviewed,
            ApplicationStatus::Shortlisted => self.shortlisted,
            ApplicationStatus::Rejected => self.rejected,
            ApplicationStatus::Accepted => self.accepted,
        }
    }

    pub fn total(&self) -> u32 {
        ApplicationStatus::ALL
            .into_iter()
            .map(|status| self.get(status))
            .sum()
    }

    pub fn tally<'a>(applications: impl IntoIterator<Item = &'a Application>) -> Self {
        let mut breakdown = Self::default();
        for application in applications {
            breakdown.record(application.status);
        }
        breakdown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStatistics {
    pub total: u32,
    pub recent: u32,
    pub by_status: StatusBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatistics {
    pub total: u32,
    pub active: u32,
    pub inactive: u32,
    pub expired: u32,
    pub views: u64,
    pub applications: u32,
}

pub struct StatisticsService {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    clock: Arc<dyn Clock>,
}

impl StatisticsService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs,
            applications,
            clock,
        }
    }

    /// Totals over every application to the employer's jobs.
    pub fn application_statistics(
        &self,
        actor: &Actor,
    ) -> Result<ApplicationStatistics, MarketError> {
        require_employer(actor)?;
        let owned: HashSet<JobId> = self
            .jobs
            .by_employer(&actor.id)?
            .into_iter()
            .map(|job| job.id)
            .collect();
        let applications = self
            .applications
            .matching(&|application| owned.contains(&application.job))?;

        let since = self.clock.now() - Duration::days(RECENT_WINDOW_DAYS);
        let recent = applications
            .iter()
            .filter(|application| application.applied_at >= since)
            .count() as u32;

        Ok(ApplicationStatistics {
            total: applications.len() as u32,
            recent,
            by_status: StatusBreakdown::tally(&applications),
        })
    }

    pub fn job_statistics(&self, actor: &Actor) -> Result<JobStatistics, MarketError> {
        require_employer(actor)?;
        let now = self.clock.now();
        let jobs = self.jobs.by_employer(&actor.id)?;

        let mut statistics = JobStatistics {
            total: jobs.len() as u32,
            active: 0,
            inactive: 0,
            expired: 0,
            views: 0,
            applications: 0,
        };
        for job in &jobs {
            if job.is_expired(now) {
                statistics.expired += 1;
            } else if job.is_active {
                statistics.active += 1;
            }
            if !job.is_active {
                statistics.inactive += 1;
            }
            statistics.views += job.views;
            statistics.applications += job.application_count;
        }
        Ok(statistics)
    }
}

fn require_employer(actor: &Actor) -> Result<(), MarketError> {
    if authz::has_role(actor, Role::Employer) {
        Ok(())
    } else {
        Err(MarketError::Forbidden("statistics are available to employers only"))
    }
}
