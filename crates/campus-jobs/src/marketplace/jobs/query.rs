use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{Job, JobCategory, JobType};

/// Public search filters. Every present filter must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub category: Option<JobCategory>,
    #[serde(default)]
    pub min_salary: Option<u32>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(search) = non_blank(&self.search) {
            if !job.matches_text(search) {
                return false;
            }
        }
        if let Some(location) = non_blank(&self.location) {
            if !job
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if self.job_type.is_some_and(|job_type| job.job_type != job_type) {
            return false;
        }
        if self.category.is_some_and(|category| job.category != category) {
            return false;
        }
        if let Some(threshold) = self.min_salary {
            if !job.salary.meets_minimum(threshold) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    Newest,
    Oldest,
    Salary,
    Views,
    Deadline,
}

impl JobSort {
    pub fn apply(self, jobs: &mut [Job]) {
        match self {
            JobSort::Newest => jobs.sort_by_key(|job| Reverse(job.created_at)),
            JobSort::Oldest => jobs.sort_by_key(|job| job.created_at),
            JobSort::Salary => {
                jobs.sort_by_key(|job| (Reverse(job.salary.sort_key()), Reverse(job.created_at)))
            }
            JobSort::Views => jobs.sort_by_key(|job| (Reverse(job.views), Reverse(job.created_at))),
            // Open-ended postings go last.
            JobSort::Deadline => jobs.sort_by_key(|job| (job.deadline.is_none(), job.deadline)),
        }
    }
}

/// Lifecycle filter for an employer's own postings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployerJobStatus {
    #[default]
    All,
    Active,
    Inactive,
    Expired,
}

impl EmployerJobStatus {
    pub fn matches(self, job: &Job, now: DateTime<Utc>) -> bool {
        match self {
            EmployerJobStatus::All => true,
            EmployerJobStatus::Active => job.is_active && !job.is_expired(now),
            EmployerJobStatus::Inactive => !job.is_active,
            EmployerJobStatus::Expired => job.is_expired(now),
        }
    }
}
