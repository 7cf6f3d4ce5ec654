use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::identity::{CompanySummary, User};
use crate::marketplace::ids::{ApplicationId, JobId, UserId};
use crate::marketplace::jobs::JobSummary;

pub const COVER_LETTER_MAX: usize = 2000;
pub const NOTES_MAX: usize = 1000;

/// Review status. Employers may move an application between any two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Accepted,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }

    /// Shortlisted and accepted applications are locked against withdrawal.
    pub const fn is_withdrawable(self) -> bool {
        !matches!(
            self,
            ApplicationStatus::Shortlisted | ApplicationStatus::Accepted
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub notes: Option<String>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(job: JobId, applicant: UserId, cover_letter: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            job,
            applicant,
            cover_letter,
            status: ApplicationStatus::Pending,
            applied_at: now,
            reviewed_at: None,
            reviewed_by: None,
            notes: None,
            interview_date: None,
            interview_location: None,
            updated_at: now,
        }
    }

    /// Applies an employer decision. The review stamp is written once, on the first move away
    /// from `pending`, and never rewritten.
    pub fn record_review(&mut self, update: &StatusUpdate, reviewer: &UserId, now: DateTime<Utc>) {
        if self.reviewed_at.is_none() && update.status != ApplicationStatus::Pending {
            self.reviewed_at = Some(now);
            self.reviewed_by = Some(reviewer.clone());
        }
        self.status = update.status;
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(date) = update.interview_date {
            self.interview_date = Some(date);
        }
        if let Some(location) = &update.interview_location {
            self.interview_location = Some(location.clone());
        }
        self.updated_at = now;
    }
}

/// Employer status change; omitted optional fields keep their stored values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interview_location: Option<String>,
}

impl StatusUpdate {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            notes: None,
            interview_date: None,
            interview_location: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    pub job: JobId,
    #[serde(default)]
    pub cover_letter: String,
}

/// Applicant profile fields shown to the reviewing employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
}

impl From<&User> for ApplicantSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            school: user.school.clone(),
            major: user.major.clone(),
            skills: user.skills.clone(),
            graduation_year: user.graduation_year,
            resume: user.resume.clone(),
        }
    }
}

/// A student's own application. The job summary is gone once the posting is deleted.
#[derive(Debug, Clone, Serialize)]
pub struct StudentApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_summary: Option<JobSummary>,
    pub company_profile: Option<CompanySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployerApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_summary: JobSummary,
    pub applicant_profile: Option<ApplicantSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSort {
    #[default]
    Newest,
    Oldest,
    Status,
}
