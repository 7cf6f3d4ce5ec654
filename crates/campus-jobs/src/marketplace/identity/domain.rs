use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::ids::{CompanyId, JobId, UserId};

/// The two sides of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Employer,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Employer => "employer",
        }
    }
}

/// Caller identity resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
    pub is_active: bool,
}

/// Saved job references, newest last, bounded by a capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedJobs(Vec<JobId>);

impl SavedJobs {
    /// Saves `job` as the most recent entry, evicting the oldest entries beyond `capacity`.
    pub fn save(&mut self, job: JobId, capacity: usize) {
        self.0.retain(|existing| existing != &job);
        self.0.push(job);
        if self.0.len() > capacity {
            let overflow = self.0.len() - capacity;
            self.0.drain(..overflow);
        }
    }

    pub fn remove(&mut self, job: &JobId) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != job);
        before != self.0.len()
    }

    pub fn contains(&self, job: &JobId) -> bool {
        self.0.contains(job)
    }

    /// Most recently saved first.
    pub fn newest_first(&self) -> impl Iterator<Item = &JobId> {
        self.0.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub school: Option<String>,
    pub major: Option<String>,
    pub skills: Vec<String>,
    pub graduation_year: Option<u16>,
    pub resume: Option<String>,
    pub position: Option<String>,
    pub company: Option<CompanyId>,
    pub saved_jobs: SavedJobs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id.clone(),
            role: self.role,
            is_active: self.is_active,
        }
    }

    /// Public projection without the credential hash.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            avatar: self.avatar.clone(),
            role: self.role,
            is_active: self.is_active,
            school: self.school.clone(),
            major: self.major.clone(),
            skills: self.skills.clone(),
            graduation_year: self.graduation_year,
            resume: self.resume.clone(),
            position: self.position.clone(),
            company: self.company.clone(),
            saved_jobs: self.saved_jobs.len(),
            created_at: self.created_at,
        }
    }

    pub fn employer_summary(&self) -> EmployerSummary {
        EmployerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            position: self.position.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyId>,
    pub saved_jobs: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployerSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub school: Option<String>,
    pub major: Option<String>,
    pub skills: Option<Vec<String>>,
    pub graduation_year: Option<u16>,
    pub position: Option<String>,
}

impl ProfilePatch {
    pub(crate) fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.trim().to_string());
        }
        if let Some(school) = &self.school {
            user.school = Some(school.trim().to_string());
        }
        if let Some(major) = &self.major {
            user.major = Some(major.trim().to_string());
        }
        if let Some(skills) = &self.skills {
            user.skills = skills
                .iter()
                .map(|skill| skill.trim().to_string())
                .filter(|skill| !skill.is_empty())
                .collect();
        }
        if let Some(year) = self.graduation_year {
            user.graduation_year = Some(year);
        }
        if let Some(position) = &self.position {
            user.position = Some(position.trim().to_string());
        }
    }

    pub(crate) fn touches_student_fields(&self) -> bool {
        self.school.is_some()
            || self.major.is_some()
            || self.skills.is_some()
            || self.graduation_year.is_some()
    }
}

/// Session row; only the SHA-256 of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token_hash: String,
    pub user: UserId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyContact {
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub contact: CompanyContact,
    pub is_verified: bool,
    pub is_active: bool,
    pub job_count: u32,
    /// Employer the company was created for; at most one company per owner.
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            industry: self.industry.clone(),
            location: self.location.clone(),
            is_verified: self.is_verified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl CompanyPatch {
    pub(crate) fn apply(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            company.description = Some(description.clone());
        }
        if let Some(industry) = &self.industry {
            company.industry = Some(industry.clone());
        }
        if let Some(size) = &self.size {
            company.size = Some(size.clone());
        }
        if let Some(website) = &self.website {
            company.website = Some(website.clone());
        }
        if let Some(location) = &self.location {
            company.location = Some(location.clone());
        }
        if let Some(email) = &self.contact_email {
            company.contact.email = email.trim().to_ascii_lowercase();
        }
        if let Some(phone) = &self.contact_phone {
            company.contact.phone = Some(phone.clone());
        }
    }
}

/// Which profile reference an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    Avatar,
}

/// File handed to the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
