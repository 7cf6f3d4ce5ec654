use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::marketplace::identity::{CompanySummary, EmployerSummary};
use crate::marketplace::ids::{CompanyId, JobId, UserId};
use crate::marketplace::stats::StatusBreakdown;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Internship,
    Contract,
    Temporary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Technology,
    Finance,
    Marketing,
    Sales,
    Design,
    Education,
    Healthcare,
    Engineering,
    Operations,
    Administration,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    Hourly,
    Daily,
    Monthly,
    Yearly,
    #[default]
    Negotiable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationRequirement {
    #[default]
    Any,
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

/// Free-text salary plus the optional numeric band used for filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    pub text: String,
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub kind: SalaryType,
}

impl Compensation {
    /// Numeric lower bound meets the threshold, or the threshold appears in the free text.
    pub fn meets_minimum(&self, threshold: u32) -> bool {
        self.min.is_some_and(|min| min >= threshold)
            || self.text.contains(&threshold.to_string())
    }

    /// Best numeric figure for ordering by salary.
    pub fn sort_key(&self) -> u32 {
        self.max.or(self.min).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A posting. `views` and `application_count` are caches maintained by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub tags: Vec<String>,
    pub salary: Compensation,
    pub location: String,
    pub job_type: JobType,
    pub category: JobCategory,
    pub work_hours: String,
    pub experience: String,
    pub education: EducationRequirement,
    pub vacancies: u32,
    pub employer: UserId,
    pub company: CompanyId,
    pub contact: JobContact,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_featured: bool,
    pub views: u64,
    pub application_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Past its deadline, whatever `is_active` says.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now > deadline)
    }

    pub fn summary(&self, now: DateTime<Utc>) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            location: self.location.clone(),
            job_type: self.job_type,
            salary: self.salary.text.clone(),
            company: self.company.clone(),
            deadline: self.deadline,
            is_active: self.is_active,
            is_expired: self.is_expired(now),
        }
    }

    pub(crate) fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: String,
    pub company: CompanyId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_expired: bool,
}

/// Job joined with its company and employer for display.
#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_profile: Option<CompanySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_profile: Option<EmployerSummary>,
}

/// Employer dashboard row with a fresh per-status application count.
#[derive(Debug, Clone, Serialize)]
pub struct EmployerJobView {
    #[serde(flatten)]
    pub job: Job,
    pub is_expired: bool,
    pub applications: StatusBreakdown,
}

/// Payload for a new posting; every omitted attribute gets a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub category: Option<JobCategory>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default)]
    pub salary_type: Option<SalaryType>,
    #[serde(default)]
    pub work_hours: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub education: Option<EducationRequirement>,
    #[serde(default)]
    pub vacancies: Option<u32>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    /// Name for the company provisioned when the employer has none yet.
    #[serde(default)]
    pub company_name: Option<String>,
}

pub(crate) const DEFAULT_SALARY_TEXT: &str = "Negotiable";
pub(crate) const DEFAULT_WORK_HOURS: &str = "Flexible";
pub(crate) const DEFAULT_EXPERIENCE: &str = "Not required";

impl JobDraft {
    pub(crate) fn compensation(&self) -> Compensation {
        let text = match &self.salary {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => band_text(self.salary_min, self.salary_max),
        };
        let kind = self.salary_type.unwrap_or(
            if self.salary_min.is_some() || self.salary_max.is_some() {
                SalaryType::Monthly
            } else {
                SalaryType::Negotiable
            },
        );

        Compensation {
            text,
            min: self.salary_min,
            max: self.salary_max,
            kind,
        }
    }
}

/// Salary text shown when the employer gave only a numeric band.
fn band_text(min: Option<u32>, max: Option<u32>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{min}-{max}"),
        (Some(min), None) => format!("{min}+"),
        (None, Some(max)) => format!("up to {max}"),
        (None, None) => DEFAULT_SALARY_TEXT.to_string(),
    }
}

/// Partial job update. Clearable fields use a nested option: absent leaves the value alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub job_type: Option<JobType>,
    pub category: Option<JobCategory>,
    pub salary: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub salary_min: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub salary_max: Option<Option<u32>>,
    pub salary_type: Option<SalaryType>,
    pub work_hours: Option<String>,
    pub experience: Option<String>,
    pub education: Option<EducationRequirement>,
    pub vacancies: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub contact_phone: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl JobPatch {
    pub(crate) fn apply(&self, job: &mut Job, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            job.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            job.description = description.clone();
        }
        if let Some(location) = &self.location {
            job.location = location.trim().to_string();
        }
        if let Some(requirements) = &self.requirements {
            job.requirements = requirements.clone();
        }
        if let Some(responsibilities) = &self.responsibilities {
            job.responsibilities = responsibilities.clone();
        }
        if let Some(tags) = &self.tags {
            job.tags = tags.clone();
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(category) = self.category {
            job.category = category;
        }
        let derived = job.salary.text == band_text(job.salary.min, job.salary.max);
        if let Some(min) = self.salary_min {
            job.salary.min = min;
        }
        if let Some(max) = self.salary_max {
            job.salary.max = max;
        }
        match &self.salary {
            Some(salary) => job.salary.text = salary.trim().to_string(),
            None if derived => job.salary.text = band_text(job.salary.min, job.salary.max),
            None => {}
        }
        if let Some(kind) = self.salary_type {
            job.salary.kind = kind;
        }
        if let Some(work_hours) = &self.work_hours {
            job.work_hours = work_hours.clone();
        }
        if let Some(experience) = &self.experience {
            job.experience = experience.clone();
        }
        if let Some(education) = self.education {
            job.education = education;
        }
        if let Some(vacancies) = self.vacancies {
            job.vacancies = vacancies;
        }
        if let Some(deadline) = self.deadline {
            job.deadline = deadline;
        }
        if let Some(name) = &self.contact_name {
            job.contact.name = name.clone();
        }
        if let Some(email) = &self.contact_email {
            job.contact.email = email.trim().to_ascii_lowercase();
        }
        if let Some(phone) = &self.contact_phone {
            job.contact.phone = phone.clone();
        }
        if let Some(active) = self.is_active {
            job.is_active = active;
        }
        if let Some(featured) = self.is_featured {
            job.is_featured = featured;
        }
        job.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn compensation(text: &str, min: Option<u32>) -> Compensation {
        Compensation {
            text: text.to_string(),
            min,
            max: None,
            kind: SalaryType::Monthly,
        }
    }

    #[test]
    fn minimum_salary_matches_number_or_text() {
        assert!(compensation("Negotiable", Some(6000)).meets_minimum(5000));
        assert!(compensation("5000-8000 per month", None).meets_minimum(5000));
        assert!(!compensation("Negotiable", Some(4000)).meets_minimum(5000));
        assert!(!compensation("Negotiable", None).meets_minimum(5000));
    }

    #[test]
    fn draft_defaults_salary_text_from_band() {
        let draft = JobDraft {
            salary_min: Some(4000),
            salary_max: Some(6000),
            ..JobDraft::default()
        };
        let salary = draft.compensation();
        assert_eq!(salary.text, "4000-6000");
        assert_eq!(salary.kind, SalaryType::Monthly);

        let negotiable = JobDraft::default().compensation();
        assert_eq!(negotiable.text, DEFAULT_SALARY_TEXT);
        assert_eq!(negotiable.kind, SalaryType::Negotiable);
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let absent: JobPatch = serde_json::from_str(r#"{"title":"New"}"#).expect("parses");
        assert!(absent.deadline.is_none());

        let cleared: JobPatch = serde_json::from_str(r#"{"deadline":null}"#).expect("parses");
        assert_eq!(cleared.deadline, Some(None));

        let set: JobPatch =
            serde_json::from_str(r#"{"salary_min":3000}"#).expect("parses");
        assert_eq!(set.salary_min, Some(Some(3000)));
    }

    fn banded_job() -> Job {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start");
        Job {
            id: JobId::from("job-banded"),
            title: "Analyst".to_string(),
            description: "Reports".to_string(),
            requirements: Vec::new(),
            responsibilities: Vec::new(),
            tags: Vec::new(),
            salary: Compensation {
                text: "4000-6000".to_string(),
                min: Some(4000),
                max: Some(6000),
                kind: SalaryType::Monthly,
            },
            location: "Beijing".to_string(),
            job_type: JobType::default(),
            category: JobCategory::default(),
            work_hours: DEFAULT_WORK_HOURS.to_string(),
            experience: DEFAULT_EXPERIENCE.to_string(),
            education: EducationRequirement::default(),
            vacancies: 1,
            employer: UserId::from("usr-boss"),
            company: CompanyId::from("cmp-acme"),
            contact: JobContact {
                name: "HR".to_string(),
                email: "hr@acme.test".to_string(),
                phone: Some("13800000000".to_string()),
            },
            deadline: None,
            is_active: true,
            is_featured: false,
            views: 0,
            application_count: 0,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn band_change_rebuilds_derived_salary_text() {
        let mut job = banded_job();
        let now = job.created_at;

        JobPatch {
            salary_min: Some(Some(7000)),
            salary_max: Some(Some(9000)),
            ..JobPatch::default()
        }
        .apply(&mut job, now);
        assert_eq!(job.salary.text, "7000-9000");
        assert!(!job.salary.text.contains("4000"));

        JobPatch {
            salary_max: Some(None),
            ..JobPatch::default()
        }
        .apply(&mut job, now);
        assert_eq!(job.salary.text, "7000+");
    }

    #[test]
    fn band_change_keeps_custom_salary_text() {
        let mut job = banded_job();
        job.salary.text = "Competitive, plus housing".to_string();
        let now = job.created_at;

        JobPatch {
            salary_min: Some(Some(7000)),
            ..JobPatch::default()
        }
        .apply(&mut job, now);

        assert_eq!(job.salary.text, "Competitive, plus housing");
        assert_eq!(job.salary.min, Some(7000));
    }

    #[test]
    fn contact_phone_can_be_cleared() {
        let mut job = banded_job();
        let now = job.created_at;

        let patch: JobPatch =
            serde_json::from_str(r#"{"contact_phone":null}"#).expect("parses");
        assert_eq!(patch.contact_phone, Some(None));
        patch.apply(&mut job, now);
        assert!(job.contact.phone.is_none());

        let untouched: JobPatch = serde_json::from_str(r#"{"title":"Analyst"}"#).expect("parses");
        job.contact.phone = Some("13800000000".to_string());
        untouched.apply(&mut job, now);
        assert_eq!(job.contact.phone.as_deref(), Some("13800000000"));
    }
}
