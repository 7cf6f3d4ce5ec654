use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::config::MarketplaceConfig;
use crate::marketplace::clock::ManualClock;
use crate::marketplace::identity::credentials::{generate_token, hash_token};
use crate::marketplace::identity::{
    Actor, Company, CompanyContact, Role, SavedJobs, Session, SessionRepository, User,
    UserRepository,
};
use crate::marketplace::ids::{CompanyId, JobId, UserId};
use crate::marketplace::jobs::{
    Compensation, EducationRequirement, Job, JobCategory, JobContact, JobDraft, JobListing,
    JobType, SalaryType,
};
use crate::marketplace::store::MemoryStore;
use crate::marketplace::Marketplace;

pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub(crate) fn sample_job(employer: &str) -> Job {
    Job {
        id: JobId::generate(),
        title: "Backend Intern".to_string(),
        description: "Build and operate internal services.".to_string(),
        requirements: vec!["Rust or Go".to_string()],
        responsibilities: vec!["Ship features".to_string()],
        tags: vec!["rust".to_string(), "backend".to_string()],
        salary: Compensation {
            text: "4000-6000".to_string(),
            min: Some(4000),
            max: Some(6000),
            kind: SalaryType::Monthly,
        },
        location: "Shanghai".to_string(),
        job_type: JobType::Internship,
        category: JobCategory::Technology,
        work_hours: "Flexible".to_string(),
        experience: "Not required".to_string(),
        education: EducationRequirement::Bachelor,
        vacancies: 2,
        employer: UserId::from(employer),
        company: CompanyId::from("cmp-sample"),
        contact: JobContact {
            name: "Hiring Team".to_string(),
            email: "jobs@example.com".to_string(),
            phone: None,
        },
        deadline: Some(start() + Duration::days(30)),
        is_active: true,
        is_featured: false,
        views: 0,
        application_count: 0,
        created_at: start(),
        updated_at: start(),
    }
}

pub(crate) fn sample_company(owner: &str) -> Company {
    Company {
        id: CompanyId::generate(),
        name: "Sample Labs".to_string(),
        description: None,
        industry: Some("Software".to_string()),
        size: None,
        website: None,
        location: Some("Shanghai".to_string()),
        contact: CompanyContact {
            email: "hello@example.com".to_string(),
            phone: None,
        },
        is_verified: false,
        is_active: true,
        job_count: 0,
        owner: Some(UserId::from(owner)),
        created_at: start(),
        updated_at: start(),
    }
}

pub(crate) fn sample_user(email: &str) -> User {
    User {
        id: UserId::generate(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        phone: None,
        avatar: None,
        role: Role::Student,
        is_active: true,
        school: None,
        major: None,
        skills: Vec::new(),
        graduation_year: None,
        resume: None,
        position: None,
        company: None,
        saved_jobs: SavedJobs::default(),
        created_at: start(),
        updated_at: start(),
    }
}

pub(crate) fn draft(title: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: format!("{title} for our campus programme."),
        location: "Beijing".to_string(),
        tags: vec!["campus".to_string()],
        deadline: Some(start() + Duration::days(14)),
        ..JobDraft::default()
    }
}

/// Marketplace over an in-memory store with a hand-driven clock. Accounts are inserted
/// directly so tests skip password hashing.
pub(crate) struct Harness {
    pub(crate) marketplace: Arc<Marketplace>,
    pub(crate) store: MemoryStore,
    pub(crate) clock: Arc<ManualClock>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_config(MarketplaceConfig::default())
    }

    pub(crate) fn with_config(config: MarketplaceConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let (marketplace, store) = Marketplace::in_memory(clock.clone(), config);
        Self {
            marketplace: Arc::new(marketplace),
            store,
            clock,
        }
    }

    pub(crate) fn account(&self, email: &str, role: Role) -> Actor {
        let mut user = sample_user(email);
        user.role = role;
        if role == Role::Employer {
            user.position = Some("Recruiter".to_string());
        }
        self.store
            .users
            .insert(user)
            .expect("account stored")
            .actor()
    }

    pub(crate) fn student(&self, email: &str) -> Actor {
        self.account(email, Role::Student)
    }

    pub(crate) fn employer(&self, email: &str) -> Actor {
        self.account(email, Role::Employer)
    }

    /// Opens a session for `actor` and returns its bearer token.
    pub(crate) fn token(&self, actor: &Actor) -> String {
        let token = generate_token();
        self.store
            .sessions
            .insert(Session {
                token_hash: hash_token(&token),
                user: actor.id.clone(),
                expires_at: start() + Duration::days(7),
            })
            .expect("session stored");
        token
    }

    pub(crate) fn post_job(&self, employer: &Actor, title: &str) -> JobListing {
        self.marketplace
            .jobs
            .create_job(employer, draft(title))
            .expect("job posted")
    }
}
