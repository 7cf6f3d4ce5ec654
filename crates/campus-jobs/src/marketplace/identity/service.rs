use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::config::MarketplaceConfig;
use crate::marketplace::authz;
use crate::marketplace::clock::Clock;
use crate::marketplace::error::{MarketError, RepositoryError};
use crate::marketplace::ids::{CompanyId, JobId, UserId};
use crate::marketplace::jobs::JobRepository;
use crate::marketplace::validation::ValidationErrors;

use super::credentials::{generate_token, hash_password, hash_token, verify_password};
use super::domain::{
    Actor, BlobUpload, Company, CompanyContact, CompanyDraft, CompanyPatch, Credentials,
    DocumentKind, ProfilePatch, Registration, Role, SavedJobs, Session, SessionGrant, User,
    UserView,
};
use super::repository::{BlobStore, CompanyRepository, SessionRepository, UserRepository};

const NAME_MAX: usize = 50;
const PROFILE_FIELD_MAX: usize = 100;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;
const COMPANY_NAME_MAX: usize = 100;
const COMPANY_TEXT_MAX: usize = 2000;

/// Users, sessions, companies and profile uploads.
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    companies: Arc<dyn CompanyRepository>,
    jobs: Arc<dyn JobRepository>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    config: MarketplaceConfig,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        companies: Arc<dyn CompanyRepository>,
        jobs: Arc<dyn JobRepository>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            companies,
            jobs,
            blobs,
            clock,
            config,
        }
    }

    /// Create an account and open its first session.
    pub fn register(&self, registration: Registration) -> Result<SessionGrant, MarketError> {
        let mut errors = ValidationErrors::new();
        errors.email("email", &registration.email);
        let password_length = registration.password.chars().count();
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password_length) {
            errors.push(
                "password",
                format!("must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"),
            );
        }
        errors.require_text("name", &registration.name, NAME_MAX);
        errors.phone("phone", registration.phone.as_deref());
        errors.optional_text("school", registration.school.as_deref(), PROFILE_FIELD_MAX);
        errors.optional_text("major", registration.major.as_deref(), PROFILE_FIELD_MAX);
        errors.optional_text("position", registration.position.as_deref(), PROFILE_FIELD_MAX);
        match registration.role {
            Role::Student if registration.position.is_some() => {
                errors.push("position", "only employers have a position")
            }
            Role::Employer if registration.school.is_some() || registration.major.is_some() => {
                errors.push("school", "only students have a school or major")
            }
            _ => {}
        }
        errors.into_result()?;

        let password_hash = hash_password(&registration.password).map_err(|err| {
            MarketError::StoreUnavailable(RepositoryError::Unavailable(err.to_string()))
        })?;
        let now = self.clock.now();
        let user = User {
            id: UserId::generate(),
            email: normalize_email(&registration.email),
            password_hash,
            name: registration.name.trim().to_string(),
            phone: registration.phone,
            avatar: None,
            role: registration.role,
            is_active: true,
            school: registration.school,
            major: registration.major,
            skills: Vec::new(),
            graduation_year: None,
            resume: None,
            position: registration.position,
            company: None,
            saved_jobs: SavedJobs::default(),
            created_at: now,
            updated_at: now,
        };

        let user = self.users.insert(user).map_err(|err| match err {
            RepositoryError::Conflict => MarketError::Conflict("email is already registered"),
            other => other.into(),
        })?;
        info!(user = %user.id, role = user.role.label(), "account registered");

        self.open_session(&user)
    }

    pub fn login(&self, credentials: Credentials) -> Result<SessionGrant, MarketError> {
        let user = self
            .users
            .find_by_email(&normalize_email(&credentials.email))?
            .filter(|user| verify_password(&credentials.password, &user.password_hash))
            .ok_or(MarketError::Unauthenticated("invalid email or password"))?;

        if !user.is_active {
            return Err(MarketError::Unauthenticated("account is deactivated"));
        }

        self.open_session(&user)
    }

    pub fn logout(&self, token: &str) -> Result<(), MarketError> {
        self.sessions.revoke(&hash_token(token))?;
        Ok(())
    }

    /// Resolve the caller behind a bearer token.
    pub fn authenticate(&self, token: &str) -> Result<Actor, MarketError> {
        let token_hash = hash_token(token);
        let session = self
            .sessions
            .fetch(&token_hash)?
            .ok_or(MarketError::Unauthenticated("invalid or expired session"))?;

        if session.expires_at <= self.clock.now() {
            self.sessions.revoke(&token_hash)?;
            return Err(MarketError::Unauthenticated("invalid or expired session"));
        }

        let user = self
            .users
            .fetch(&session.user)?
            .ok_or(MarketError::Unauthenticated("invalid or expired session"))?;
        if !user.is_active {
            return Err(MarketError::Unauthenticated("account is deactivated"));
        }

        Ok(user.actor())
    }

    pub fn profile(&self, actor: &Actor) -> Result<UserView, MarketError> {
        Ok(self.user(&actor.id)?.view())
    }

    pub fn update_profile(
        &self,
        actor: &Actor,
        patch: ProfilePatch,
    ) -> Result<UserView, MarketError> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &patch.name {
            errors.require_text("name", name, NAME_MAX);
        }
        errors.phone("phone", patch.phone.as_deref());
        errors.optional_text("school", patch.school.as_deref(), PROFILE_FIELD_MAX);
        errors.optional_text("major", patch.major.as_deref(), PROFILE_FIELD_MAX);
        errors.optional_text("position", patch.position.as_deref(), PROFILE_FIELD_MAX);
        if let Some(skills) = &patch.skills {
            if skills.len() > 30 {
                errors.push("skills", "at most 30 skills");
            }
        }
        if actor.role == Role::Employer && patch.touches_student_fields() {
            errors.push("school", "only students have academic profile fields");
        }
        if actor.role == Role::Student && patch.position.is_some() {
            errors.push("position", "only employers have a position");
        }
        errors.into_result()?;

        let now = self.clock.now();
        let user = self
            .users
            .modify(&actor.id, &mut |user| {
                patch.apply(user);
                user.updated_at = now;
            })
            .map_err(user_not_found)?;
        Ok(user.view())
    }

    /// Soft-deletes the caller's account and drops its sessions.
    pub fn deactivate(&self, actor: &Actor) -> Result<(), MarketError> {
        let now = self.clock.now();
        self.users
            .modify(&actor.id, &mut |user| {
                user.is_active = false;
                user.updated_at = now;
            })
            .map_err(user_not_found)?;
        let revoked = self.sessions.revoke_for_user(&actor.id)?;
        info!(user = %actor.id, revoked, "account deactivated");
        Ok(())
    }

    pub fn save_job(&self, actor: &Actor, job: &JobId) -> Result<usize, MarketError> {
        if self.jobs.fetch(job)?.is_none() {
            return Err(MarketError::NotFound("job"));
        }
        let capacity = self.config.saved_jobs_capacity;
        let user = self
            .users
            .modify(&actor.id, &mut |user| user.saved_jobs.save(job.clone(), capacity))
            .map_err(user_not_found)?;
        Ok(user.saved_jobs.len())
    }

    pub fn unsave_job(&self, actor: &Actor, job: &JobId) -> Result<usize, MarketError> {
        let mut removed = false;
        let user = self
            .users
            .modify(&actor.id, &mut |user| removed = user.saved_jobs.remove(job))
            .map_err(user_not_found)?;
        if !removed {
            return Err(MarketError::NotFound("saved job"));
        }
        Ok(user.saved_jobs.len())
    }

    /// Store an upload and keep only its reference on the profile.
    pub fn upload_document(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        upload: BlobUpload,
    ) -> Result<UserView, MarketError> {
        if kind == DocumentKind::Resume && !authz::has_role(actor, Role::Student) {
            return Err(MarketError::Forbidden("only students can upload a resume"));
        }
        let mut errors = ValidationErrors::new();
        errors.require_text("file_name", &upload.file_name, 255);
        if upload.bytes.is_empty() {
            errors.push("file", "is empty");
        }
        errors.into_result()?;

        let reference = self.blobs.store(upload).map_err(|err| {
            MarketError::StoreUnavailable(RepositoryError::Unavailable(err.to_string()))
        })?;
        let now = self.clock.now();
        let user = self
            .users
            .modify(&actor.id, &mut |user| {
                match kind {
                    DocumentKind::Resume => user.resume = Some(reference.clone()),
                    DocumentKind::Avatar => user.avatar = Some(reference.clone()),
                }
                user.updated_at = now;
            })
            .map_err(user_not_found)?;
        Ok(user.view())
    }

    pub fn create_company(
        &self,
        actor: &Actor,
        draft: CompanyDraft,
    ) -> Result<Company, MarketError> {
        if !authz::has_role(actor, Role::Employer) {
            return Err(MarketError::Forbidden("only employers can create a company"));
        }
        validate_company_draft(&draft)?;

        let employer = self.user(&actor.id)?;
        if employer.company.is_some() {
            return Err(MarketError::Conflict("employer already has a company"));
        }

        let company = self.company_from_draft(&employer, draft);
        let candidate = company.id.clone();
        let stored = self.companies.provision_for_owner(company)?;
        let attached = self
            .users
            .attach_company(&employer.id, &stored.id, None)
            .map_err(user_not_found)?;
        if stored.id != candidate || attached != stored.id {
            return Err(MarketError::Conflict("employer already has a company"));
        }

        info!(company = %stored.id, employer = %employer.id, "company created");
        Ok(stored)
    }

    pub fn update_company(
        &self,
        actor: &Actor,
        id: &CompanyId,
        patch: CompanyPatch,
    ) -> Result<Company, MarketError> {
        let company = self.company(id)?;
        let employer = self.user(&actor.id)?;
        if !authz::can_manage_company(actor, employer.company.as_ref(), &company) {
            return Err(MarketError::Forbidden("only the owning employer can edit this company"));
        }

        let mut errors = ValidationErrors::new();
        if let Some(name) = &patch.name {
            errors.require_text("name", name, COMPANY_NAME_MAX);
        }
        errors.optional_text("description", patch.description.as_deref(), COMPANY_TEXT_MAX);
        if let Some(email) = &patch.contact_email {
            errors.email("contact_email", email);
        }
        errors.phone("contact_phone", patch.contact_phone.as_deref());
        errors.into_result()?;

        let now = self.clock.now();
        let company = self
            .companies
            .modify(id, &mut |company| {
                patch.apply(company);
                company.updated_at = now;
            })
            .map_err(|err| match err {
                RepositoryError::NotFound => MarketError::NotFound("company"),
                other => other.into(),
            })?;
        Ok(company)
    }

    pub fn company(&self, id: &CompanyId) -> Result<Company, MarketError> {
        self.companies
            .fetch(id)?
            .filter(|company| company.is_active)
            .ok_or(MarketError::NotFound("company"))
    }

    pub(crate) fn user(&self, id: &UserId) -> Result<User, MarketError> {
        self.users.fetch(id)?.ok_or(MarketError::NotFound("user"))
    }

    /// Company an employer posts under, provisioning one on first use.
    ///
    /// Safe under concurrent first postings: the store upserts by owner and the employer row
    /// only accepts the first company attached to it.
    pub(crate) fn ensure_company(
        &self,
        employer: &User,
        preferred_name: Option<&str>,
    ) -> Result<Company, MarketError> {
        let mut stale = None;
        if let Some(existing) = &employer.company {
            if let Some(company) = self.companies.fetch(existing)? {
                return Ok(company);
            }
            warn!(employer = %employer.id, company = %existing, "employer references a missing company");
            stale = Some(existing.clone());
        }

        let name = preferred_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}'s Company", employer.name));
        let draft = CompanyDraft {
            name,
            contact_phone: employer.phone.clone(),
            ..CompanyDraft::default()
        };
        let provisioned = self
            .companies
            .provision_for_owner(self.company_from_draft(employer, draft))?;
        let attached = self
            .users
            .attach_company(&employer.id, &provisioned.id, stale.as_ref())
            .map_err(user_not_found)?;

        if attached == provisioned.id {
            info!(company = %provisioned.id, employer = %employer.id, "company auto-provisioned");
            return Ok(provisioned);
        }

        self.companies
            .fetch(&attached)?
            .ok_or(MarketError::NotFound("company"))
    }

    fn company_from_draft(&self, employer: &User, draft: CompanyDraft) -> Company {
        let now = self.clock.now();
        Company {
            id: CompanyId::generate(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            industry: draft.industry,
            size: draft.size,
            website: draft.website,
            location: draft.location,
            contact: CompanyContact {
                email: draft
                    .contact_email
                    .map(|email| normalize_email(&email))
                    .unwrap_or_else(|| employer.email.clone()),
                phone: draft.contact_phone,
            },
            is_verified: false,
            is_active: true,
            job_count: 0,
            owner: Some(employer.id.clone()),
            created_at: now,
            updated_at: now,
        }
    }

    fn open_session(&self, user: &User) -> Result<SessionGrant, MarketError> {
        let token = generate_token();
        let expires_at = self.clock.now() + Duration::hours(self.config.session_ttl_hours);
        self.sessions.insert(Session {
            token_hash: hash_token(&token),
            user: user.id.clone(),
            expires_at,
        })?;

        Ok(SessionGrant {
            token,
            expires_at,
            user: user.view(),
        })
    }
}

fn validate_company_draft(draft: &CompanyDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require_text("name", &draft.name, COMPANY_NAME_MAX);
    errors.optional_text("description", draft.description.as_deref(), COMPANY_TEXT_MAX);
    errors.optional_text("industry", draft.industry.as_deref(), PROFILE_FIELD_MAX);
    errors.optional_text("website", draft.website.as_deref(), 255);
    if let Some(email) = &draft.contact_email {
        errors.email("contact_email", email);
    }
    errors.phone("contact_phone", draft.contact_phone.as_deref());
    errors.into_result()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn user_not_found(err: RepositoryError) -> MarketError {
    match err {
        RepositoryError::NotFound => MarketError::NotFound("user"),
        other => other.into(),
    }
}
