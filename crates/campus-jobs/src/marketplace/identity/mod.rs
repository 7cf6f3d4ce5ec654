//! Accounts, sessions, companies and profile documents.

pub mod credentials;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Actor, BlobUpload, Company, CompanyContact, CompanyDraft, CompanyPatch, CompanySummary,
    Credentials, DocumentKind, EmployerSummary, ProfilePatch, Registration, Role, SavedJobs,
    Session, SessionGrant, User, UserView,
};
pub use repository::{
    BlobError, BlobStore, CompanyRepository, SessionRepository, UserRepository,
};
pub use router::identity_router;
pub use service::IdentityService;
