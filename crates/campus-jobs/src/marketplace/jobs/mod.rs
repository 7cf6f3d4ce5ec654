//! Job postings, public search and the employer's posting dashboard.

pub mod domain;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    Compensation, EducationRequirement, EmployerJobView, Job, JobCategory, JobContact, JobDraft,
    JobListing, JobPatch, JobSummary, JobType, SalaryType,
};
pub use query::{EmployerJobStatus, JobFilter, JobSort};
pub use repository::{JobChange, JobRepository};
pub use router::jobs_router;
pub use service::JobService;
