//! Student applications to job postings: submission, employer review, withdrawal.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantSummary, Application, ApplicationSort, ApplicationStatus, ApplyRequest,
    EmployerApplicationView, StatusUpdate, StudentApplicationView,
};
pub use repository::{ApplicationRepository, Removal};
pub use router::application_router;
pub use service::{ApplicationService, ReceivedFilter};
