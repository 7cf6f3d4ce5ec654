//! Ownership and role predicates consulted before every mutation. No side effects.

use super::applications::Application;
use super::identity::{Actor, Company, Role};
use super::ids::{CompanyId, UserId};
use super::jobs::Job;

pub fn is_owner(actor_id: &UserId, resource_owner_id: &UserId) -> bool {
    actor_id == resource_owner_id
}

pub fn has_role(actor: &Actor, role: Role) -> bool {
    actor.role == role
}

pub fn can_mutate_job(actor: &Actor, job: &Job) -> bool {
    has_role(actor, Role::Employer) && is_owner(&actor.id, &job.employer)
}

/// Status changes belong to the employer of the parent job, never the applicant.
pub fn can_mutate_application_status(
    actor: &Actor,
    _application: &Application,
    job: &Job,
) -> bool {
    has_role(actor, Role::Employer) && is_owner(&actor.id, &job.employer)
}

pub fn can_withdraw(actor: &Actor, application: &Application) -> bool {
    is_owner(&actor.id, &application.applicant) && application.status.is_withdrawable()
}

pub fn can_manage_company(
    actor: &Actor,
    employer_company: Option<&CompanyId>,
    company: &Company,
) -> bool {
    has_role(actor, Role::Employer)
        && (company
            .owner
            .as_ref()
            .is_some_and(|owner| is_owner(&actor.id, owner))
            || employer_company == Some(&company.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::applications::{ApplicationStatus, StatusUpdate};
    use crate::marketplace::ids::JobId;
    use crate::marketplace::fixtures::sample_job;
    use chrono::{TimeZone, Utc};

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: UserId::from(id),
            role,
            is_active: true,
        }
    }

    fn application(status: ApplicationStatus) -> Application {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut application = Application::new(
            JobId::from("job-1"),
            UserId::from("usr-student"),
            String::new(),
            now,
        );
        application.record_review(&StatusUpdate::to(status), &UserId::from("usr-boss"), now);
        application
    }

    #[test]
    fn only_owning_employer_mutates_job() {
        let job = sample_job("usr-boss");
        assert!(can_mutate_job(&actor("usr-boss", Role::Employer), &job));
        assert!(!can_mutate_job(&actor("usr-rival", Role::Employer), &job));
        assert!(!can_mutate_job(&actor("usr-boss", Role::Student), &job));
    }

    #[test]
    fn applicant_cannot_change_status() {
        let job = sample_job("usr-boss");
        let pending = application(ApplicationStatus::Pending);
        assert!(can_mutate_application_status(
            &actor("usr-boss", Role::Employer),
            &pending,
            &job
        ));
        assert!(!can_mutate_application_status(
            &actor("usr-student", Role::Student),
            &pending,
            &job
        ));
    }

    #[test]
    fn withdrawal_requires_ownership_and_unlocked_status() {
        let student = actor("usr-student", Role::Student);
        assert!(can_withdraw(&student, &application(ApplicationStatus::Rejected)));
        assert!(!can_withdraw(&student, &application(ApplicationStatus::Shortlisted)));
        assert!(!can_withdraw(&student, &application(ApplicationStatus::Accepted)));
        assert!(!can_withdraw(
            &actor("usr-other", Role::Student),
            &application(ApplicationStatus::Pending)
        ));
    }
}
