use campus_jobs::config::MarketplaceConfig;
use campus_jobs::error::AppError;
use campus_jobs::marketplace::applications::{ApplicationStatus, ApplyRequest, StatusUpdate};
use campus_jobs::marketplace::identity::{Actor, Registration, Role};
use campus_jobs::marketplace::jobs::{JobDraft, JobPatch};
use campus_jobs::marketplace::{Clock, ManualClock, MarketError, Marketplace, PageRequest};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::sync::Arc;

const DEMO_PASSWORD: &str = "demo-password";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Wall-clock start of the scripted round (RFC 3339). Defaults to now.
    #[arg(long)]
    pub(crate) start: Option<DateTime<Utc>>,
    /// Number of students applying to the first posting.
    #[arg(long, default_value_t = 3)]
    pub(crate) students: usize,
    /// Print employer statistics as JSON instead of a summary line.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start,
        students,
        json,
    } = args;

    let clock = Arc::new(ManualClock::new(start.unwrap_or_else(Utc::now)));
    let (marketplace, _store) = Marketplace::in_memory(clock.clone(), MarketplaceConfig::default());

    println!("Campus hiring round demo");
    let employer = register(
        &marketplace,
        "talent@northwind.test",
        "Northwind Talent",
        Role::Employer,
    )?;

    let analyst = marketplace.jobs.create_job(
        &employer,
        posting("Junior Data Analyst", Some(clock.now() + Duration::days(14))),
    )?;
    let support = marketplace
        .jobs
        .create_job(&employer, posting("IT Support Intern", None))?;
    let company = marketplace.identity.company(&analyst.job.company)?;
    println!(
        "- Northwind Talent posted 2 jobs under '{}' (job count {})",
        company.name, company.job_count
    );

    let mut applicants = Vec::with_capacity(students);
    for index in 0..students {
        let student = register(
            &marketplace,
            &format!("student{index}@campus.test"),
            &format!("Student {index}"),
            Role::Student,
        )?;
        let application = marketplace.applications.apply(
            &student,
            ApplyRequest {
                job: analyst.job.id.clone(),
                cover_letter: "Looking forward to learning on real data.".to_string(),
            },
        )?;
        applicants.push((student, application));
    }
    println!("- {} applications received for '{}'", applicants.len(), analyst.job.title);

    if let Some((student, _)) = applicants.first() {
        let duplicate = marketplace.applications.apply(
            student,
            ApplyRequest {
                job: analyst.job.id.clone(),
                cover_letter: String::new(),
            },
        );
        if let Err(err) = duplicate {
            println!("  Duplicate application refused: {err}");
        }
    }

    clock.advance(Duration::days(2));
    if let Some((student, application)) = applicants.first() {
        let reviewed = marketplace.applications.update_status(
            &employer,
            &application.id,
            StatusUpdate {
                interview_location: Some("Building 4, room 210".to_string()),
                ..StatusUpdate::to(ApplicationStatus::Shortlisted)
            },
        )?;
        println!(
            "- Shortlisted {} at {}",
            application.id,
            reviewed
                .reviewed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default()
        );
        match marketplace.applications.withdraw(student, &application.id) {
            Err(MarketError::InvalidState(reason)) => {
                println!("  Withdrawal blocked: {reason}");
            }
            Err(err) => return Err(err.into()),
            Ok(()) => println!("  Withdrawal unexpectedly accepted"),
        }
    }
    if let Some((student, application)) = applicants.get(1) {
        marketplace.applications.withdraw(student, &application.id)?;
        println!("- {} withdrew a pending application", application.id);
    }

    marketplace.jobs.update_job(
        &employer,
        &support.job.id,
        JobPatch {
            is_active: Some(false),
            ..JobPatch::default()
        },
    )?;
    clock.advance(Duration::days(13));

    let dashboard = marketplace.jobs.list_employer_jobs(
        &employer,
        Default::default(),
        PageRequest::default(),
    )?;
    println!("\nEmployer dashboard");
    for row in &dashboard.items {
        println!(
            "  - {}: active {} | expired {} | {} applications | {} pending",
            row.job.title,
            row.job.is_active,
            row.is_expired,
            row.job.application_count,
            row.applications.get(ApplicationStatus::Pending)
        );
    }

    let statistics = marketplace.statistics.application_statistics(&employer)?;
    let jobs = marketplace.statistics.job_statistics(&employer)?;
    if json {
        let payload = serde_json::json!({ "applications": statistics, "jobs": jobs });
        match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => println!("  Statistics could not be rendered: {err}"),
        }
    } else {
        println!(
            "\nStatistics: {} applications ({} in the last week) across {} jobs ({} active, {} expired)",
            statistics.total, statistics.recent, jobs.total, jobs.active, jobs.expired
        );
    }

    let report = marketplace.reconciler.run()?;
    println!(
        "Counter check: {} jobs, {} companies, {} corrections",
        report.jobs_checked,
        report.companies_checked,
        report.corrections.len()
    );

    Ok(())
}

fn register(
    marketplace: &Marketplace,
    email: &str,
    name: &str,
    role: Role,
) -> Result<Actor, AppError> {
    let grant = marketplace.identity.register(Registration {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        name: name.to_string(),
        role,
        phone: None,
        school: (role == Role::Student).then(|| "Riverside University".to_string()),
        major: None,
        position: (role == Role::Employer).then(|| "Campus Recruiter".to_string()),
    })?;
    Ok(marketplace.identity.authenticate(&grant.token)?)
}

fn posting(title: &str, deadline: Option<DateTime<Utc>>) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: format!("{title} position for current students and recent graduates."),
        location: "Shanghai".to_string(),
        salary_min: Some(4000),
        salary_max: Some(6500),
        deadline,
        ..JobDraft::default()
    }
}
