use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::marketplace::error::MarketError;
use crate::marketplace::ids::JobId;
use crate::marketplace::page::{Page, PageRequest};
use crate::marketplace::router::{CurrentActor, JsonBody};
use crate::marketplace::stats::JobStatistics;
use crate::marketplace::Marketplace;

use super::domain::{EmployerJobView, JobCategory, JobDraft, JobListing, JobPatch, JobType};
use super::query::{EmployerJobStatus, JobFilter, JobSort};

/// Public search plus the employer's posting endpoints.
pub fn jobs_router(marketplace: Arc<Marketplace>) -> Router {
    Router::new()
        .route("/api/v1/jobs", get(list_handler).post(create_handler))
        .route("/api/v1/jobs/featured", get(featured_handler))
        .route("/api/v1/jobs/mine", get(mine_handler))
        .route("/api/v1/jobs/statistics", get(statistics_handler))
        .route(
            "/api/v1/jobs/:job_id",
            get(detail_handler).put(update_handler).delete(delete_handler),
        )
        .with_state(marketplace)
}

/// Query strings are flat; `serde_urlencoded` cannot flatten numeric fields.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobListQuery {
    search: Option<String>,
    location: Option<String>,
    job_type: Option<JobType>,
    category: Option<JobCategory>,
    min_salary: Option<u32>,
    #[serde(default)]
    sort: JobSort,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmployerJobQuery {
    #[serde(default)]
    status: EmployerJobStatus,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeaturedQuery {
    limit: Option<usize>,
}

pub(crate) async fn list_handler(
    State(marketplace): State<Arc<Marketplace>>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Page<JobListing>>, MarketError> {
    let filter = JobFilter {
        search: query.search,
        location: query.location,
        job_type: query.job_type,
        category: query.category,
        min_salary: query.min_salary,
    };
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    marketplace.jobs.list_jobs(&filter, query.sort, page).map(Json)
}

pub(crate) async fn create_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    JsonBody(draft): JsonBody<JobDraft>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = marketplace.jobs.create_job(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub(crate) async fn featured_handler(
    State(marketplace): State<Arc<Marketplace>>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<JobListing>>, MarketError> {
    marketplace.jobs.list_featured(query.limit).map(Json)
}

pub(crate) async fn mine_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<EmployerJobQuery>,
) -> Result<Json<Page<EmployerJobView>>, MarketError> {
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    marketplace
        .jobs
        .list_employer_jobs(&actor, query.status, page)
        .map(Json)
}

pub(crate) async fn statistics_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<JobStatistics>, MarketError> {
    marketplace.statistics.job_statistics(&actor).map(Json)
}

pub(crate) async fn detail_handler(
    State(marketplace): State<Arc<Marketplace>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobListing>, MarketError> {
    marketplace.jobs.get_job(&JobId(job_id)).map(Json)
}

pub(crate) async fn update_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(job_id): Path<String>,
    JsonBody(patch): JsonBody<JobPatch>,
) -> Result<Json<JobListing>, MarketError> {
    marketplace
        .jobs
        .update_job(&actor, &JobId(job_id), patch)
        .map(Json)
}

pub(crate) async fn delete_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(job_id): Path<String>,
) -> Result<StatusCode, MarketError> {
    marketplace.jobs.delete_job(&actor, &JobId(job_id))?;
    Ok(StatusCode::NO_CONTENT)
}
