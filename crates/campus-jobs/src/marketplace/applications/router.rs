use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::marketplace::error::MarketError;
use crate::marketplace::ids::{ApplicationId, JobId};
use crate::marketplace::page::{Page, PageRequest};
use crate::marketplace::router::{CurrentActor, JsonBody};
use crate::marketplace::stats::ApplicationStatistics;
use crate::marketplace::Marketplace;

use super::domain::{
    Application, ApplicationSort, ApplicationStatus, ApplyRequest, EmployerApplicationView,
    StatusUpdate, StudentApplicationView,
};
use super::service::ReceivedFilter;

/// Router builder for submitting, reviewing and withdrawing applications.
pub fn application_router(marketplace: Arc<Marketplace>) -> Router {
    Router::new()
        .route("/api/v1/applications", post(apply_handler))
        .route("/api/v1/applications/mine", get(mine_handler))
        .route("/api/v1/applications/received", get(received_handler))
        .route("/api/v1/applications/statistics", get(statistics_handler))
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler),
        )
        .route(
            "/api/v1/applications/:application_id",
            delete(withdraw_handler),
        )
        .with_state(marketplace)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MineQuery {
    status: Option<ApplicationStatus>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReceivedQuery {
    job: Option<JobId>,
    status: Option<ApplicationStatus>,
    #[serde(default)]
    sort: ApplicationSort,
    page: Option<u32>,
    limit: Option<u32>,
}

pub(crate) async fn apply_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    JsonBody(request): JsonBody<ApplyRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let application = marketplace.applications.apply(&actor, request)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn mine_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<MineQuery>,
) -> Result<Json<Page<StudentApplicationView>>, MarketError> {
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    marketplace
        .applications
        .list_for_student(&actor, query.status, page)
        .map(Json)
}

pub(crate) async fn received_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ReceivedQuery>,
) -> Result<Json<Page<EmployerApplicationView>>, MarketError> {
    let filter = ReceivedFilter {
        job: query.job,
        status: query.status,
        sort: query.sort,
    };
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    marketplace
        .applications
        .list_for_employer(&actor, &filter, page)
        .map(Json)
}

pub(crate) async fn statistics_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ApplicationStatistics>, MarketError> {
    marketplace
        .statistics
        .application_statistics(&actor)
        .map(Json)
}

pub(crate) async fn status_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(application_id): Path<String>,
    JsonBody(update): JsonBody<StatusUpdate>,
) -> Result<Json<Application>, MarketError> {
    marketplace
        .applications
        .update_status(&actor, &ApplicationId(application_id), update)
        .map(Json)
}

pub(crate) async fn withdraw_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(application_id): Path<String>,
) -> Result<StatusCode, MarketError> {
    marketplace
        .applications
        .withdraw(&actor, &ApplicationId(application_id))?;
    Ok(StatusCode::NO_CONTENT)
}
