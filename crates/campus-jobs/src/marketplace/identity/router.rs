use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::marketplace::error::MarketError;
use crate::marketplace::ids::{CompanyId, JobId};
use crate::marketplace::jobs::JobListing;
use crate::marketplace::router::{BearerToken, CurrentActor, JsonBody};
use crate::marketplace::Marketplace;

use super::domain::{
    BlobUpload, Company, CompanyDraft, CompanyPatch, Credentials, DocumentKind, ProfilePatch,
    Registration, UserView,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Accounts, profiles, saved jobs and company pages.
pub fn identity_router(marketplace: Arc<Marketplace>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/api/v1/auth/me", get(me_handler))
        .route(
            "/api/v1/users/me",
            put(update_profile_handler).delete(deactivate_handler),
        )
        .route("/api/v1/users/me/documents/:kind", put(upload_handler))
        .route("/api/v1/users/me/saved-jobs", get(saved_jobs_handler))
        .route(
            "/api/v1/users/me/saved-jobs/:job_id",
            post(save_job_handler).delete(unsave_job_handler),
        )
        .route("/api/v1/companies", post(create_company_handler))
        .route(
            "/api/v1/companies/:company_id",
            get(company_handler).put(update_company_handler),
        )
        .with_state(marketplace)
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    file_name: String,
}

pub(crate) async fn register_handler(
    State(marketplace): State<Arc<Marketplace>>,
    JsonBody(registration): JsonBody<Registration>,
) -> Result<impl IntoResponse, MarketError> {
    let grant = marketplace.identity.register(registration)?;
    Ok((StatusCode::CREATED, Json(grant)))
}

pub(crate) async fn login_handler(
    State(marketplace): State<Arc<Marketplace>>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<impl IntoResponse, MarketError> {
    marketplace.identity.login(credentials).map(Json)
}

pub(crate) async fn logout_handler(
    State(marketplace): State<Arc<Marketplace>>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, MarketError> {
    marketplace.identity.logout(&token)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn me_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<UserView>, MarketError> {
    marketplace.identity.profile(&actor).map(Json)
}

pub(crate) async fn update_profile_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> Result<Json<UserView>, MarketError> {
    marketplace.identity.update_profile(&actor, patch).map(Json)
}

pub(crate) async fn deactivate_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, MarketError> {
    marketplace.identity.deactivate(&actor)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn upload_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<DocumentKind>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UserView>, MarketError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let upload = BlobUpload {
        file_name: query.file_name,
        content_type,
        bytes: body.to_vec(),
    };
    marketplace
        .identity
        .upload_document(&actor, kind, upload)
        .map(Json)
}

pub(crate) async fn saved_jobs_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<JobListing>>, MarketError> {
    marketplace.jobs.saved_jobs(&actor).map(Json)
}

pub(crate) async fn save_job_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    let saved = marketplace.identity.save_job(&actor, &JobId(job_id))?;
    Ok(Json(json!({ "saved": saved })))
}

pub(crate) async fn unsave_job_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    let saved = marketplace.identity.unsave_job(&actor, &JobId(job_id))?;
    Ok(Json(json!({ "saved": saved })))
}

pub(crate) async fn create_company_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    JsonBody(draft): JsonBody<CompanyDraft>,
) -> Result<impl IntoResponse, MarketError> {
    let company = marketplace.identity.create_company(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub(crate) async fn company_handler(
    State(marketplace): State<Arc<Marketplace>>,
    Path(company_id): Path<String>,
) -> Result<Json<Company>, MarketError> {
    marketplace.identity.company(&CompanyId(company_id)).map(Json)
}

pub(crate) async fn update_company_handler(
    State(marketplace): State<Arc<Marketplace>>,
    CurrentActor(actor): CurrentActor,
    Path(company_id): Path<String>,
    JsonBody(patch): JsonBody<CompanyPatch>,
) -> Result<Json<Company>, MarketError> {
    marketplace
        .identity
        .update_company(&actor, &CompanyId(company_id), patch)
        .map(Json)
}
