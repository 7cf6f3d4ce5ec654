use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use super::applications::application_router;
use super::error::MarketError;
use super::identity::{identity_router, Actor};
use super::jobs::jobs_router;
use super::validation::ValidationErrors;
use super::Marketplace;

/// Every marketplace endpoint under `/api/v1`.
pub fn marketplace_router(marketplace: Arc<Marketplace>) -> Router {
    Router::new()
        .merge(identity_router(marketplace.clone()))
        .merge(jobs_router(marketplace.clone()))
        .merge(application_router(marketplace))
}

/// Raw token from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(MarketError::Unauthenticated("missing bearer token"))?;

        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| BearerToken(token.to_string()))
            .ok_or(MarketError::Unauthenticated("missing bearer token"))
    }
}

/// Authenticated caller, resolved through the identity service.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl FromRequestParts<Arc<Marketplace>> for CurrentActor {
    type Rejection = MarketError;

    async fn from_request_parts(
        parts: &mut Parts,
        marketplace: &Arc<Marketplace>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, marketplace).await?;
        marketplace.identity.authenticate(&token).map(CurrentActor)
    }
}

/// JSON request body whose rejections surface as `validation_failed` rather than axum's
/// plain-text 422.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(body_rejected(rejection)),
        }
    }
}

fn body_rejected(rejection: JsonRejection) -> MarketError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected an application/json body".to_string()
        }
        other => other.body_text(),
    };
    MarketError::Validation(ValidationErrors::single("body", message))
}
