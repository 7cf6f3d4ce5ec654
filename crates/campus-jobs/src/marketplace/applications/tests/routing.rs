use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::marketplace::applications::{ApplicationStatus, StatusUpdate};
use crate::marketplace::fixtures::{sample_job, sample_user, start};
use crate::marketplace::identity::credentials::hash_token;
use crate::marketplace::identity::{Role, Session, SessionRepository, UserRepository};
use crate::marketplace::jobs::JobRepository;
use crate::marketplace::marketplace_router;

#[tokio::test]
async fn apply_route_creates_application() {
    let board = board();
    let token = board.harness.token(&board.student);
    let router = marketplace_router(board.harness.marketplace.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            &token,
            &json!({ "job": board.job_id(), "cover_letter": "Hello" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["job"], board.job_id().as_str());
    assert_eq!(board.application_count(), 1);
}

#[tokio::test]
async fn duplicate_apply_returns_conflict_code() {
    let board = board();
    board.apply_as(&board.student).expect("first application");
    let token = board.harness.token(&board.student);
    let router = marketplace_router(board.harness.marketplace.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            &token,
            &json!({ "job": board.job_id() }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "conflict");
}

#[tokio::test]
async fn students_cannot_change_status() {
    let board = board();
    let application = board.apply_as(&board.student).expect("applied");
    let token = board.harness.token(&board.student);
    let router = marketplace_router(board.harness.marketplace.clone());

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/applications/{}/status", application.id),
            &token,
            &json!({ "status": "accepted" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_status_value_is_a_validation_failure() {
    let board = board();
    let application = board.apply_as(&board.student).expect("applied");
    let token = board.harness.token(&board.employer);
    let router = marketplace_router(board.harness.marketplace.clone());

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/applications/{}/status", application.id),
            &token,
            &json!({ "status": "hired" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "validation_failed");
    assert_eq!(payload["fields"][0]["field"], "body");
    assert!(payload["fields"][0]["message"]
        .as_str()
        .is_some_and(|message| message.contains("hired")));
}

#[tokio::test]
async fn withdrawing_locked_application_is_invalid_state() {
    let board = board();
    let application = board.apply_as(&board.student).expect("applied");
    board
        .harness
        .marketplace
        .applications
        .update_status(
            &board.employer,
            &application.id,
            StatusUpdate::to(ApplicationStatus::Shortlisted),
        )
        .expect("shortlisted");
    let token = board.harness.token(&board.student);
    let router = marketplace_router(board.harness.marketplace.clone());

    let response = router
        .oneshot(
            axum::http::Request::delete(format!("/api/v1/applications/{}", application.id))
                .header(
                    axum::http::header::AUTHORIZATION,
                    format!("Bearer {token}"),
                )
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "invalid_state");
}

#[tokio::test]
async fn received_route_lists_applicant_profiles() {
    let board = board();
    board.apply_as(&board.student).expect("applied");
    let token = board.harness.token(&board.employer);
    let router = marketplace_router(board.harness.marketplace.clone());

    let response = router
        .oneshot(authorized_get(
            &format!("/api/v1/applications/received?job={}&sort=status", board.job_id()),
            &token,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["pagination"]["total"], 1);
    assert_eq!(
        payload["items"][0]["applicant_profile"]["email"],
        "kim@uni.test"
    );
}

#[tokio::test]
async fn statistics_route_is_employer_only() {
    let board = board();
    let router = marketplace_router(board.harness.marketplace.clone());

    let student_token = board.harness.token(&board.student);
    let denied = router
        .clone()
        .oneshot(authorized_get("/api/v1/applications/statistics", &student_token))
        .await
        .expect("route executes");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let employer_token = board.harness.token(&board.employer);
    let allowed = router
        .oneshot(authorized_get("/api/v1/applications/statistics", &employer_token))
        .await
        .expect("route executes");
    assert_eq!(allowed.status(), StatusCode::OK);
    let payload = read_json_body(allowed).await;
    assert_eq!(payload["total"], 0);
}

#[tokio::test]
async fn storage_failures_return_generic_internal_error() {
    let (marketplace, store) = offline_applications();
    let student = store
        .users
        .insert(sample_user("kim@uni.test"))
        .expect("student stored");
    assert_eq!(student.role, Role::Student);
    let job = store.jobs.insert(sample_job("usr-boss")).expect("job stored");
    let token = "offline-token";
    store
        .sessions
        .insert(Session {
            token_hash: hash_token(token),
            user: student.id.clone(),
            expires_at: start() + chrono::Duration::days(1),
        })
        .expect("session stored");

    let response = marketplace_router(marketplace)
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            token,
            &json!({ "job": job.id }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "internal server error");
    assert!(!payload.to_string().contains("database offline"));
}
