use crate::cli::ServeArgs;
use crate::infra::{AppState, GuessingBlobStore};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_jobs::config::AppConfig;
use campus_jobs::error::AppError;
use campus_jobs::marketplace::{Marketplace, MemoryStore, SystemClock};
use campus_jobs::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = MemoryStore::default();
    let marketplace = Arc::new(Marketplace::new(
        store.repositories(),
        Arc::new(GuessingBlobStore::new(store.blobs.clone())),
        Arc::new(SystemClock),
        config.marketplace.clone(),
    ));

    let report = marketplace.reconciler.run()?;
    info!(
        jobs = report.jobs_checked,
        companies = report.companies_checked,
        corrections = report.corrections.len(),
        "counter reconciliation finished"
    );

    let app = with_marketplace_routes(marketplace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "campus job marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}
