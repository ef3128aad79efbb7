use crate::cli::ServeArgs;
use crate::infra::{AppState, Backoffice};
use crate::routes::with_app_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use civic_desk::config::AppConfig;
use civic_desk::error::AppError;
use civic_desk::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let backoffice = Backoffice::in_memory(&config.pricing);
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        fines: Arc::clone(&backoffice.fines),
        pricing: config.pricing.clone(),
    };

    let app = with_app_routes(&backoffice, config.office.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        office = %config.office.name,
        services = backoffice.catalog.list(None).len(),
        "civic desk back office ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
