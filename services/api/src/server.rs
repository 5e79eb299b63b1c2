use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_retention_routes;
use attrition_ai::config::AppConfig;
use attrition_ai::error::AppError;
use attrition_ai::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(build_service(&config)?);

    let app = with_retention_routes(service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // The table is built off the runtime so the first request does not pay for it.
    let warmup = service.clone();
    let ready = readiness_flag.clone();
    tokio::task::spawn_blocking(move || {
        match warmup.reasoning_table() {
            Ok(table) => info!(features = table.len(), "reasoning table ready"),
            Err(error) => warn!(%error, "reasoning table unavailable; predictions will fail"),
        }
        ready.store(true, Ordering::Release);
    });

    info!(
        ?config.environment,
        %addr,
        policy = config.retention.risk_policy.label(),
        "attrition risk service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
