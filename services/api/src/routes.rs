use crate::infra::AppState;
use attrition_ai::workflows::retention::{retention_router, Predictor, RetentionService};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json};
use serde_json::json;
use std::sync::Arc;

const DASHBOARD_HTML: &str = include_str!("../assets/index.html");

/// Static files served next to the dashboard page.
const ASSETS: [(&str, &str); 2] = [
    ("dashboard.js", include_str!("../assets/dashboard.js")),
    ("dashboard.css", include_str!("../assets/dashboard.css")),
];

pub(crate) fn with_retention_routes<A, P>(service: Arc<RetentionService<A, P>>) -> axum::Router
where
    A: Predictor + 'static,
    P: Predictor + 'static,
{
    retention_router(service)
        .route("/", get(dashboard))
        .route("/assets/:name", get(asset))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub(crate) async fn asset(Path(name): Path<String>) -> Response {
    match ASSETS.iter().find(|(asset, _)| *asset == name) {
        Some((asset, body)) => {
            let mime = mime_guess::from_path(asset).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.to_string())],
                *body,
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("asset '{name}' not found") })),
        )
            .into_response(),
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    fn static_routes(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/", get(dashboard))
            .route("/assets/:name", get(asset))
            .route("/ready", get(readiness_endpoint))
            .layer(Extension(state))
    }

    #[tokio::test]
    async fn dashboard_serves_html() {
        let response = static_routes(state(true))
            .oneshot(get_request("/"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn assets_carry_guessed_content_type() {
        let response = static_routes(state(true))
            .oneshot(get_request("/assets/dashboard.js"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.contains("javascript"), "got {content_type}");

        let missing = static_routes(state(true))
            .oneshot(get_request("/assets/secrets.env"))
            .await
            .expect("router responds");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let state = state(false);
        let app = static_routes(state.clone());

        let response = app
            .clone()
            .oneshot(get_request("/ready"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = app
            .oneshot(get_request("/ready"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
