use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::bulk::EXPORT_FILE_NAME;
use super::encoding::category_catalog;
use super::features::{EmployeeInput, NUMERIC_RANGES};
use super::model::Predictor;
use super::service::{PredictionError, RetentionService};

/// Router builder exposing prediction, reasoning, category, and numeric range endpoints.
pub fn retention_router<A, P>(service: Arc<RetentionService<A, P>>) -> Router
where
    A: Predictor + 'static,
    P: Predictor + 'static,
{
    Router::new()
        .route("/api/v1/predictions", post(predict_handler::<A, P>))
        .route("/api/v1/predictions/bulk", post(bulk_handler::<A, P>))
        .route("/api/v1/reasoning", get(reasoning_handler::<A, P>))
        .route("/api/v1/categories", get(categories_handler))
        .route("/api/v1/ranges", get(ranges_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BulkQuery {
    #[serde(default)]
    pub(crate) format: BulkFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum BulkFormat {
    #[default]
    Csv,
    Json,
}

pub(crate) async fn predict_handler<A, P>(
    State(service): State<Arc<RetentionService<A, P>>>,
    Json(input): Json<EmployeeInput>,
) -> Response
where
    A: Predictor + 'static,
    P: Predictor + 'static,
{
    match service.predict_single(&input) {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_handler<A, P>(
    State(service): State<Arc<RetentionService<A, P>>>,
    Query(query): Query<BulkQuery>,
    body: Bytes,
) -> Response
where
    A: Predictor + 'static,
    P: Predictor + 'static,
{
    let prediction = match service.predict_bulk(Cursor::new(body)) {
        Ok(prediction) => prediction,
        Err(error) => return error_response(error),
    };

    if query.format == BulkFormat::Json {
        return (StatusCode::OK, Json(prediction)).into_response();
    }

    match prediction.to_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(error) => {
            let payload = json!({ "error": format!("failed to export predictions: {error}") });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn reasoning_handler<A, P>(
    State(service): State<Arc<RetentionService<A, P>>>,
) -> Response
where
    A: Predictor + 'static,
    P: Predictor + 'static,
{
    match service.reasoning_table() {
        Ok(table) => {
            let payload = json!({
                "threshold": service.config().reasoning_threshold,
                "entries": table.entries(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn categories_handler() -> Response {
    (StatusCode::OK, Json(category_catalog())).into_response()
}

pub(crate) async fn ranges_handler() -> Response {
    (StatusCode::OK, Json(NUMERIC_RANGES)).into_response()
}

fn error_response(error: PredictionError) -> Response {
    let status = if error.is_client_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        warn!(%error, "prediction failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
