use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};

use crate::workflows::retention::features::{EmployeeRecord, ATTRITION_FEATURES};
use crate::workflows::retention::model::{ModelError, Predictor};
use crate::workflows::retention::reasoning::{
    ReasoningCache, ReasoningTable, DEFAULT_REASONING_THRESHOLD,
};
use crate::workflows::retention::{RetentionConfig, RetentionService, RiskPolicy};

/// Predicts whatever value the record holds for one feature.
pub(super) struct EchoPredictor {
    name: &'static str,
    features: Vec<String>,
}

impl EchoPredictor {
    pub(super) fn new(name: &'static str, feature: &str) -> Self {
        Self {
            name,
            features: vec![feature.to_string()],
        }
    }
}

impl Predictor for EchoPredictor {
    fn name(&self) -> &str {
        self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, record: &EmployeeRecord) -> Result<f64, ModelError> {
        let feature = &self.features[0];
        record
            .get(feature)
            .ok_or_else(|| ModelError::MissingFeature {
                model: self.name.to_string(),
                feature: feature.clone(),
            })
    }
}

pub(super) type EchoService = RetentionService<EchoPredictor, EchoPredictor>;

/// Leavers report low job satisfaction and work overtime; age does not separate the groups.
pub(super) const HISTORICAL_CSV: &str = "Age,Attrition,BusinessTravel,EmployeeCount,JobSatisfaction,OverTime,Over18\n\
34,Yes,Travel_Frequently,1,1,Yes,Y\n\
36,Yes,Travel_Rarely,1,2,Yes,Y\n\
35,No,Travel_Rarely,1,4,No,Y\n\
35,No,Travel_Rarely,1,3,No,Y\n\
35,No,Travel_Frequently,1,4,Yes,Y\n";

pub(super) fn historical_table() -> ReasoningTable {
    ReasoningTable::from_reader(Cursor::new(HISTORICAL_CSV), DEFAULT_REASONING_THRESHOLD)
        .expect("historical fixture parses")
}

/// Attrition echoes `OverTime`; performance echoes `EmpWorkLifeBalance`.
pub(super) fn service_with(table: ReasoningTable, policy: RiskPolicy) -> EchoService {
    RetentionService::new(
        Arc::new(EchoPredictor::new("attrition", "OverTime")),
        Arc::new(EchoPredictor::new("performance", "EmpWorkLifeBalance")),
        Arc::new(ReasoningCache::preloaded(table)),
        RetentionConfig {
            risk_policy: policy,
            ..RetentionConfig::default()
        },
    )
}

pub(super) fn service() -> EchoService {
    service_with(historical_table(), RiskPolicy::Coarse)
}

pub(super) fn upload_header() -> String {
    ATTRITION_FEATURES.join(",")
}

/// One upload row using human labels for the categorical columns.
pub(super) fn upload_row(over_time: &str, work_life_balance: u8) -> String {
    format!(
        "34,Travel_Rarely,800,Sales,4,3,Life Sciences,2,Male,70,3,2,Sales Executive,1,Single,6500,14000,2,{over_time},15,2,1,10,3,{work_life_balance},5,2,1,3"
    )
}

/// Rows yielding (attrition, performance) of (1, 4), (1, 2), and (0, 3).
pub(super) fn three_row_upload() -> String {
    format!(
        "{}\n{}\n{}\n{}\n",
        upload_header(),
        upload_row("Yes", 4),
        upload_row("Yes", 2),
        upload_row("No", 3)
    )
}

pub(super) fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn csv_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable")
        .to_vec()
}

pub(super) async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}
