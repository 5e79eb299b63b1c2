use std::io::Read;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::bulk::{BulkError, BulkPrediction, BulkRowPrediction, BulkUpload};
use super::config::RetentionConfig;
use super::encoding::InvalidCategory;
use super::explain::{explain, explain_features, Explanation, NO_CLEAR_RISKS};
use super::features::{
    check_ranges, performance_record, EmployeeInput, EmployeeRecord, OutOfRange,
};
use super::model::{ModelError, Predictor};
use super::reasoning::{ReasoningCache, ReasoningError, ReasoningTable};
use super::risk::{RiskClassifier, RiskFlag, RiskPolicy};

/// Service composing the category encoder, both models, the reasoning table, and the
/// risk classifier.
pub struct RetentionService<A, P> {
    attrition_model: Arc<A>,
    performance_model: Arc<P>,
    reasoning: Arc<ReasoningCache>,
    classifier: RiskClassifier,
    config: RetentionConfig,
}

/// Result of a single-employee prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinglePrediction {
    pub attrition: u8,
    pub attrition_label: &'static str,
    pub performance: f64,
    pub risk_flag: RiskFlag,
    pub risk_label: &'static str,
    pub warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<&'static str>,
    #[serde(flatten)]
    pub explanation: Explanation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'static str>,
}

impl<A, P> RetentionService<A, P>
where
    A: Predictor + 'static,
    P: Predictor + 'static,
{
    pub fn new(
        attrition_model: Arc<A>,
        performance_model: Arc<P>,
        reasoning: Arc<ReasoningCache>,
        config: RetentionConfig,
    ) -> Self {
        let classifier = RiskClassifier::new(config.risk_policy, config.high_performer_cutoff);
        Self {
            attrition_model,
            performance_model,
            reasoning,
            classifier,
            config,
        }
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Shared reasoning table, built on the first call.
    pub fn reasoning_table(&self) -> Result<Arc<ReasoningTable>, PredictionError> {
        Ok(self.reasoning.get_or_build()?)
    }

    /// Encode, range-check, predict, classify, and explain one employee.
    pub fn predict_single(
        &self,
        input: &EmployeeInput,
    ) -> Result<SinglePrediction, PredictionError> {
        let attrition_record = input.attrition_record()?;
        check_ranges(&attrition_record)?;
        let performance_input = performance_record(&attrition_record)
            .map_err(|feature| ModelError::MissingFeature {
                model: self.performance_model.name().to_string(),
                feature: feature.to_string(),
            })?;

        let (attrition, performance) =
            self.predict_records(&attrition_record, &performance_input)?;
        let table = self.reasoning_table()?;
        let explanation = explain(&attrition_record, &table);
        let risk_flag = self.classifier.classify(attrition, performance);

        debug!(
            attrition,
            performance,
            risk = risk_flag.label(),
            reasons = explanation.reasons.len(),
            "single prediction"
        );

        Ok(SinglePrediction {
            attrition,
            attrition_label: if attrition == 1 { "Yes" } else { "No" },
            performance,
            risk_flag,
            risk_label: risk_flag.label(),
            warning: risk_flag.is_warning(),
            recommendation: risk_flag.recommendation(),
            summary: explanation.is_empty().then_some(NO_CLEAR_RISKS),
            explanation,
        })
    }

    /// Run both models; the attrition output is reduced to its binary label.
    pub fn predict_records(
        &self,
        attrition_record: &EmployeeRecord,
        performance_record: &EmployeeRecord,
    ) -> Result<(u8, f64), PredictionError> {
        let attrition = self.attrition_model.predict(attrition_record)?;
        let performance = self.performance_model.predict(performance_record)?;
        Ok((u8::from(attrition >= 0.5), performance))
    }

    /// Predict every row of an uploaded CSV; any malformed row fails the batch.
    pub fn predict_bulk<R: Read>(&self, reader: R) -> Result<BulkPrediction, PredictionError> {
        let upload = BulkUpload::from_reader(reader, self.config.max_upload_rows)?;
        let table = self.reasoning_table()?;

        let mut rows = Vec::with_capacity(upload.len());
        for (index, row) in upload.rows().iter().enumerate() {
            let (attrition, performance) =
                self.predict_records(&row.attrition, &row.performance)?;
            let risk_flag = self.classifier.classify(attrition, performance);
            let explanation =
                explain_features(upload.columns().iter().map(String::as_str), &table);

            rows.push(BulkRowPrediction {
                row: index + 1,
                attrition_prediction: attrition,
                performance_prediction: performance,
                risk_flag,
                risk_label: risk_flag.label(),
                recommendation: risk_flag.recommendation(),
                explanation,
                values: row.values.clone(),
            });
        }

        let at_risk = rows.iter().filter(|row| row.attrition_prediction == 1).count();
        info!(rows = rows.len(), at_risk, "bulk prediction completed");

        Ok(BulkPrediction {
            generated_at: Utc::now(),
            columns: upload.columns().to_vec(),
            rows,
            include_recommendation: self.classifier.policy() == RiskPolicy::Detailed,
        })
    }
}

/// Error raised by the retention service.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Category(#[from] InvalidCategory),
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
    #[error(transparent)]
    Bulk(#[from] BulkError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
}

impl PredictionError {
    /// Whether the caller supplied bad input, as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictionError::Category(_) | PredictionError::OutOfRange(_) | PredictionError::Bulk(_)
        )
    }
}
