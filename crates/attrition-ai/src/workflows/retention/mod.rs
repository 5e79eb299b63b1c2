//! Attrition and performance risk analysis for single employees and uploaded batches.
//!
//! Categorical labels are encoded for the models, both predictions are classified into a
//! risk flag, and every prediction is explained with the features that historically
//! separate leavers from stayers.

pub mod bulk;
pub mod config;
pub mod encoding;
pub mod explain;
pub mod features;
pub mod model;
pub mod reasoning;
pub mod risk;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use bulk::{BulkError, BulkPrediction, BulkRowPrediction, BulkUpload, EXPORT_FILE_NAME};
pub use config::RetentionConfig;
pub use encoding::{category_catalog, CategoryField, CategoryMapView, InvalidCategory};
pub use explain::{explain, explain_features, Explanation, LIST_SEPARATOR, NO_CLEAR_RISKS};
pub use features::{
    check_ranges, performance_record, EmployeeInput, EmployeeRecord, NumericRange, OutOfRange,
    ATTRITION_FEATURES, NUMERIC_RANGES, PERFORMANCE_FEATURES,
};
pub use model::{LinearModel, ModelError, ModelKind, Predictor};
pub use reasoning::{
    validate_threshold, HistoricalDataset, ReasoningCache, ReasoningEntry, ReasoningError,
    ReasoningTable, DEFAULT_REASONING_THRESHOLD,
};
pub use risk::{RiskClassifier, RiskFlag, RiskPolicy, DEFAULT_HIGH_PERFORMER_CUTOFF};
pub use router::retention_router;
pub use service::{PredictionError, RetentionService, SinglePrediction};
