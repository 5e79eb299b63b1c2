//! Attrition and performance risk analysis.
//!
//! The crate turns employee attributes into model-ready feature records, runs the
//! configured attrition and performance models, and explains each prediction with
//! suggestions derived from a historical HR dataset.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
