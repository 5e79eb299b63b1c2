use super::reasoning::DEFAULT_REASONING_THRESHOLD;
use super::risk::{RiskPolicy, DEFAULT_HIGH_PERFORMER_CUTOFF};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UPLOAD_ROWS: usize = 5_000;

/// Tunables for reasoning, risk classification, and bulk uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub reasoning_threshold: f64,
    pub risk_policy: RiskPolicy,
    pub high_performer_cutoff: f64,
    pub max_upload_rows: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            reasoning_threshold: DEFAULT_REASONING_THRESHOLD,
            risk_policy: RiskPolicy::default(),
            high_performer_cutoff: DEFAULT_HIGH_PERFORMER_CUTOFF,
            max_upload_rows: DEFAULT_MAX_UPLOAD_ROWS,
        }
    }
}
