use serde::{Deserialize, Serialize};
use std::fmt;

/// Ratings at or above this value count as high performance.
pub const DEFAULT_HIGH_PERFORMER_CUTOFF: f64 = 3.0;

/// Which set of risk flags the classifier assigns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPolicy {
    /// Three flags; performance only matters once attrition is predicted.
    #[default]
    Coarse,
    /// Four flags covering every attrition and performance combination.
    Detailed,
}

impl RiskPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coarse" | "a" => Some(Self::Coarse),
            "detailed" | "fine" | "b" => Some(Self::Detailed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskPolicy::Coarse => "coarse",
            RiskPolicy::Detailed => "detailed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    NoImmediateRisk,
    LikelyToLeave,
    HighPerformerAtRisk,
    RetainHighPerformer,
    LowPerformerLeaving,
    Healthy,
    ImprovementPlan,
}

impl RiskFlag {
    pub fn label(self) -> &'static str {
        match self {
            RiskFlag::NoImmediateRisk => "No immediate attrition risk",
            RiskFlag::LikelyToLeave => "Likely to leave",
            RiskFlag::HighPerformerAtRisk => "High-performing employee at risk",
            RiskFlag::RetainHighPerformer => "Retain (high performer leaving)",
            RiskFlag::LowPerformerLeaving => "Low performer leaving",
            RiskFlag::Healthy => "Healthy (high performer staying)",
            RiskFlag::ImprovementPlan => "Consider improvement plan (low performer staying)",
        }
    }

    /// Retention recommendation carried by the detailed flags.
    pub fn recommendation(self) -> Option<&'static str> {
        match self {
            RiskFlag::RetainHighPerformer => Some(
                "Prioritise a retention conversation and review compensation and growth path.",
            ),
            RiskFlag::LowPerformerLeaving => {
                Some("Plan knowledge transfer and backfill; retention effort is optional.")
            }
            RiskFlag::Healthy => {
                Some("Keep engaged with recognition and development opportunities.")
            }
            RiskFlag::ImprovementPlan => {
                Some("Agree on a performance improvement plan with clear goals.")
            }
            RiskFlag::NoImmediateRisk | RiskFlag::LikelyToLeave | RiskFlag::HighPerformerAtRisk => {
                None
            }
        }
    }

    /// Whether the flag calls for a warning rather than a success notice.
    pub fn is_warning(self) -> bool {
        !matches!(self, RiskFlag::NoImmediateRisk | RiskFlag::Healthy)
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a predicted attrition flag and performance rating to a risk flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskClassifier {
    policy: RiskPolicy,
    high_performer_cutoff: f64,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(RiskPolicy::Coarse, DEFAULT_HIGH_PERFORMER_CUTOFF)
    }
}

impl RiskClassifier {
    pub fn new(policy: RiskPolicy, high_performer_cutoff: f64) -> Self {
        Self {
            policy,
            high_performer_cutoff,
        }
    }

    pub fn policy(&self) -> RiskPolicy {
        self.policy
    }

    /// `attrition` is the model's binary label where 1 means leaving.
    pub fn classify(&self, attrition: u8, performance: f64) -> RiskFlag {
        let leaving = attrition == 1;
        let high_performer = performance >= self.high_performer_cutoff;

        match self.policy {
            RiskPolicy::Coarse => {
                if leaving && high_performer {
                    RiskFlag::HighPerformerAtRisk
                } else if leaving {
                    RiskFlag::LikelyToLeave
                } else {
                    RiskFlag::NoImmediateRisk
                }
            }
            RiskPolicy::Detailed => match (leaving, high_performer) {
                (true, true) => RiskFlag::RetainHighPerformer,
                (true, false) => RiskFlag::LowPerformerLeaving,
                (false, true) => RiskFlag::Healthy,
                (false, false) => RiskFlag::ImprovementPlan,
            },
        }
    }
}
