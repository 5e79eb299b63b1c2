//! Pre-trained predictive models.
//!
//! The service only depends on [`Predictor`]. [`LinearModel`] reads a JSON artifact holding
//! the feature order, coefficients, and intercept of an exported linear or logistic model.

use super::features::EmployeeRecord;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// Features the model reads, in training order.
    fn feature_names(&self) -> &[String];

    fn predict(&self, record: &EmployeeRecord) -> Result<f64, ModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model '{model}' has {features} features but {coefficients} coefficients")]
    ShapeMismatch {
        model: String,
        features: usize,
        coefficients: usize,
    },
    #[error("model '{model}' requires feature '{feature}'")]
    MissingFeature { model: String, feature: String },
    #[error("model '{model}' produced a non-finite prediction")]
    NonFinite { model: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Logistic model returning the binary label 0 or 1.
    Classifier,
    /// Linear model returning a rating.
    Regressor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub name: String,
    pub kind: ModelKind,
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Probability at or above which a classifier predicts 1.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Inclusive bounds a regressor's rounded output is clamped to.
    #[serde(default)]
    pub output_range: Option<(f64, f64)>,
}

impl LinearModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let model: LinearModel = serde_json::from_reader(reader)?;
        model.validate()
    }

    pub fn validate(self) -> Result<Self, ModelError> {
        if self.features.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                model: self.name,
                features: self.features.len(),
                coefficients: self.coefficients.len(),
            });
        }
        Ok(self)
    }

    fn linear_score(&self, record: &EmployeeRecord) -> Result<f64, ModelError> {
        let mut score = self.intercept;
        for (feature, weight) in self.features.iter().zip(&self.coefficients) {
            let value = record
                .get(feature)
                .ok_or_else(|| ModelError::MissingFeature {
                    model: self.name.clone(),
                    feature: feature.clone(),
                })?;
            score += weight * value;
        }
        Ok(score)
    }
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

impl Predictor for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, record: &EmployeeRecord) -> Result<f64, ModelError> {
        let score = self.linear_score(record)?;
        if !score.is_finite() {
            return Err(ModelError::NonFinite {
                model: self.name.clone(),
            });
        }

        let prediction = match self.kind {
            ModelKind::Classifier => {
                let threshold = self.threshold.unwrap_or(0.5);
                if sigmoid(score) >= threshold {
                    1.0
                } else {
                    0.0
                }
            }
            ModelKind::Regressor => {
                let rounded = score.round();
                match self.output_range {
                    Some((low, high)) => rounded.clamp(low, high),
                    None => rounded,
                }
            }
        };

        Ok(prediction)
    }
}
