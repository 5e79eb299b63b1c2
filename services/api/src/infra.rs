use attrition_ai::config::AppConfig;
use attrition_ai::error::AppError;
use attrition_ai::workflows::retention::{
    LinearModel, ModelError, Predictor, ReasoningCache, RetentionService, ATTRITION_FEATURES,
    PERFORMANCE_FEATURES,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type LiveService = RetentionService<LinearModel, LinearModel>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads both model artifacts and prepares the lazily built reasoning table.
pub(crate) fn build_service(config: &AppConfig) -> Result<LiveService, AppError> {
    let artifacts = &config.artifacts;

    let attrition_model = LinearModel::from_path(&artifacts.attrition_model)?;
    ensure_features(&attrition_model, ATTRITION_FEATURES.iter().copied())?;

    let performance_model = LinearModel::from_path(&artifacts.performance_model)?;
    ensure_features(
        &performance_model,
        PERFORMANCE_FEATURES.iter().map(|(target, _)| *target),
    )?;

    info!(
        attrition_model = %artifacts.attrition_model.display(),
        performance_model = %artifacts.performance_model.display(),
        "model artifacts loaded"
    );

    let reasoning = ReasoningCache::new(
        artifacts.historical_dataset.clone(),
        config.retention.reasoning_threshold,
    );

    Ok(RetentionService::new(
        Arc::new(attrition_model),
        Arc::new(performance_model),
        Arc::new(reasoning),
        config.retention.clone(),
    ))
}

/// Every feature the model reads must be one the service can supply.
fn ensure_features<'a, I>(model: &dyn Predictor, available: I) -> Result<(), ModelError>
where
    I: Iterator<Item = &'a str> + Clone,
{
    for feature in model.feature_names() {
        if !available.clone().any(|name| name == feature) {
            return Err(ModelError::MissingFeature {
                model: model.name().to_string(),
                feature: feature.clone(),
            });
        }
    }
    Ok(())
}
