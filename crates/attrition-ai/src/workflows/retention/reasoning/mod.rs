//! Data-inferred retention reasoning.
//!
//! Compares every feature's mean between leavers and stayers in a historical dataset
//! and keeps the features whose gap exceeds the configured threshold.

mod dataset;

pub use dataset::{HistoricalDataset, ADMINISTRATIVE_COLUMNS, ATTRITION_COLUMN};

use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

/// Minimum absolute gap between leaver and stayer means for a feature to be reported.
pub const DEFAULT_REASONING_THRESHOLD: f64 = 0.2;

pub fn suggestion_for(feature: &str) -> String {
    format!(
        "Focus on improving or balancing '{feature}' to better align with retained employee characteristics."
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("failed to read historical dataset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid historical dataset CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("historical dataset has no 'Attrition' column")]
    MissingAttritionColumn,
    #[error("row {row}: '{value}' is not a valid attrition label")]
    InvalidAttrition { row: usize, value: String },
    #[error("reasoning threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
}

/// Thresholds must be finite and non-negative.
pub fn validate_threshold(threshold: f64) -> Result<f64, ReasoningError> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(threshold)
    } else {
        Err(ReasoningError::InvalidThreshold(threshold))
    }
}

/// A feature whose leaver mean differs noticeably from the stayer mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningEntry {
    pub feature: String,
    pub leaver_mean: f64,
    pub stayer_mean: f64,
    pub difference: f64,
    pub suggestion: String,
}

/// Immutable feature to suggestion lookup, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningTable {
    entries: Vec<ReasoningEntry>,
    index: HashMap<String, usize>,
}

impl ReasoningTable {
    pub fn build(dataset: &HistoricalDataset, threshold: f64) -> Self {
        let leavers = dataset.leaver_count();
        let stayers = dataset.stayer_count();
        if leavers == 0 || stayers == 0 {
            warn!(
                leavers,
                stayers, "historical dataset lacks one attrition group; no reasoning available"
            );
            return Self::default();
        }

        let mut table = Self::default();
        for column in dataset.columns() {
            let (leaver_mean, stayer_mean) = group_means(&column.values, dataset.attrition());
            let difference = leaver_mean - stayer_mean;
            if !difference.is_finite() || threshold.is_nan() || difference.abs() <= threshold {
                continue;
            }

            table.push(ReasoningEntry {
                feature: column.name.clone(),
                leaver_mean,
                stayer_mean,
                difference,
                suggestion: suggestion_for(&column.name),
            });
        }

        info!(
            rows = dataset.len(),
            leavers,
            stayers,
            entries = table.len(),
            threshold,
            "built retention reasoning table"
        );
        table
    }

    pub fn from_reader<R: Read>(reader: R, threshold: f64) -> Result<Self, ReasoningError> {
        let threshold = validate_threshold(threshold)?;
        let dataset = HistoricalDataset::from_reader(reader)?;
        Ok(Self::build(&dataset, threshold))
    }

    pub fn from_path<P: AsRef<Path>>(path: P, threshold: f64) -> Result<Self, ReasoningError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ReasoningError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, threshold)
    }

    /// Table with hand-picked entries; the difference fields are left at zero.
    pub fn from_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for feature in features {
            let feature = feature.into();
            table.push(ReasoningEntry {
                suggestion: suggestion_for(&feature),
                feature,
                leaver_mean: 0.0,
                stayer_mean: 0.0,
                difference: 0.0,
            });
        }
        table
    }

    fn push(&mut self, entry: ReasoningEntry) {
        if self.index.contains_key(&entry.feature) {
            return;
        }
        self.index.insert(entry.feature.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn suggestion(&self, feature: &str) -> Option<&str> {
        self.index
            .get(feature)
            .map(|position| self.entries[*position].suggestion.as_str())
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.index.contains_key(feature)
    }

    pub fn entries(&self) -> &[ReasoningEntry] {
        &self.entries
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.feature.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn group_means(values: &[f64], attrition: &[bool]) -> (f64, f64) {
    let (mut leaver_sum, mut leaver_count) = (0.0, 0usize);
    let (mut stayer_sum, mut stayer_count) = (0.0, 0usize);

    for (value, left) in values.iter().zip(attrition) {
        if *left {
            leaver_sum += value;
            leaver_count += 1;
        } else {
            stayer_sum += value;
            stayer_count += 1;
        }
    }

    (
        leaver_sum / leaver_count as f64,
        stayer_sum / stayer_count as f64,
    )
}

/// Builds the reasoning table on first use and shares it for the rest of the process.
#[derive(Debug)]
pub struct ReasoningCache {
    source: PathBuf,
    threshold: f64,
    table: OnceLock<Arc<ReasoningTable>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl ReasoningCache {
    pub fn new(source: impl Into<PathBuf>, threshold: f64) -> Self {
        Self {
            source: source.into(),
            threshold,
            table: OnceLock::new(),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Cache that never touches the filesystem.
    pub fn preloaded(table: ReasoningTable) -> Self {
        let cache = Self::new(PathBuf::new(), DEFAULT_REASONING_THRESHOLD);
        let _ = cache.table.set(Arc::new(table));
        cache
    }

    pub fn get_or_build(&self) -> Result<Arc<ReasoningTable>, ReasoningError> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }

        // Callers racing on first use wait here; a failed build leaves the cache empty.
        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }

        let built = Arc::new(ReasoningTable::from_path(&self.source, self.threshold)?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::clone(self.table.get_or_init(|| built)))
    }

    /// Times the table was read from `source`; preloaded tables do not count.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn is_built(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DATASET: &str = "Age,Attrition,JobSatisfaction,OverTime,EmployeeCount,MonthlyIncome\n\
30,Yes,1,Yes,1,3000\n\
32,Yes,2,Yes,1,3200\n\
31,No,4,No,1,3000\n\
31,No,3,Yes,1,3200\n\
31,No,4,No,1,3100\n";

    fn table(csv: &str, threshold: f64) -> ReasoningTable {
        ReasoningTable::from_reader(Cursor::new(csv), threshold).expect("dataset parses")
    }

    #[test]
    fn keeps_only_features_above_threshold() {
        let table = table(DATASET, DEFAULT_REASONING_THRESHOLD);

        let features: Vec<&str> = table.features().collect();
        assert_eq!(features, ["JobSatisfaction", "OverTime"]);
        assert!(!table.contains("Age"));
        assert!(!table.contains("EmployeeCount"));
        assert!(!table.contains("Attrition"));

        let satisfaction = &table.entries()[0];
        assert_eq!(satisfaction.leaver_mean, 1.5);
        assert!(satisfaction.difference < -2.0);
        assert_eq!(
            table.suggestion("JobSatisfaction"),
            Some(
                "Focus on improving or balancing 'JobSatisfaction' to better align with retained employee characteristics."
            )
        );
    }

    #[test]
    fn difference_equal_to_threshold_is_excluded() {
        let csv = "Attrition,Score,Tenure\nYes,3.5,1\nYes,3.5,1\nNo,3,2\nNo,3,2\n";

        let at_boundary = table(csv, 0.5);
        assert!(!at_boundary.contains("Score"));
        assert!(at_boundary.contains("Tenure"));

        let below_boundary = table(csv, 0.25);
        assert!(below_boundary.contains("Score"));
    }

    #[test]
    fn rebuilding_from_same_dataset_is_identical() {
        assert_eq!(
            table(DATASET, DEFAULT_REASONING_THRESHOLD),
            table(DATASET, DEFAULT_REASONING_THRESHOLD)
        );
    }

    #[test]
    fn dataset_without_leavers_yields_empty_table() {
        let csv = "Attrition,JobSatisfaction\nNo,1\nNo,4\n";
        assert!(table(csv, DEFAULT_REASONING_THRESHOLD).is_empty());

        let csv = "Attrition,JobSatisfaction\nYes,1\nYes,4\n";
        assert!(table(csv, DEFAULT_REASONING_THRESHOLD).is_empty());

        assert!(table("Attrition,JobSatisfaction\n", DEFAULT_REASONING_THRESHOLD).is_empty());
    }

    #[test]
    fn from_path_reports_missing_file() {
        let error = ReasoningTable::from_path("./does-not-exist.csv", DEFAULT_REASONING_THRESHOLD)
            .expect_err("file is missing");
        assert!(matches!(error, ReasoningError::Io { .. }));
    }

    #[test]
    fn cache_returns_shared_table() {
        let cache = ReasoningCache::preloaded(ReasoningTable::from_features(["OverTime"]));
        assert!(cache.is_built());

        let first = cache.get_or_build().expect("preloaded");
        let second = cache.get_or_build().expect("preloaded");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.contains("OverTime"));
    }

    #[test]
    fn nan_or_negative_threshold_is_rejected() {
        let csv = "Attrition,Same\nYes,1\nNo,1\n";
        for threshold in [f64::NAN, f64::INFINITY, -0.1] {
            let error = ReasoningTable::from_reader(Cursor::new(csv), threshold)
                .expect_err("threshold is invalid");
            assert!(matches!(error, ReasoningError::InvalidThreshold(_)));
        }

        let dataset = HistoricalDataset::from_reader(Cursor::new(csv)).expect("dataset parses");
        assert!(ReasoningTable::build(&dataset, f64::NAN).is_empty());
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let path = std::env::temp_dir().join(format!(
            "attrition-reasoning-{}-concurrent.csv",
            std::process::id()
        ));
        std::fs::write(&path, DATASET).expect("fixture written");

        let cache = ReasoningCache::new(&path, DEFAULT_REASONING_THRESHOLD);
        let barrier = std::sync::Barrier::new(8);
        let tables: Vec<Arc<ReasoningTable>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get_or_build().expect("dataset readable")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread finished"))
                .collect()
        });
        let _ = std::fs::remove_file(&path);

        assert_eq!(cache.build_count(), 1);
        assert!(tables.iter().all(|table| Arc::ptr_eq(table, &tables[0])));
    }

    #[test]
    fn cache_surfaces_build_errors_without_caching() {
        let cache = ReasoningCache::new("./does-not-exist.csv", DEFAULT_REASONING_THRESHOLD);
        assert!(cache.get_or_build().is_err());
        assert!(!cache.is_built());
    }
}
