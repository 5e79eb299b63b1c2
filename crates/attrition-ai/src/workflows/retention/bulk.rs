use super::encoding::{CategoryField, InvalidCategory};
use super::explain::Explanation;
use super::features::{
    performance_record, EmployeeRecord, ATTRITION_FEATURES, PERFORMANCE_FEATURES,
};
use super::risk::RiskFlag;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{Read, Write};

pub const ATTRITION_PREDICTION_COLUMN: &str = "Attrition_Prediction";
pub const PERFORMANCE_PREDICTION_COLUMN: &str = "Performance_Prediction";
pub const REASONS_COLUMN: &str = "Reasons";
pub const SUGGESTIONS_COLUMN: &str = "Suggestions";
pub const RISK_FLAG_COLUMN: &str = "Risk_Flag";
pub const RECOMMENDATION_COLUMN: &str = "Recommendation";

/// Columns appended to every exported row, in export order.
const OUTPUT_COLUMNS: [&str; 6] = [
    ATTRITION_PREDICTION_COLUMN,
    PERFORMANCE_PREDICTION_COLUMN,
    REASONS_COLUMN,
    SUGGESTIONS_COLUMN,
    RISK_FLAG_COLUMN,
    RECOMMENDATION_COLUMN,
];

pub const EXPORT_FILE_NAME: &str = "prediction_results.csv";

/// A malformed upload fails the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("invalid CSV upload: {0}")]
    Csv(#[from] csv::Error),
    #[error("upload is missing required column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: {source}")]
    Category {
        row: usize,
        #[source]
        source: InvalidCategory,
    },
    #[error("upload exceeds the limit of {limit} rows")]
    TooManyRows { limit: usize },
    #[error("upload contains no employee rows")]
    Empty,
}

/// Parsed upload with model-ready records for every row.
#[derive(Debug, Clone)]
pub struct BulkUpload {
    columns: Vec<String>,
    rows: Vec<UploadRow>,
}

#[derive(Debug, Clone)]
pub(crate) struct UploadRow {
    pub(crate) values: Vec<String>,
    pub(crate) attrition: EmployeeRecord,
    pub(crate) performance: EmployeeRecord,
}

impl BulkUpload {
    /// Categorical columns may hold labels or codes; every other model column must be numeric.
    pub fn from_reader<R: Read>(reader: R, max_rows: usize) -> Result<Self, BulkError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|header| header == name);

        let attrition_columns = ATTRITION_FEATURES
            .iter()
            .map(|name| {
                position(*name)
                    .map(|index| (*name, index))
                    .ok_or_else(|| BulkError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let performance_columns: Option<Vec<(&str, usize)>> = PERFORMANCE_FEATURES
            .iter()
            .map(|(name, _)| position(*name).map(|index| (*name, index)))
            .collect();

        // Earlier exports can be re-uploaded; their prediction columns are recomputed.
        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !OUTPUT_COLUMNS.contains(header))
            .map(|(index, _)| index)
            .collect();

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            if index >= max_rows {
                return Err(BulkError::TooManyRows { limit: max_rows });
            }
            let record = record?;
            let row = index + 1;

            let mut attrition = EmployeeRecord::new();
            for (name, column) in &attrition_columns {
                let value = record.get(*column).unwrap_or_default();
                attrition.insert(*name, parse_cell(row, name, value)?);
            }

            let performance = match &performance_columns {
                Some(columns) => {
                    let mut performance = EmployeeRecord::new();
                    for (name, column) in columns {
                        let value = record.get(*column).unwrap_or_default();
                        performance.insert(*name, parse_cell(row, name, value)?);
                    }
                    performance
                }
                None => performance_record(&attrition)
                    .map_err(|column| BulkError::MissingColumn(column.to_string()))?,
            };

            rows.push(UploadRow {
                values: kept
                    .iter()
                    .map(|column| record.get(*column).unwrap_or_default().to_string())
                    .collect(),
                attrition,
                performance,
            });
        }

        if rows.is_empty() {
            return Err(BulkError::Empty);
        }

        Ok(Self {
            columns: kept
                .iter()
                .map(|column| headers[*column].to_string())
                .collect(),
            rows,
        })
    }

    /// Uploaded column names carried into the export.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn rows(&self) -> &[UploadRow] {
        &self.rows
    }
}

fn parse_cell(row: usize, column: &str, value: &str) -> Result<f64, BulkError> {
    if let Some(field) = CategoryField::from_column(column) {
        return match value.parse::<f64>() {
            Ok(code) if code.fract() == 0.0 && field.decode(code as i64).is_some() => Ok(code),
            _ => field
                .encode(value)
                .map(|code| code as f64)
                .map_err(|source| BulkError::Category { row, source }),
        };
    }

    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| BulkError::NonNumeric {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Predictions and explanation for one uploaded row.
#[derive(Debug, Clone, Serialize)]
pub struct BulkRowPrediction {
    pub row: usize,
    pub attrition_prediction: u8,
    pub performance_prediction: f64,
    pub risk_flag: RiskFlag,
    pub risk_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<&'static str>,
    #[serde(flatten)]
    pub explanation: Explanation,
    #[serde(skip)]
    pub(crate) values: Vec<String>,
}

/// Whole-batch result, exportable as CSV.
#[derive(Debug, Clone, Serialize)]
pub struct BulkPrediction {
    pub generated_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub rows: Vec<BulkRowPrediction>,
    #[serde(skip)]
    pub(crate) include_recommendation: bool,
}

impl BulkPrediction {
    pub fn risk_labels(&self) -> Vec<&'static str> {
        self.rows.iter().map(|row| row.risk_label).collect()
    }

    /// Header row of the export: uploaded columns followed by the prediction columns.
    pub fn export_headers(&self) -> Vec<&str> {
        let appended = if self.include_recommendation {
            &OUTPUT_COLUMNS[..]
        } else {
            &OUTPUT_COLUMNS[..OUTPUT_COLUMNS.len() - 1]
        };
        self.columns
            .iter()
            .map(String::as_str)
            .chain(appended.iter().copied())
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.export_headers())?;

        for row in &self.rows {
            let mut record: Vec<String> = row.values.clone();
            record.push(row.attrition_prediction.to_string());
            record.push(row.performance_prediction.to_string());
            record.push(row.explanation.joined_reasons());
            record.push(row.explanation.joined_suggestions());
            record.push(row.risk_label.to_string());
            if self.include_recommendation {
                record.push(row.recommendation.unwrap_or_default().to_string());
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}
