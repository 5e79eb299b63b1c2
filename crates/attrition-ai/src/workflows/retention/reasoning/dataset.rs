use super::ReasoningError;
use std::collections::HashMap;
use std::io::Read;

/// Column holding the leaver/stayer label.
pub const ATTRITION_COLUMN: &str = "Attrition";

/// Identifier and constant columns that carry no signal.
pub const ADMINISTRATIVE_COLUMNS: [&str; 4] =
    ["EmployeeCount", "EmployeeNumber", "StandardHours", "Over18"];

/// Historical HR records with every feature column encoded to numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalDataset {
    columns: Vec<EncodedColumn>,
    attrition: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedColumn {
    pub(crate) name: String,
    pub(crate) values: Vec<f64>,
}

impl HistoricalDataset {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReasoningError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let attrition_index = headers
            .iter()
            .position(|header| header == ATTRITION_COLUMN)
            .ok_or(ReasoningError::MissingAttritionColumn)?;

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut attrition = Vec::new();

        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let label = record.get(attrition_index).unwrap_or_default();
            attrition.push(parse_attrition(label).ok_or_else(|| {
                ReasoningError::InvalidAttrition {
                    row: index + 1,
                    value: label.to_string(),
                }
            })?);

            for (column, value) in raw.iter_mut().zip(record.iter()) {
                column.push(value.to_string());
            }
        }

        let columns = headers
            .iter()
            .zip(raw)
            .enumerate()
            .filter(|(index, (name, _))| {
                *index != attrition_index && !ADMINISTRATIVE_COLUMNS.contains(name)
            })
            .map(|(_, (name, values))| EncodedColumn {
                name: name.to_string(),
                values: encode_column(&values),
            })
            .collect();

        Ok(Self { columns, attrition })
    }

    pub fn len(&self) -> usize {
        self.attrition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrition.is_empty()
    }

    pub fn leaver_count(&self) -> usize {
        self.attrition.iter().filter(|left| **left).count()
    }

    pub fn stayer_count(&self) -> usize {
        self.len() - self.leaver_count()
    }

    /// Feature column names in file order, excluding the label and dropped columns.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub(crate) fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    pub(crate) fn attrition(&self) -> &[bool] {
        &self.attrition
    }

    #[cfg(test)]
    pub(crate) fn column_for_tests(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }
}

fn parse_attrition(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "1" | "true" => Some(true),
        "no" | "0" | "false" => Some(false),
        _ => None,
    }
}

/// Numeric columns pass through; anything else gets codes in first-seen order.
fn encode_column(values: &[String]) -> Vec<f64> {
    let parsed: Option<Vec<f64>> = values
        .iter()
        .map(|value| value.parse::<f64>().ok())
        .collect();

    if let Some(numbers) = parsed {
        return numbers;
    }

    let mut codes: HashMap<&str, usize> = HashMap::new();
    values
        .iter()
        .map(|value| {
            let next = codes.len();
            *codes.entry(value.as_str()).or_insert(next) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn categorical_columns_use_first_seen_codes() {
        let csv = "Attrition,OverTime,Department\n\
Yes,Yes,Sales\n\
No,No,Research & Development\n\
No,Yes,Human Resources\n\
Yes,No,Sales\n";
        let dataset = HistoricalDataset::from_reader(Cursor::new(csv)).expect("parses");

        assert_eq!(
            dataset.column_for_tests("OverTime"),
            Some(&[0.0, 1.0, 0.0, 1.0][..])
        );
        assert_eq!(
            dataset.column_for_tests("Department"),
            Some(&[0.0, 1.0, 2.0, 0.0][..])
        );
        assert_eq!(dataset.leaver_count(), 2);
        assert_eq!(dataset.stayer_count(), 2);
    }

    #[test]
    fn administrative_and_label_columns_are_dropped() {
        let csv = "Age,Attrition,EmployeeCount,EmployeeNumber,Over18,StandardHours,JobLevel\n\
41,Yes,1,1,Y,80,2\n";
        let dataset = HistoricalDataset::from_reader(Cursor::new(csv)).expect("parses");

        let names: Vec<&str> = dataset.feature_names().collect();
        assert_eq!(names, ["Age", "JobLevel"]);
    }

    #[test]
    fn numeric_labels_are_accepted() {
        let csv = "Attrition,Age\n1,30\n0,40\n";
        let dataset = HistoricalDataset::from_reader(Cursor::new(csv)).expect("parses");
        assert_eq!(dataset.attrition(), &[true, false]);
    }

    #[test]
    fn unknown_attrition_label_is_an_error() {
        let csv = "Attrition,Age\nMaybe,30\n";
        let error = HistoricalDataset::from_reader(Cursor::new(csv)).expect_err("bad label");
        match error {
            ReasoningError::InvalidAttrition { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value, "Maybe");
            }
            other => panic!("expected invalid attrition, got {other:?}"),
        }
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let error = HistoricalDataset::from_reader(Cursor::new("Age,JobLevel\n30,1\n"))
            .expect_err("no label column");
        assert!(matches!(error, ReasoningError::MissingAttritionColumn));
    }
}
