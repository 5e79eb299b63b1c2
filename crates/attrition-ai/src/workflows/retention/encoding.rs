use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical inputs the models expect as integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryField {
    BusinessTravel,
    Department,
    EducationField,
    JobRole,
    MaritalStatus,
    Gender,
    OverTime,
}

const BUSINESS_TRAVEL: &[(&str, i64)] = &[
    ("Non-Travel", 0),
    ("Travel_Rarely", 1),
    ("Travel_Frequently", 2),
];

const DEPARTMENT: &[(&str, i64)] = &[
    ("Human Resources", 0),
    ("Research & Development", 1),
    ("Sales", 2),
];

const EDUCATION_FIELD: &[(&str, i64)] = &[
    ("Human Resources", 0),
    ("Other", 1),
    ("Medical", 2),
    ("Marketing", 3),
    ("Life Sciences", 4),
    ("Technical Degree", 5),
];

const JOB_ROLE: &[(&str, i64)] = &[
    ("Human Resources", 0),
    ("Manufacturing Director", 1),
    ("Laboratory Technician", 2),
    ("Healthcare Representative", 3),
    ("Manager", 4),
    ("Research Director", 5),
    ("Sales Executive", 6),
    ("Research Scientist", 7),
    ("Sales Representative", 8),
];

const MARITAL_STATUS: &[(&str, i64)] = &[("Married", 0), ("Single", 1), ("Divorced", 2)];

const GENDER: &[(&str, i64)] = &[("Female", 0), ("Male", 1)];

const OVER_TIME: &[(&str, i64)] = &[("No", 0), ("Yes", 1)];

impl CategoryField {
    pub const ALL: [CategoryField; 7] = [
        CategoryField::BusinessTravel,
        CategoryField::Department,
        CategoryField::EducationField,
        CategoryField::JobRole,
        CategoryField::MaritalStatus,
        CategoryField::Gender,
        CategoryField::OverTime,
    ];

    /// Column name used in model inputs and CSV files.
    pub fn column(self) -> &'static str {
        match self {
            CategoryField::BusinessTravel => "BusinessTravel",
            CategoryField::Department => "Department",
            CategoryField::EducationField => "EducationField",
            CategoryField::JobRole => "JobRole",
            CategoryField::MaritalStatus => "MaritalStatus",
            CategoryField::Gender => "Gender",
            CategoryField::OverTime => "OverTime",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryField::BusinessTravel => "Business Travel",
            CategoryField::Department => "Department",
            CategoryField::EducationField => "Education Field",
            CategoryField::JobRole => "Job Role",
            CategoryField::MaritalStatus => "Marital Status",
            CategoryField::Gender => "Gender",
            CategoryField::OverTime => "OverTime",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.column() == name.trim())
    }

    fn table(self) -> &'static [(&'static str, i64)] {
        match self {
            CategoryField::BusinessTravel => BUSINESS_TRAVEL,
            CategoryField::Department => DEPARTMENT,
            CategoryField::EducationField => EDUCATION_FIELD,
            CategoryField::JobRole => JOB_ROLE,
            CategoryField::MaritalStatus => MARITAL_STATUS,
            CategoryField::Gender => GENDER,
            CategoryField::OverTime => OVER_TIME,
        }
    }

    /// Integer code for `label`. Unknown labels are rejected rather than defaulted.
    pub fn encode(self, label: &str) -> Result<i64, InvalidCategory> {
        let needle = label.trim();
        self.table()
            .iter()
            .find(|(candidate, _)| *candidate == needle)
            .map(|(_, code)| *code)
            .ok_or_else(|| InvalidCategory {
                field: self,
                label: label.to_string(),
            })
    }

    pub fn decode(self, code: i64) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(_, candidate)| *candidate == code)
            .map(|(label, _)| *label)
    }

    /// Known labels ordered by their code.
    pub fn labels(self) -> Vec<&'static str> {
        self.entries().into_iter().map(|(label, _)| label).collect()
    }

    fn entries(self) -> Vec<(&'static str, i64)> {
        let mut entries = self.table().to_vec();
        entries.sort_by_key(|(_, code)| *code);
        entries
    }
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a label is not part of the field's category map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{label}' is not a known {field} value")]
pub struct InvalidCategory {
    pub field: CategoryField,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryOption {
    pub label: &'static str,
    pub code: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryMapView {
    pub field: CategoryField,
    pub column: &'static str,
    pub label: &'static str,
    pub options: Vec<CategoryOption>,
}

/// Every category map, in the order the dashboard renders them.
pub fn category_catalog() -> Vec<CategoryMapView> {
    CategoryField::ALL
        .into_iter()
        .map(|field| CategoryMapView {
            field,
            column: field.column(),
            label: field.label(),
            options: field
                .entries()
                .into_iter()
                .map(|(label, code)| CategoryOption { label, code })
                .collect(),
        })
        .collect()
}
