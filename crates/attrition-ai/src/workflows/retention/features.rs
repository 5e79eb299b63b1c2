use super::encoding::{CategoryField, InvalidCategory};
use serde::{Deserialize, Serialize};

/// Inputs of the attrition model, in the order the model was trained on.
pub const ATTRITION_FEATURES: [&str; 29] = [
    "Age",
    "BusinessTravel",
    "DailyRate",
    "Department",
    "DistanceFromHome",
    "Education",
    "EducationField",
    "EnvironmentSatisfaction",
    "Gender",
    "HourlyRate",
    "JobInvolvement",
    "JobLevel",
    "JobRole",
    "JobSatisfaction",
    "MaritalStatus",
    "MonthlyIncome",
    "MonthlyRate",
    "NumCompaniesWorked",
    "OverTime",
    "PercentSalaryHike",
    "RelationshipSatisfaction",
    "StockOptionLevel",
    "TotalWorkingYears",
    "TrainingTimesLastYear",
    "WorkLifeBalance",
    "YearsAtCompany",
    "YearsInCurrentRole",
    "YearsSinceLastPromotion",
    "YearsWithCurrManager",
];

/// Inputs of the performance model paired with the attrition column each one is read from.
pub const PERFORMANCE_FEATURES: [(&str, &str); 7] = [
    ("EmpEnvironmentSatisfaction", "EnvironmentSatisfaction"),
    ("EmpLastSalaryHikePercent", "PercentSalaryHike"),
    ("EmpWorkLifeBalance", "WorkLifeBalance"),
    ("ExperienceYearsAtThisCompany", "YearsAtCompany"),
    ("YearsWithCurrManager", "YearsWithCurrManager"),
    ("ExperienceYearsInCurrentRole", "YearsInCurrentRole"),
    ("YearsSinceLastPromotion", "YearsSinceLastPromotion"),
];

/// Ordered feature name to value mapping handed to a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeRecord {
    entries: Vec<(String, f64)>,
}

impl EmployeeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name`, keeping the position of an existing entry.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for EmployeeRecord {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut record = EmployeeRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Accepted bounds and dashboard default of a numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumericRange {
    pub feature: &'static str,
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl NumericRange {
    const fn new(feature: &'static str, min: u32, max: u32, default: u32) -> Self {
        Self {
            feature,
            min,
            max,
            default,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= f64::from(self.min) && value <= f64::from(self.max)
    }
}

/// Bounds of every numeric attribute, in attrition model order.
pub const NUMERIC_RANGES: [NumericRange; 22] = [
    NumericRange::new("Age", 18, 60, 34),
    NumericRange::new("DailyRate", 100, 1500, 800),
    NumericRange::new("DistanceFromHome", 1, 30, 4),
    NumericRange::new("Education", 1, 5, 3),
    NumericRange::new("EnvironmentSatisfaction", 1, 4, 2),
    NumericRange::new("HourlyRate", 40, 100, 70),
    NumericRange::new("JobInvolvement", 1, 4, 3),
    NumericRange::new("JobLevel", 1, 5, 2),
    NumericRange::new("JobSatisfaction", 1, 4, 3),
    NumericRange::new("MonthlyIncome", 1000, 20_000, 6500),
    NumericRange::new("MonthlyRate", 1000, 30_000, 14_000),
    NumericRange::new("NumCompaniesWorked", 0, 10, 2),
    NumericRange::new("PercentSalaryHike", 10, 30, 15),
    NumericRange::new("RelationshipSatisfaction", 1, 4, 2),
    NumericRange::new("StockOptionLevel", 0, 3, 1),
    NumericRange::new("TotalWorkingYears", 0, 40, 10),
    NumericRange::new("TrainingTimesLastYear", 0, 6, 3),
    NumericRange::new("WorkLifeBalance", 1, 4, 2),
    NumericRange::new("YearsAtCompany", 0, 40, 5),
    NumericRange::new("YearsInCurrentRole", 0, 20, 2),
    NumericRange::new("YearsSinceLastPromotion", 0, 15, 1),
    NumericRange::new("YearsWithCurrManager", 0, 20, 3),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{feature} must be between {min} and {max}, got {value}")]
pub struct OutOfRange {
    pub feature: &'static str,
    pub min: u32,
    pub max: u32,
    pub value: f64,
}

/// Rejects the first numeric attribute of `record` that falls outside its bounds.
///
/// Attributes absent from the record are not checked.
pub fn check_ranges(record: &EmployeeRecord) -> Result<(), OutOfRange> {
    for range in &NUMERIC_RANGES {
        match record.get(range.feature) {
            Some(value) if !range.contains(value) => {
                return Err(OutOfRange {
                    feature: range.feature,
                    min: range.min,
                    max: range.max,
                    value,
                })
            }
            _ => {}
        }
    }
    Ok(())
}

/// Builds the performance model input from an attrition-shaped record.
///
/// Returns the name of the first attrition column that is missing.
pub fn performance_record(attrition: &EmployeeRecord) -> Result<EmployeeRecord, &'static str> {
    PERFORMANCE_FEATURES
        .iter()
        .map(|(target, source)| {
            attrition
                .get(source)
                .map(|value| (*target, value))
                .ok_or(*source)
        })
        .collect()
}

/// Human-entered employee attributes with categorical fields given as labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmployeeInput {
    pub age: u32,
    pub business_travel: String,
    pub daily_rate: u32,
    pub department: String,
    pub distance_from_home: u32,
    pub education: u32,
    pub education_field: String,
    pub environment_satisfaction: u32,
    pub gender: String,
    pub hourly_rate: u32,
    pub job_involvement: u32,
    pub job_level: u32,
    pub job_role: String,
    pub job_satisfaction: u32,
    pub marital_status: String,
    pub monthly_income: u32,
    pub monthly_rate: u32,
    pub num_companies_worked: u32,
    pub over_time: String,
    pub percent_salary_hike: u32,
    pub relationship_satisfaction: u32,
    pub stock_option_level: u32,
    pub total_working_years: u32,
    pub training_times_last_year: u32,
    pub work_life_balance: u32,
    pub years_at_company: u32,
    pub years_in_current_role: u32,
    pub years_since_last_promotion: u32,
    pub years_with_curr_manager: u32,
}

impl Default for EmployeeInput {
    fn default() -> Self {
        Self {
            age: 34,
            business_travel: "Travel_Rarely".to_string(),
            daily_rate: 800,
            department: "Sales".to_string(),
            distance_from_home: 4,
            education: 3,
            education_field: "Life Sciences".to_string(),
            environment_satisfaction: 2,
            gender: "Male".to_string(),
            hourly_rate: 70,
            job_involvement: 3,
            job_level: 2,
            job_role: "Sales Executive".to_string(),
            job_satisfaction: 3,
            marital_status: "Married".to_string(),
            monthly_income: 6500,
            monthly_rate: 14000,
            num_companies_worked: 2,
            over_time: "Yes".to_string(),
            percent_salary_hike: 15,
            relationship_satisfaction: 2,
            stock_option_level: 1,
            total_working_years: 10,
            training_times_last_year: 3,
            work_life_balance: 2,
            years_at_company: 5,
            years_in_current_role: 2,
            years_since_last_promotion: 1,
            years_with_curr_manager: 3,
        }
    }
}

impl EmployeeInput {
    /// Encodes the categorical labels and lays the values out as the attrition model expects.
    pub fn attrition_record(&self) -> Result<EmployeeRecord, InvalidCategory> {
        let encode = |field: CategoryField, label: &str| field.encode(label).map(|code| code as f64);
        let numeric = |value: u32| f64::from(value);

        let values = [
            numeric(self.age),
            encode(CategoryField::BusinessTravel, &self.business_travel)?,
            numeric(self.daily_rate),
            encode(CategoryField::Department, &self.department)?,
            numeric(self.distance_from_home),
            numeric(self.education),
            encode(CategoryField::EducationField, &self.education_field)?,
            numeric(self.environment_satisfaction),
            encode(CategoryField::Gender, &self.gender)?,
            numeric(self.hourly_rate),
            numeric(self.job_involvement),
            numeric(self.job_level),
            encode(CategoryField::JobRole, &self.job_role)?,
            numeric(self.job_satisfaction),
            encode(CategoryField::MaritalStatus, &self.marital_status)?,
            numeric(self.monthly_income),
            numeric(self.monthly_rate),
            numeric(self.num_companies_worked),
            encode(CategoryField::OverTime, &self.over_time)?,
            numeric(self.percent_salary_hike),
            numeric(self.relationship_satisfaction),
            numeric(self.stock_option_level),
            numeric(self.total_working_years),
            numeric(self.training_times_last_year),
            numeric(self.work_life_balance),
            numeric(self.years_at_company),
            numeric(self.years_in_current_role),
            numeric(self.years_since_last_promotion),
            numeric(self.years_with_curr_manager),
        ];

        Ok(ATTRITION_FEATURES.into_iter().zip(values).collect())
    }
}
