use super::features::EmployeeRecord;
use super::reasoning::ReasoningTable;
use serde::Serialize;

/// Separator used when reasons or suggestions are flattened into one CSV cell.
pub const LIST_SEPARATOR: &str = " | ";

pub const NO_CLEAR_RISKS: &str = "No clear risks identified from historical patterns.";

/// Parallel reasons and suggestions for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub reasons: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Explanation {
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn joined_reasons(&self) -> String {
        self.reasons.join(LIST_SEPARATOR)
    }

    pub fn joined_suggestions(&self) -> String {
        self.suggestions.join(LIST_SEPARATOR)
    }
}

pub fn reason_for(feature: &str) -> String {
    format!("{feature} may be contributing to attrition based on historical data.")
}

/// Reports every feature found in the table, in the order the features are given.
pub fn explain_features<'a, I>(features: I, table: &ReasoningTable) -> Explanation
where
    I: IntoIterator<Item = &'a str>,
{
    let mut explanation = Explanation::default();
    for feature in features {
        if let Some(suggestion) = table.suggestion(feature) {
            explanation.reasons.push(reason_for(feature));
            explanation.suggestions.push(suggestion.to_string());
        }
    }
    explanation
}

pub fn explain(record: &EmployeeRecord, table: &ReasoningTable) -> Explanation {
    explain_features(record.feature_names(), table)
}
