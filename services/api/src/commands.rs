use crate::infra::build_service;
use attrition_ai::config::AppConfig;
use attrition_ai::error::AppError;
use attrition_ai::workflows::retention::{
    validate_threshold, EmployeeInput, ReasoningTable, SinglePrediction, EXPORT_FILE_NAME,
    NO_CLEAR_RISKS,
};
use clap::Args;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Employee attributes; anything omitted keeps the dashboard default.
#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    #[arg(long)]
    pub(crate) age: Option<u32>,
    /// Non-Travel, Travel_Frequently, or Travel_Rarely
    #[arg(long)]
    pub(crate) business_travel: Option<String>,
    #[arg(long)]
    pub(crate) daily_rate: Option<u32>,
    /// Human Resources, Research & Development, or Sales
    #[arg(long)]
    pub(crate) department: Option<String>,
    #[arg(long)]
    pub(crate) distance_from_home: Option<u32>,
    #[arg(long)]
    pub(crate) education: Option<u32>,
    #[arg(long)]
    pub(crate) education_field: Option<String>,
    #[arg(long)]
    pub(crate) environment_satisfaction: Option<u32>,
    #[arg(long)]
    pub(crate) gender: Option<String>,
    #[arg(long)]
    pub(crate) hourly_rate: Option<u32>,
    #[arg(long)]
    pub(crate) job_involvement: Option<u32>,
    #[arg(long)]
    pub(crate) job_level: Option<u32>,
    #[arg(long)]
    pub(crate) job_role: Option<String>,
    #[arg(long)]
    pub(crate) job_satisfaction: Option<u32>,
    #[arg(long)]
    pub(crate) marital_status: Option<String>,
    #[arg(long)]
    pub(crate) monthly_income: Option<u32>,
    #[arg(long)]
    pub(crate) monthly_rate: Option<u32>,
    #[arg(long)]
    pub(crate) num_companies_worked: Option<u32>,
    /// Yes or No
    #[arg(long)]
    pub(crate) over_time: Option<String>,
    #[arg(long)]
    pub(crate) percent_salary_hike: Option<u32>,
    #[arg(long)]
    pub(crate) relationship_satisfaction: Option<u32>,
    #[arg(long)]
    pub(crate) stock_option_level: Option<u32>,
    #[arg(long)]
    pub(crate) total_working_years: Option<u32>,
    #[arg(long)]
    pub(crate) training_times_last_year: Option<u32>,
    #[arg(long)]
    pub(crate) work_life_balance: Option<u32>,
    #[arg(long)]
    pub(crate) years_at_company: Option<u32>,
    #[arg(long)]
    pub(crate) years_in_current_role: Option<u32>,
    #[arg(long)]
    pub(crate) years_since_last_promotion: Option<u32>,
    #[arg(long)]
    pub(crate) years_with_curr_manager: Option<u32>,
    /// Print the prediction as JSON instead of a readable summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl PredictArgs {
    pub(crate) fn to_input(&self) -> EmployeeInput {
        let mut input = EmployeeInput::default();

        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut input.age, &self.age);
        set(&mut input.business_travel, &self.business_travel);
        set(&mut input.daily_rate, &self.daily_rate);
        set(&mut input.department, &self.department);
        set(&mut input.distance_from_home, &self.distance_from_home);
        set(&mut input.education, &self.education);
        set(&mut input.education_field, &self.education_field);
        set(&mut input.environment_satisfaction, &self.environment_satisfaction);
        set(&mut input.gender, &self.gender);
        set(&mut input.hourly_rate, &self.hourly_rate);
        set(&mut input.job_involvement, &self.job_involvement);
        set(&mut input.job_level, &self.job_level);
        set(&mut input.job_role, &self.job_role);
        set(&mut input.job_satisfaction, &self.job_satisfaction);
        set(&mut input.marital_status, &self.marital_status);
        set(&mut input.monthly_income, &self.monthly_income);
        set(&mut input.monthly_rate, &self.monthly_rate);
        set(&mut input.num_companies_worked, &self.num_companies_worked);
        set(&mut input.over_time, &self.over_time);
        set(&mut input.percent_salary_hike, &self.percent_salary_hike);
        set(&mut input.relationship_satisfaction, &self.relationship_satisfaction);
        set(&mut input.stock_option_level, &self.stock_option_level);
        set(&mut input.total_working_years, &self.total_working_years);
        set(&mut input.training_times_last_year, &self.training_times_last_year);
        set(&mut input.work_life_balance, &self.work_life_balance);
        set(&mut input.years_at_company, &self.years_at_company);
        set(&mut input.years_in_current_role, &self.years_in_current_role);
        set(&mut input.years_since_last_promotion, &self.years_since_last_promotion);
        set(&mut input.years_with_curr_manager, &self.years_with_curr_manager);

        input
    }
}

#[derive(Args, Debug)]
pub(crate) struct BulkArgs {
    /// CSV file with one employee per row
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the annotated CSV
    #[arg(long, default_value = EXPORT_FILE_NAME)]
    pub(crate) output: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReasoningArgs {
    /// Override the configured historical dataset
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Override the configured mean-difference threshold
    #[arg(long, value_parser = parse_threshold)]
    pub(crate) threshold: Option<f64>,
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value = raw.trim().parse::<f64>().map_err(|err| err.to_string())?;
    validate_threshold(value).map_err(|err| err.to_string())
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config)?;
    let prediction = service.predict_single(&args.to_input())?;

    if args.json {
        match serde_json::to_string_pretty(&prediction) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Prediction payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_prediction(&prediction);
    Ok(())
}

fn render_prediction(prediction: &SinglePrediction) {
    println!("Employee risk assessment");
    println!("- Attrition prediction: {}", prediction.attrition_label);
    println!("- Performance rating: {}", prediction.performance);
    let marker = if prediction.warning { "!" } else { "ok" };
    println!("- Risk flag [{marker}]: {}", prediction.risk_label);
    if let Some(recommendation) = prediction.recommendation {
        println!("  Recommendation: {recommendation}");
    }

    if prediction.explanation.is_empty() {
        println!("\n{NO_CLEAR_RISKS}");
        return;
    }

    println!("\nReasons:");
    for reason in &prediction.explanation.reasons {
        println!("  - {reason}");
    }
    println!("Suggestions:");
    for suggestion in &prediction.explanation.suggestions {
        println!("  - {suggestion}");
    }
}

pub(crate) fn run_bulk(args: BulkArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config)?;

    let reader = BufReader::new(File::open(&args.input)?);
    let prediction = service.predict_bulk(reader)?;
    prediction.write_csv(File::create(&args.output)?)?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in prediction.risk_labels() {
        *counts.entry(label).or_default() += 1;
    }

    println!(
        "Scored {} employees from {}",
        prediction.rows.len(),
        args.input.display()
    );
    for (label, count) in counts {
        println!("  - {label}: {count}");
    }
    println!("Results written to {}", args.output.display());
    Ok(())
}

pub(crate) fn run_reasoning(args: ReasoningArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let dataset = args
        .dataset
        .unwrap_or_else(|| config.artifacts.historical_dataset.clone());
    let threshold = args
        .threshold
        .unwrap_or(config.retention.reasoning_threshold);

    let table = ReasoningTable::from_path(&dataset, threshold)?;
    if table.is_empty() {
        println!(
            "No feature separates leavers from stayers by more than {threshold} in {}",
            dataset.display()
        );
        return Ok(());
    }

    println!(
        "{} features separate leavers from stayers (threshold {threshold})",
        table.len()
    );
    for entry in table.entries() {
        println!(
            "  - {}: leavers {:.2} | stayers {:.2} | difference {:+.2}",
            entry.feature, entry.leaver_mean, entry.stayer_mean, entry.difference
        );
        println!("    {}", entry.suggestion);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_flags_keep_default_input() {
        assert_eq!(PredictArgs::default().to_input(), EmployeeInput::default());
    }

    #[test]
    fn threshold_must_be_finite_and_non_negative() {
        assert_eq!(parse_threshold("0.35"), Ok(0.35));
        assert_eq!(parse_threshold("0"), Ok(0.0));
        for raw in ["NaN", "inf", "-0.2", "wide"] {
            assert!(parse_threshold(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn supplied_flags_replace_defaults() {
        let args = PredictArgs {
            department: Some("Research & Development".to_string()),
            monthly_income: Some(12_000),
            ..PredictArgs::default()
        };

        let input = args.to_input();
        assert_eq!(input.department, "Research & Development");
        assert_eq!(input.monthly_income, 12_000);
        assert_eq!(input.over_time, EmployeeInput::default().over_time);
    }
}
