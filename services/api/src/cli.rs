use crate::commands::{
    run_bulk, run_predict, run_reasoning, BulkArgs, PredictArgs, ReasoningArgs,
};
use crate::server;
use attrition_ai::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Attrition Risk Analyzer",
    about = "Predict attrition and performance risk and explain it with historical patterns",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and dashboard (default command)
    Serve(ServeArgs),
    /// Predict risk for a single employee given on the command line
    Predict(Box<PredictArgs>),
    /// Predict risk for every row of an employee CSV
    Bulk(BulkArgs),
    /// Print the features that separate leavers from stayers
    Reasoning(ReasoningArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(*args),
        Command::Bulk(args) => run_bulk(args),
        Command::Reasoning(args) => run_reasoning(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["attrition-ai-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn predict_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "attrition-ai-api",
            "predict",
            "--over-time",
            "No",
            "--job-satisfaction",
            "4",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Predict(args)) => {
                let input = args.to_input();
                assert_eq!(input.over_time, "No");
                assert_eq!(input.job_satisfaction, 4);
                assert_eq!(input.age, 34);
            }
            other => panic!("expected predict command, got {other:?}"),
        }
    }

    #[test]
    fn reasoning_rejects_nan_threshold() {
        assert!(Cli::try_parse_from(["attrition-ai-api", "reasoning", "--threshold", "NaN"])
            .is_err());
        let cli = Cli::try_parse_from(["attrition-ai-api", "reasoning", "--threshold", "0.3"])
            .expect("parses");
        match cli.command {
            Some(Command::Reasoning(args)) => assert_eq!(args.threshold, Some(0.3)),
            other => panic!("expected reasoning command, got {other:?}"),
        }
    }

    #[test]
    fn bulk_requires_input() {
        assert!(Cli::try_parse_from(["attrition-ai-api", "bulk"]).is_err());
        let cli = Cli::try_parse_from(["attrition-ai-api", "bulk", "--input", "staff.csv"])
            .expect("parses");
        assert!(matches!(cli.command, Some(Command::Bulk(_))));
    }
}
