use churnpred::{predict_json, Config, Label, ModelArtifact, PredictError};
use clap::Parser;
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "churnpred",
    version,
    about = "Predict customer churn for one feature vector",
    after_help = r#"INPUT is a JSON array of ten values, in order:
    CreditScore, Geography, Gender, Age, Tenure, Balance,
    NumOfProducts, HasCrCard, IsActiveMember, EstimatedSalary

Example:
    churnpred '[650,"France","Male",40,3,60000.0,2,1,1,50000.0]'"#
)]
struct Cli {
    /// JSON array of the ten feature values
    input: Option<String>,
    /// Model artifact to load (overrides the config file)
    #[arg(short, long, value_name = "PATH")]
    model: Option<PathBuf>,
    /// TOML config file [default: churnpred.toml if present]
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn run(args: Cli) -> Result<Label, PredictError> {
    let input = args.input.ok_or(PredictError::NoInput)?;
    let config = Config::load(args.config.as_deref())?;
    let model_path = config.model_path(args.model.as_deref());
    debug!("model path {}", model_path.display());

    let model = ModelArtifact::load(&model_path)?;
    predict_json(&model, &input)
}

fn usage_error(e: &clap::Error) -> String {
    let text = e.to_string();
    let line = text.lines().next().unwrap_or_default();
    format!("Error: {}", line.strip_prefix("error: ").unwrap_or(line))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            eprintln!("{}", usage_error(&e));
            return ExitCode::FAILURE;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    match run(args) {
        Ok(label) => {
            println!("Prediction: {}", label);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.diagnostic());
            ExitCode::FAILURE
        }
    }
}
