//! One-shot assessment from a JSON submission.
//!
//! Reads a submission object keyed by column name (`Year`, `Grade`, `Sex`, ...)
//! from a file argument or stdin, and prints the assessment as JSON.
//!
//! Exit status: 0 on success, 2 if the answers fail validation, 1 if the
//! prediction cannot be made.
//!
//! # Usage
//!
//! ```bash
//! echo '{"Year": "1 year", "Grade": 7, ...}' | cargo run --bin assess
//! cargo run --bin assess -- answers.json
//! ```

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use myopia_risk::adapters::artifact::FsArtifactStore;
use myopia_risk::application::{AssessmentService, PredictorGateway, Rejection};
use myopia_risk::{Config, MyopiaError, Submission};

fn read_input() -> Result<String> {
    match std::env::args().nth(1) {
        Some(path) if path != "-" => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn run() -> Result<ExitCode> {
    let config = Config::from_env()?;
    let submission: Submission =
        serde_json::from_str(&read_input()?).context("parsing submission JSON")?;

    let store = Arc::new(FsArtifactStore::from_config(&config));
    let gateway = PredictorGateway::new(store).with_cache(config.cache_models);
    let service = AssessmentService::new(gateway, config.output_mode);

    match service.assess(&submission) {
        Ok(assessment) => {
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            match &err {
                MyopiaError::Validation(e) => {
                    println!("{}", serde_json::to_string_pretty(&Rejection::from(e))?);
                }
                other => eprintln!("{other}"),
            }
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
