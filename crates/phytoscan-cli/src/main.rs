//! Phytoscan CLI
//!
//! Loads the plant disease predictor once and runs it over leaf images.

use anyhow::{Context, Result};
use clap::Parser;
use phytoscan_classifier::{telemetry, Diagnosis, Predictor, PredictorConfig};
use phytoscan_core::PredictionResult;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;

use cli::{Cli, Commands};

/// Exit status when the predictor could not be brought up
const EXIT_STARTUP_FAILURE: u8 = 2;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    telemetry::describe_metrics();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(&cli)?;

    match cli.command.unwrap_or(Commands::Info) {
        Commands::Info => {
            let predictor = load_predictor(config)?;
            let labels = predictor.labels();

            println!("Model:         {}", predictor.name());
            println!("Architecture:  {}", predictor.architecture());
            println!("Device:        {}", predictor.status().device);
            println!("Classes:       {}", labels.len());
            println!("Sample labels: {}", labels.sample(5).join(", "));
        }

        Commands::Predict {
            images,
            threshold,
            report,
        } => {
            let predictor = load_predictor(config)?;
            run_predictions(&predictor, &images, threshold, report)?;
        }

        Commands::Status => {
            let predictor = load_predictor(config)?;
            println!("{}", serde_json::to_string_pretty(&predictor.status())?);
        }

        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<phytoscan_core::Error>() {
        Some(e) if e.is_startup() => EXIT_STARTUP_FAILURE,
        _ => EXIT_FAILURE,
    }
}

fn load_predictor(config: PredictorConfig) -> Result<Predictor> {
    info!("Loading model '{}'", config.name);
    let predictor = Predictor::load(config).context("Failed to load predictor")?;
    info!("Model ready: {:?}", predictor);
    Ok(predictor)
}

/// Predict every image, printing one JSON line each; fails if any image failed
fn run_predictions(
    predictor: &Predictor,
    images: &[PathBuf],
    threshold: Option<f32>,
    report: bool,
) -> Result<()> {
    let mut failures = 0usize;

    for path in images {
        match predict_file(predictor, path, threshold) {
            Ok(result) => {
                let body = if report {
                    serde_json::to_value(Diagnosis::from_prediction(&result))?
                } else {
                    serde_json::to_value(&result)?
                };
                let line = serde_json::json!({
                    "image": path.display().to_string(),
                    "result": body,
                });
                println!("{}", serde_json::to_string(&line)?);
            }
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, images.len());
    }
    Ok(())
}

fn predict_file(
    predictor: &Predictor,
    path: &Path,
    threshold: Option<f32>,
) -> Result<PredictionResult> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(predictor.predict_from_bytes(&bytes, threshold)?)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "phytoscan=debug,phytoscan_classifier=debug"
    } else {
        "phytoscan=info,phytoscan_classifier=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_errors_exit_with_two() {
        let missing: Result<()> =
            Err(phytoscan_core::Error::resource("File not found: labels.txt"))
                .context("Failed to load predictor");
        assert_eq!(exit_code(&missing.unwrap_err()), EXIT_STARTUP_FAILURE);

        let mismatch = anyhow::Error::new(phytoscan_core::Error::model_load("fc.weight shape"));
        assert_eq!(exit_code(&mismatch), EXIT_STARTUP_FAILURE);

        let config = anyhow::Error::new(phytoscan_core::Error::config("threshold 1.5"));
        assert_eq!(exit_code(&config), EXIT_STARTUP_FAILURE);
    }

    #[test]
    fn test_call_errors_exit_with_one() {
        let decode = anyhow::Error::new(phytoscan_core::Error::decode("bad png"));
        assert_eq!(exit_code(&decode), EXIT_FAILURE);

        let batch = anyhow::anyhow!("2 of 3 images failed");
        assert_eq!(exit_code(&batch), EXIT_FAILURE);
    }
}
