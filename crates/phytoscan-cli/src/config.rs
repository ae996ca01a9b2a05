//! Configuration loading for the CLI

use crate::cli::Cli;
use phytoscan_classifier::{PredictorConfig, ResourceSource};
use std::path::Path;

/// Load the configuration file when it exists and apply CLI overrides
pub fn load(cli: &Cli) -> anyhow::Result<PredictorConfig> {
    let path = Path::new(&cli.config);

    let mut config = if path.exists() {
        PredictorConfig::from_file(path)?
    } else {
        tracing::debug!("No configuration at {}, using defaults", path.display());
        PredictorConfig::default()
    };

    if let Some(labels) = &cli.labels {
        config.labels = ResourceSource::local(labels.clone());
    }

    if let Some(weights) = &cli.weights {
        config.weights = ResourceSource::local(weights.clone());
    }

    if let Some(device) = cli.device {
        config.device = device;
    }

    if let Some(architecture) = cli.architecture {
        config.architecture = architecture;
    }

    if let Some(threshold) = cli.default_threshold {
        config.inference.threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}
