use clap::{Parser, Subcommand};
use phytoscan_classifier::{Architecture, DeviceSpec};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phytoscan")]
#[command(author, version, about = "Plant disease detection from leaf images")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "PHYTOSCAN_CONFIG",
        default_value = "phytoscan.yaml"
    )]
    pub config: String,

    /// Class label file (overrides the configuration)
    #[arg(long, global = true, env = "PHYTOSCAN_LABELS")]
    pub labels: Option<PathBuf>,

    /// Weight archive (overrides the configuration)
    #[arg(long, global = true, env = "PHYTOSCAN_WEIGHTS")]
    pub weights: Option<PathBuf>,

    /// Device: auto, cpu, cuda[:N] or metal[:N]
    #[arg(long, global = true, env = "PHYTOSCAN_DEVICE", value_parser = parse_device)]
    pub device: Option<DeviceSpec>,

    /// Network architecture: resnet18, resnet34, resnet50, resnet101 or resnet152
    #[arg(long, global = true, value_parser = parse_architecture)]
    pub architecture: Option<Architecture>,

    /// Default confidence threshold in [0, 1] (overrides the configuration)
    #[arg(long, global = true, env = "PHYTOSCAN_THRESHOLD")]
    pub default_threshold: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the model and print the device, class count and sample labels
    Info,

    /// Classify one or more images and print one JSON object per image
    Predict {
        /// Image files (PNG, JPEG, ...)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Confidence threshold for this run
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Print a plant/disease report instead of the raw prediction
        #[arg(short, long)]
        report: bool,
    },

    /// Load the model and print its status as JSON
    Status,

    /// Print the effective configuration as YAML without loading the model
    Config,
}

fn parse_device(s: &str) -> Result<DeviceSpec, String> {
    s.parse()
}

fn parse_architecture(s: &str) -> Result<Architecture, String> {
    s.parse()
}
