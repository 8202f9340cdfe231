//! pshift - duration-preserving pitch shifter
//!
//! Diagnostics for the pitch-shifting engine: probe it with a synthetic
//! tone and manage the saved engine settings.

mod config;
mod probe;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pshift_dsp::Normalization;
use tracing_subscriber::EnvFilter;

use config::{normalization_name, Settings};

#[derive(Parser)]
#[command(name = "pshift")]
#[command(author, version, about = "Duration-preserving pitch shifter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shift a synthetic tone and measure the result
    Probe(probe::ProbeArgs),

    /// Show or write the saved engine settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings and where they are stored
    Show,

    /// Save settings, starting from the current ones
    Init {
        /// FFT frame size (power of two)
        #[arg(long)]
        frame_size: Option<usize>,

        /// Oversampling factor
        #[arg(long)]
        oversample: Option<usize>,

        /// Sample rate in Hz
        #[arg(long)]
        sample_rate: Option<f32>,

        /// Output normalization
        #[arg(long)]
        normalization: Option<CliNormalization>,
    },
}

/// Normalization modes for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliNormalization {
    Reference,
    Unity,
}

impl From<CliNormalization> for Normalization {
    fn from(n: CliNormalization) -> Self {
        match n {
            CliNormalization::Reference => Normalization::Reference,
            CliNormalization::Unity => Normalization::UnityGain,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Probe(args) => probe::run(args),
        Commands::Config { action } => run_config(action),
    }
}

fn run_config(action: ConfigAction) -> Result<()> {
    let mut settings = Settings::load().context("failed to load settings")?;

    match action {
        ConfigAction::Show => {
            println!("# {}", Settings::config_path().display());
            print_settings(&settings);
        }
        ConfigAction::Init {
            frame_size,
            oversample,
            sample_rate,
            normalization,
        } => {
            if let Some(frame_size) = frame_size {
                settings.frame_size = frame_size;
            }
            if let Some(oversample) = oversample {
                settings.oversample = oversample;
            }
            if let Some(sample_rate) = sample_rate {
                settings.sample_rate = sample_rate;
            }
            if let Some(normalization) = normalization {
                settings.normalization = normalization.into();
            }

            settings
                .to_params()
                .validate()
                .context("refusing to save invalid settings")?;
            let path = settings.save().context("failed to save settings")?;
            tracing::info!(path = %path.display(), "settings saved");
            print_settings(&settings);
        }
    }

    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("frame_size={}", settings.frame_size);
    println!("oversample={}", settings.oversample);
    println!("sample_rate={}", settings.sample_rate);
    println!("normalization={}", normalization_name(settings.normalization));
}
