//! CLI Module
//!
//! Command-line interface for the speech enhancer.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Backend, EnhanceConfig};
use crate::error::Result;
use crate::neural::DEFAULT_STATE_DICT_KEY;

/// Speech Enhance - denoise a speech recording with a pretrained model
#[derive(Parser, Debug)]
#[command(name = "speech-enhance")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options for the default enhance run
    #[command(flatten)]
    pub enhance: EnhanceArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enhance one file (the default when no subcommand is given)
    #[command(name = "enhance")]
    Enhance(EnhanceArgs),

    /// List the parameters stored in a checkpoint
    #[command(name = "inspect")]
    Inspect {
        /// Path to the checkpoint
        checkpoint: PathBuf,

        /// State-dict entry holding the parameters
        #[arg(short, long, default_value = DEFAULT_STATE_DICT_KEY)]
        key: String,

        /// Print a strict schema manifest as JSON instead of a table
        #[arg(long)]
        manifest: bool,
    },
}

/// Overrides applied on top of the default or file configuration
#[derive(Args, Debug, Clone, Default)]
pub struct EnhanceArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model checkpoint
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Noisy input WAV (mono, 16 kHz)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Enhanced output WAV
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exported ONNX graph
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Schema manifest the checkpoint must satisfy
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Model backend
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,
}

impl EnhanceArgs {
    /// Build the run configuration: file (or defaults), then flag overrides
    pub fn resolve(&self) -> Result<EnhanceConfig> {
        let mut config = match &self.config {
            Some(path) => EnhanceConfig::from_json_file(path)?,
            None => EnhanceConfig::default(),
        };

        if let Some(path) = &self.checkpoint {
            config.checkpoint_path = path.clone();
        }
        if let Some(path) = &self.input {
            config.input_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if let Some(path) = &self.graph {
            config.graph_path = path.clone();
        }
        if let Some(path) = &self.schema {
            config.schema_path = Some(path.clone());
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_means_default_run() {
        let cli = Cli::try_parse_from(["speech-enhance"]).unwrap();
        assert!(cli.command.is_none());
        let config = cli.enhance.resolve().unwrap();
        assert_eq!(config, EnhanceConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "speech-enhance",
            "--input",
            "noisy.wav",
            "--backend",
            "passthrough",
        ])
        .unwrap();
        let config = cli.enhance.resolve().unwrap();
        assert_eq!(config.input_path, PathBuf::from("noisy.wav"));
        assert_eq!(config.backend, Backend::Passthrough);
        assert_eq!(config.output_path, PathBuf::from("test_wavs/enh.wav"));
    }

    #[test]
    fn test_inspect_subcommand() {
        let cli = Cli::try_parse_from(["speech-enhance", "inspect", "ckpt.tar", "--manifest"]).unwrap();
        match cli.command {
            Some(Commands::Inspect {
                checkpoint,
                key,
                manifest,
            }) => {
                assert_eq!(checkpoint, PathBuf::from("ckpt.tar"));
                assert_eq!(key, "model");
                assert!(manifest);
            }
            other => panic!("Expected inspect, got: {:?}", other),
        }
    }
}
