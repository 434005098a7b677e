//! Speech Enhance CLI
//!
//! Loads the pretrained model, enhances one recording and writes the result.
//! Logs go to stderr; stdout carries only the command output.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use speech_enhance::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Speech Enhance v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Inspect {
            checkpoint,
            key,
            manifest,
        }) => commands::inspect(&checkpoint, &key, manifest)
            .with_context(|| format!("failed to inspect {}", checkpoint.display())),
        Some(Commands::Enhance(args)) => run_enhance(&args),
        None => run_enhance(&cli.enhance),
    }
}

fn run_enhance(args: &speech_enhance::cli::EnhanceArgs) -> anyhow::Result<()> {
    let config = args.resolve().context("failed to build configuration")?;
    match commands::enhance(&config) {
        Ok(report) => {
            info!(
                output = %config.output_path.display(),
                samples = report.output_samples,
                state = %report.final_state,
                "Done"
            );
            Ok(())
        }
        Err(err) => {
            for hint in err.recovery_suggestions() {
                eprintln!("hint: {}", hint);
            }
            let code = err.error_code();
            Err(anyhow::Error::new(err).context(format!("enhancement failed [{}]", code)))
        }
    }
}
