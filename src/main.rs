//! audiorec CLI
//!
//! Command-line interface for recording and resampling audio.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use audiorec::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("audiorec v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Record(args) => args
            .into_config()
            .and_then(|config| commands::record(&config))
            .context("recording failed"),
        Commands::Resample {
            input,
            output,
            rate,
            format,
        } => commands::resample_file(&input, &output, rate, format)
            .with_context(|| format!("failed to resample {}", input.display())),
        Commands::Devices => commands::list_devices().context("failed to list input devices"),
    };

    if let Err(err) = &result {
        if let Some(cause) = err.downcast_ref::<audiorec::AudiorecError>() {
            error!("[{}] {}", cause.error_code(), cause);
            for hint in cause.recovery_suggestions() {
                eprintln!("  hint: {}", hint);
            }
        }
    }

    result
}
