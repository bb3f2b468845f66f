//! Podquote CLI entry point.

use anyhow::Result;
use clap::Parser;
use podquote::cli::{commands, Cli, Commands};
use podquote::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("podquote={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Execute command
    match &cli.command {
        Commands::Run { yes } => {
            // Progress bars are hidden when logging is verbose
            commands::run_pipeline(*yes, cli.verbose > 0, settings).await?;
        }

        Commands::Status => {
            commands::run_status(settings)?;
        }

        Commands::Align => {
            commands::run_align(settings).await?;
        }

        Commands::RetryFailed { units } => {
            commands::run_retry_failed(units, settings)?;
        }

        Commands::Reset { unit, yes } => {
            commands::run_reset(unit.as_deref(), *yes, settings)?;
        }

        Commands::Export { output } => {
            commands::run_export(output.clone(), settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(config_path.as_deref(), &settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
