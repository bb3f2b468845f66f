//! CLI module for Podquote.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Podquote - resumable quote mining for podcast transcripts
///
/// Extracts memorable quotes from transcripts, translates them into several
/// languages and re-aligns their timestamps, resuming safely after interruption.
#[derive(Parser, Debug)]
#[command(name = "podquote")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract and translate quotes for every transcript, resuming from the checkpoint
    Run {
        /// Start without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show pipeline progress from the checkpoint
    Status,

    /// Re-derive quote timestamps from transcript markers
    Align,

    /// Schedule failed units for another attempt
    RetryFailed {
        /// Units to retry (all failed units if omitted)
        units: Vec<String>,
    },

    /// Discard progress for one unit or the whole corpus
    Reset {
        /// Unit to reset (everything if omitted)
        #[arg(short, long)]
        unit: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Merge all quote files into one export
    Export {
        /// Output file (defaults to quotes_complete.json in the output directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check credentials, directories and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
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
    fn test_parse_retry_failed_units() {
        let cli = Cli::parse_from(["podquote", "-vv", "retry-failed", "Ada_Chen", "Lee"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::RetryFailed { units } => assert_eq!(units, vec!["Ada_Chen", "Lee"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
