//! CLI command implementations.

mod align;
mod config;
mod doctor;
mod export;
mod reset;
mod retry_failed;
mod run;
mod status;

pub use align::run_align;
pub use config::run_config;
pub use doctor::run_doctor;
pub use export::run_export;
pub use reset::run_reset;
pub use retry_failed::run_retry_failed;
pub use run::run_pipeline;
pub use status::run_status;

use console::style;
use std::io::{self, Write};

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
