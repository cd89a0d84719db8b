//! Pen name availability check.

use clap::Args;

use crate::output;
use quill_client::{AvailabilityCheck, HttpAvailability};
use quill_core::config::ClientConfig;
use quill_core::error::AppError;

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Pen name to check
    pub pen_name: String,
}

/// Execute the check command
pub async fn execute(args: &CheckArgs, config: &ClientConfig) -> Result<(), AppError> {
    let checker = HttpAvailability::new(&config.server_url)?;
    let answer = checker.check(&args.pen_name).await?;
    if answer.available {
        output::print_success(&answer.message);
    } else {
        output::print_warning(&answer.message);
    }
    Ok(())
}
