//! Error display for the CLI.

use colored::Colorize;
use fuel_config::{ApiError, DefaultsError, IdentityError};
use thiserror::Error;

/// Resolution did not complete and `--strict` was given.
#[derive(Debug, Error)]
#[error("resolution stopped at step '{step}': {message}")]
pub struct IncompleteResolution {
    pub step: &'static str,
    pub message: String,
    pub transport: bool,
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(incomplete) = err.downcast_ref::<IncompleteResolution>() {
        let hint = if incomplete.transport {
            "Hint: Check that Nailgun is reachable at NAILGUN_HOST:NAILGUN_PORT."
        } else {
            "Hint: Nailgun answered, but the cluster data is incomplete. Rerun with RUST_LOG=debug."
        };
        eprintln!("\n{}", hint.yellow());
    } else if let Some(DefaultsError::Load { path, .. }) = err.downcast_ref::<DefaultsError>() {
        eprintln!(
            "\n{}",
            format!("Hint: Fix or remove {}.", path.display()).yellow()
        );
    } else if let Some(IdentityError::Missing(name)) = err.downcast_ref::<IdentityError>() {
        eprintln!(
            "\n{}",
            format!("Hint: Set {name} or pass the matching --flag.").yellow()
        );
    } else if let Some(ApiError::Client(_)) = err.downcast_ref::<ApiError>() {
        eprintln!("\n{}", "Hint: The HTTP client could not be created.".yellow());
    }
}
