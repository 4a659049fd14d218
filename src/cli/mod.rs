//! Command-line interface operating the controller against the SQLite store.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use context::CliContext;
pub use types::{Cli, Commands};

use crate::domain::errors::DomainError;

/// Print a failed command's error and exit non-zero.
///
/// Domain failures keep their stable code so scripts can branch on it.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<DomainError>())
        .map_or("ERROR", DomainError::code);

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "code": code,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error [{code}]: {err:#}");
    }

    std::process::exit(1)
}
