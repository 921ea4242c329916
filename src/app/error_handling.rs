//! Error handling utilities

use crate::error::DemoError;
use tracing::error;

/// Exit status for an error reaching `main`
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<DemoError>()
        .map(DemoError::exit_code)
        .unwrap_or(1)
}

/// Print a fatal error and exit
///
/// - `verbose = 0`: user-facing message only
/// - `verbose >= 1`: adds the developer message with the full cause chain
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    if let Some(demo_err) = error.downcast_ref::<DemoError>() {
        eprintln!("{}", demo_err.user_message());
        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", demo_err.developer_message());
        }
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
    }

    std::process::exit(exit_code_for(&error))
}
