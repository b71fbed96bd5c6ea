//! oc-auth CLI entry point
//!
//! Parses the arguments, installs logging, runs the token refresh and turns any error
//! into a colored message with suggestions. Exit codes: 0 on success, 1 on runtime
//! errors, 2 on invalid arguments (reported by clap).

use anyhow::Result;
use clap::Parser;
use oc_auth::cli;
use oc_auth::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    config.init_logging();

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
