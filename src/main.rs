//! useful CLI entry point
//!
//! Parses arguments, runs the command and prints failures with context:
//! - `load` - build a configuration document and print it
//! - `flatten` - print a document as a single-level mapping

use anyhow::Result;
use clap::Parser;
use useful::cli;
use useful::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
