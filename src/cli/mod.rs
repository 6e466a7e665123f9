//! Command-line interface for useful.
//!
//! The `useful` binary is a thin shell over the library, handy for checking what a
//! configuration document resolves to before a service loads it.
//!
//! # Available Commands
//!
//! - `load` - load a document through the resource layer, optionally normalize generic
//!   markers, substitute `<placeholder>` values and print the result as JSON or YAML
//! - `flatten` - print a document as a single-level `path -> value` mapping, or
//!   rebuild a nested document from one with `--reverse`
//!
//! # Global Options
//!
//! - `--verbose` - debug logging on stderr
//! - `--quiet` - no logging at all
//! - `--log-format` - `text` (default) or `json` log lines
//!
//! `USEFUL_LOG` (or `RUST_LOG`) overrides the level chosen by the flags.
//!
//! # Example
//!
//! ```bash
//! useful load config/app.yaml --set port=8080 --output yaml
//! useful load APP_CONFIG            # variable holding the document URI
//! useful flatten https://example.com/settings.json --separator /
//! ```

mod flatten;
mod load;

#[cfg(test)]
mod tests;

pub use flatten::FlattenCommand;
pub use load::{LoadCommand, OutputFormat, parse_assignment};

use crate::logging::{LogFormat, init_logging};
use anyhow::Result;
use clap::{Parser, Subcommand};

/// Runtime configuration for CLI execution.
///
/// Built from the global flags by [`Cli::build_config`], or constructed directly by
/// tests that want a specific logging setup.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Fallback log level; `None` disables logging unless the environment asks for it.
    pub log_level: Option<String>,

    /// Log line format.
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Configuration with logging disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the tracing subscriber described by this configuration.
    pub fn init_logging(&self) {
        init_logging(self.log_level.as_deref(), self.log_format);
    }
}

/// Top-level command line of the `useful` binary.
#[derive(Parser, Debug)]
#[command(
    name = "useful",
    about = "Load, cache and inspect configuration resources",
    version,
    long_about = "useful loads configuration documents from files and URLs, resolves placeholders and prints the result."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr.
    ///
    /// Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging; only errors are printed.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Format of log lines.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a configuration document and print the result
    Load(LoadCommand),

    /// Flatten a document into a single-level mapping
    Flatten(FlattenCommand),
}

impl Cli {
    /// Execute the parsed command with configuration taken from the global flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the parsed CLI arguments.
    ///
    /// `--verbose` selects `debug`, `--quiet` disables logging and the default is
    /// `warn`, so warnings such as unresolved placeholders still show up.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            log_format: self.log_format,
        }
    }

    /// Execute the CLI with a specific configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Load(cmd) => cmd.execute().await,
            Commands::Flatten(cmd) => cmd.execute().await,
        }
    }
}
