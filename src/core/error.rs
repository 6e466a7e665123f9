//! Error handling for useful
//!
//! This module provides the crate-wide error type and user-friendly error reporting for
//! the `useful` binary. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can match on the exact failure
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Object construction**: [`UsefulError::UnresolvedType`], [`UsefulError::Construction`],
//!   [`UsefulError::CyclicReference`], [`UsefulError::InvalidArguments`]
//! - **Resource loading**: [`UsefulError::FetchError`], [`UsefulError::ParseError`],
//!   [`UsefulError::UnsupportedScheme`]
//! - **Configuration**: [`UsefulError::MissingEnvVar`], [`UsefulError::InvalidPath`]
//! - **File system**: [`UsefulError::Io`]
//! - **Everything else**: [`UsefulError::Other`], used when presenting foreign errors
//!
//! Nothing in the crate retries or masks these errors. The only forgiving behaviour
//! is that unresolved placeholders and non-marker mappings are treated as plain data.
//!
//! # Examples
//!
//! ```rust,no_run
//! use useful::core::{UsefulError, user_friendly_error};
//!
//! let error = UsefulError::UnresolvedType {
//!     type_path: "pkg.Widget".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Shared, cloneable cause attached to errors that wrap a foreign failure.
pub type SharedCause = Arc<dyn std::error::Error + Send + Sync>;

/// Wrap an [`anyhow::Error`] so it can travel inside a cloneable [`UsefulError`].
pub fn shared_cause(error: anyhow::Error) -> SharedCause {
    let boxed: Box<dyn std::error::Error + Send + Sync> = error.into();
    Arc::from(boxed)
}

/// The main error type for useful operations
///
/// Each variant carries the identifiers needed to explain the failure (the marker key,
/// the URI, the environment variable) so that the CLI can render a precise message.
///
/// [`Construction`](UsefulError::Construction) keeps the constructor's original error
/// as its [`source`](std::error::Error::source), so the full cause chain survives.
#[derive(Error, Debug, Clone)]
pub enum UsefulError {
    /// A construction marker names a type the resolver does not know
    #[error("Unresolved type '{type_path}'")]
    UnresolvedType {
        /// The marker key that failed to resolve
        type_path: String,
    },

    /// A registered constructor returned an error
    #[error("Failed to construct '{type_path}': {reason}")]
    Construction {
        /// The marker key of the failing constructor
        type_path: String,
        /// Rendered message of the original failure
        reason: String,
        /// The original failure
        #[source]
        source: SharedCause,
    },

    /// A node was reached again while it was still being built
    ///
    /// Only possible with self-referencing YAML aliases.
    #[error("Cyclic reference detected while building node {node}")]
    CyclicReference {
        /// Arena index of the node that closed the cycle
        node: usize,
    },

    /// Constructor arguments are missing or have the wrong shape
    #[error("Invalid arguments for '{type_path}': {reason}")]
    InvalidArguments {
        /// The constructor that rejected its arguments
        type_path: String,
        /// What was wrong
        reason: String,
    },

    /// Transport-level failure while downloading or checking a resource
    #[error("Failed to fetch '{uri}': {reason}")]
    FetchError {
        /// The resource URI
        uri: String,
        /// Transport error message
        reason: String,
    },

    /// The downloaded bytes are not valid for the detected format
    #[error("Failed to parse '{uri}' as {format}: {reason}")]
    ParseError {
        /// The resource URI
        uri: String,
        /// The mimetype the parser was selected for
        format: String,
        /// Parser error message
        reason: String,
    },

    /// No downloader is registered for the URI scheme
    #[error("Unsupported resource scheme '{scheme}'")]
    UnsupportedScheme {
        /// The scheme taken from the URI
        scheme: String,
    },

    /// The configuration source names an environment variable that is not set
    #[error("Environment variable '{name}' is not set")]
    MissingEnvVar {
        /// Variable name
        name: String,
    },

    /// A dotted lookup path does not exist in a built value
    #[error("Path '{path}' not found")]
    InvalidPath {
        /// The dotted path that was requested
        path: String,
    },

    /// File system failure outside of resource downloading
    #[error("I/O error during {operation} on '{path}': {reason}")]
    Io {
        /// What was being done
        operation: String,
        /// Path involved
        path: String,
        /// Error message
        reason: String,
    },

    /// Any other failure
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl UsefulError {
    /// Build a [`UsefulError::Construction`] from a constructor failure.
    pub fn construction(type_path: impl Into<String>, error: anyhow::Error) -> Self {
        Self::Construction {
            type_path: type_path.into(),
            reason: format!("{error:#}"),
            source: shared_cause(error),
        }
    }

    /// Build a [`UsefulError::FetchError`] from any displayable transport error.
    pub fn fetch(uri: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::FetchError {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`UsefulError::ParseError`].
    pub fn parse(uri: impl Into<String>, format: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ParseError {
            uri: uri.into(),
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps a [`UsefulError`] with an optional suggestion and details for display in the
/// terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UsefulError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UsefulError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognises [`UsefulError`] anywhere in the cause chain and [`std::io::Error`].
/// Anything else is reported as a generic failure with the rendered cause chain as
/// details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(useful_error) = cause.downcast_ref::<UsefulError>() {
            return create_error_context(useful_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return ErrorContext::new(UsefulError::Io {
            operation: "file access".to_string(),
            path: "unknown".to_string(),
            reason: io_error.to_string(),
        })
        .with_suggestion("Check that the path exists and is readable");
    }

    let ctx = ErrorContext::new(UsefulError::Other {
        message: error.to_string(),
    });
    if error.chain().count() > 1 {
        ctx.with_details(format!("{error:#}"))
    } else {
        ctx
    }
}

fn create_error_context(error: UsefulError) -> ErrorContext {
    match &error {
        UsefulError::UnresolvedType { type_path } => {
            let suggestion = format!(
                "Register a constructor for '{type_path}' in the type registry before building"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Single-key mappings whose key is a dotted path are treated as construction markers")
        }
        UsefulError::Construction { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the arguments given to the constructor in the configuration")
        }
        UsefulError::CyclicReference { .. } => ErrorContext::new(error)
            .with_suggestion("Remove the YAML alias that points back into its own anchor"),
        UsefulError::FetchError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the URI, your network connection and access rights"),
        UsefulError::ParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the file syntax or force a different format"),
        UsefulError::UnsupportedScheme { scheme } => {
            let suggestion = format!("Register a downloader for the '{scheme}' scheme");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Built-in schemes are file, http and https")
        }
        UsefulError::MissingEnvVar { name } => {
            let suggestion = format!("Export {name} with the URI of the configuration");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        _ => ErrorContext::new(error),
    }
}
