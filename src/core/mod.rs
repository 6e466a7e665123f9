//! Core types shared across useful
//!
//! Currently this is the error system: [`UsefulError`] for typed failures,
//! [`ErrorContext`] for CLI presentation and [`user_friendly_error`] to turn any
//! [`anyhow::Error`] into something worth printing.

pub mod error;

pub use error::{ErrorContext, SharedCause, UsefulError, shared_cause, user_friendly_error};
