//! Small helpers shared across modules
//!
//! - [`checksum`] - SHA-256 digests used as content freshness tokens
//! - [`retry`] - fixed-interval retries for async operations

pub mod checksum;
pub mod retry;

pub use checksum::sha256_hex;
pub use retry::retry;
