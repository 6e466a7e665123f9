//! SHA-256 content fingerprints.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `content`.
///
/// ```rust
/// use useful::utils::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
