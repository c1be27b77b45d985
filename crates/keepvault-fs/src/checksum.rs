//! SHA-256 checksum utilities
//!
//! Note bodies are compared by digest rather than by text. The canonical form
//! is `sha256:<hex>`; change detection uses the short form, the first 16 hex
//! characters of the digest.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Number of hex characters kept by [`short_digest`].
pub const SHORT_DIGEST_LEN: usize = 16;

fn hex_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 checksum of string content as `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    format!("{}{}", PREFIX, hex_digest(content))
}

/// First 16 hex characters of the SHA-256 digest of `content`.
pub fn short_digest(content: &str) -> String {
    let mut hex = hex_digest(content);
    hex.truncate(SHORT_DIGEST_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_checksum_known_value() {
        assert_eq!(
            compute_content_checksum("hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn short_digest_is_prefix_of_full() {
        let short = short_digest("hello world");
        assert_eq!(short, "b94d27b9934d3e08");
        assert!(compute_content_checksum("hello world").contains(&short));
    }

    #[test]
    fn different_content_different_digest() {
        assert_ne!(short_digest("aaa"), short_digest("bbb"));
    }
}
