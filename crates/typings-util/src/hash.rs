//! Hashing utilities for content-addressed cache keys.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 hex digest of a UTF-8 string.
pub fn sha256_str(data: &str) -> String {
    sha256_bytes(data.as_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_deterministic() {
        let a = sha256_bytes(b"hello");
        let b = sha256_bytes(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn sha256_bytes_different_input() {
        let a = sha256_bytes(b"hello");
        let b = sha256_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn sha256_bytes_empty() {
        let hash = sha256_bytes(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_str_matches_bytes() {
        assert_eq!(sha256_str("cache-key"), sha256_bytes(b"cache-key"));
    }

    #[test]
    fn sha256_str_stable_across_calls() {
        let url = "https://registry.example.com/pkg/typings.json";
        assert_eq!(sha256_str(url), sha256_str(url));
    }
}
