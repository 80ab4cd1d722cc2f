//! Content hashing for network artifacts
//!
//! A network is addressed by the lowercase hex SHA-256 of its *decompressed*
//! weight file. Both the coordinator (on upload) and the worker (after
//! download) compute the address with these helpers.

use crate::error::{Result, SelfplayError};
use sha2::{Digest, Sha256};

/// Hash an in-memory buffer
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check that `data` hashes to `expected`
pub fn verify(data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(SelfplayError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello world"), HELLO_WORLD);
    }

    #[test]
    fn test_verify_mismatch() {
        let err = verify(b"hello", HELLO_WORLD).unwrap_err();
        match err {
            SelfplayError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, HELLO_WORLD);
                assert_eq!(actual, sha256_hex(b"hello"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(verify(b"hello world", &HELLO_WORLD.to_uppercase()).is_ok());
    }
}
