//! Gzip framing for artifacts on the wire

use crate::error::{Result, SelfplayError};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

/// Compress `data` with gzip at the default level
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip payload
///
/// Anything that is not a complete gzip stream is reported as
/// [`SelfplayError::InvalidGzip`] rather than an IO error.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| SelfplayError::InvalidGzip(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gunzip_restores_content() {
        let content = b"1\n0.5 0.25 -0.125\n".repeat(64);
        let compressed = gzip(&content).unwrap();
        assert_ne!(compressed, content);
        assert_eq!(gunzip(&compressed).unwrap(), content);
    }

    #[test]
    fn test_gunzip_rejects_plain_bytes() {
        let err = gunzip(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, SelfplayError::InvalidGzip(_)));
    }

    #[test]
    fn test_gunzip_rejects_truncated_stream() {
        let compressed = gzip(&b"weights".repeat(100)).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert!(gunzip(truncated).is_err());
    }
}
