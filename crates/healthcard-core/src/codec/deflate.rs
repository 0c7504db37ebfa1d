use std::io::{Read, Write};

use flate2::{Compression, read::DeflateDecoder, write::DeflateEncoder};

use crate::error::{HealthCardError, Result};

/// Compress bytes as a raw DEFLATE stream (RFC 1951).
///
/// The output has no zlib header or checksum and no gzip wrapper, as required
/// for `zip: "DEF"` JWS payloads.
///
/// # Errors
///
/// Returns a `JWS_ERROR` if the encoder fails.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| HealthCardError::jws(format!("payload compression failed: {e}")))
}

/// Decompress a raw DEFLATE stream (RFC 1951).
///
/// # Errors
///
/// Returns a `JWS_ERROR` if the input is not a valid raw DEFLATE stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| HealthCardError::jws(format!("payload decompression failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = br#"{"resourceType":"Bundle","type":"collection","entry":[]}"#;
        let compressed = compress(data).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_output_is_raw_deflate() {
        // A zlib stream would start with 0x78; raw DEFLATE of ASCII text
        // starts with a block header that never matches the zlib magic.
        let compressed = compress(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        assert_ne!(compressed[0], 0x78);
        // No gzip magic either.
        assert_ne!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_compression_shrinks_repetitive_json() {
        let data = br#"{"entry":[{"resource":{"resourceType":"Immunization"}},{"resource":{"resourceType":"Immunization"}}]}"#;
        let compressed = compress(data).unwrap();
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let err = decompress(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(err.is_jws_error());
        assert!(err.to_string().contains("decompression"));
    }

    #[test]
    fn test_empty_input_round_trip() {
        let compressed = compress(b"").unwrap();
        assert_eq!(decompress(&compressed).unwrap(), b"");
    }
}
