use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::{HealthCardError, Result};

/// Encode bytes as base64url without padding (RFC 4648 §5).
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url string.
///
/// Padding is optional and the standard `+/` alphabet is accepted alongside
/// `-_`, so tokens copied out of other JOSE tooling decode without
/// preprocessing.
///
/// # Errors
///
/// Returns a `JWS_ERROR` if the input is not valid base64 in either alphabet.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let normalized: String = input
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| HealthCardError::jws(format!("invalid base64url input: {e}")))
}
