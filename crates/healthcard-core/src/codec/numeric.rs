//! SMART Health Cards numeric transcoding.
//!
//! Each character `c` of a compact JWS maps to the two-digit decimal value
//! `ord(c) - 45`, zero-padded. The base64url alphabet plus the `.` separators
//! all land in `[0, 77]`; anything outside that range is not encodable.

use crate::error::{HealthCardError, Result};

/// ASCII offset applied to every JWS character (`ord('-')`).
const CHAR_OFFSET: u32 = 45;

/// Largest encodable value (`ord('z') - 45`).
const MAX_PAIR_VALUE: u32 = 77;

/// Encode a compact JWS string into its numeric form.
///
/// # Errors
///
/// Returns a `QR_CODE_ERROR` if any character maps outside `[0, 77]`.
pub fn encode_jws(jws: &str) -> Result<String> {
    let mut digits = String::with_capacity(jws.len() * 2);
    for c in jws.chars() {
        let value = (c as u32)
            .checked_sub(CHAR_OFFSET)
            .filter(|v| *v <= MAX_PAIR_VALUE)
            .ok_or_else(|| {
                HealthCardError::qr_code(format!(
                    "character {c:?} is outside the numeric-encodable range"
                ))
            })?;
        digits.push(char::from(b'0' + (value / 10) as u8));
        digits.push(char::from(b'0' + (value % 10) as u8));
    }
    Ok(digits)
}

/// Decode a numeric string back into the compact JWS it encodes.
///
/// # Errors
///
/// Returns a `QR_CODE_ERROR` if the input has odd length, contains a
/// non-digit, or contains a two-digit pair greater than 77.
pub fn decode_jws(digits: &str) -> Result<String> {
    let bytes = digits.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(HealthCardError::qr_code(format!(
            "numeric data must have even length, got {}",
            bytes.len()
        )));
    }

    let mut jws = String::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        if !pair[0].is_ascii_digit() || !pair[1].is_ascii_digit() {
            return Err(HealthCardError::qr_code(
                "numeric data contains a non-digit character",
            ));
        }
        let value = u32::from(pair[0] - b'0') * 10 + u32::from(pair[1] - b'0');
        if value > MAX_PAIR_VALUE {
            return Err(HealthCardError::qr_code(format!(
                "digit pair {value:02} exceeds the maximum of {MAX_PAIR_VALUE}"
            )));
        }
        jws.push(char::from((value + CHAR_OFFSET) as u8));
    }
    Ok(jws)
}
