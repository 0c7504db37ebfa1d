//! Scan-side reassembly of QR content into a JWS.
//!
//! The scanner input is the already-decoded textual content of one or more
//! QR symbols; camera handling is out of scope. Single-symbol cards carry
//! `shc:/<digits>`, chunked sets carry `shc:/<i>/<N>/<digits>` with 1-based
//! indices.

use std::sync::LazyLock;

use tracing::debug;

use healthcard_core::codec::numeric;
use healthcard_core::error::{HealthCardError, Result};

use crate::generator::SHC_PREFIX;

static CHUNK_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^shc:/(\d+)/(\d+)/(\d+)$").expect("Invalid chunk content regex")
});

/// Reassemble decoded QR content into the original compact JWS.
///
/// A single element must be the plain `shc:/<digits>` form. Multiple
/// elements must be a complete chunk set sharing one total `N`, with every
/// index `1..=N` present exactly once; chunks may arrive in any order.
///
/// # Errors
///
/// Returns a `QR_CODE_ERROR` for empty input, a missing `shc:/` prefix,
/// malformed chunk headers, non-digit data, inconsistent totals, missing or
/// duplicate chunks, or out-of-range digit pairs.
pub fn scan_qr(contents: &[String]) -> Result<String> {
    match contents {
        [] => Err(HealthCardError::qr_code("no QR content provided")),
        [single] => scan_single(single),
        chunks => scan_chunked(chunks),
    }
}

fn scan_single(content: &str) -> Result<String> {
    let digits = content.strip_prefix(SHC_PREFIX).ok_or_else(|| {
        HealthCardError::qr_code(format!("QR content must start with \"{SHC_PREFIX}\""))
    })?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HealthCardError::qr_code(
            "single QR content must be all digits after the shc:/ prefix",
        ));
    }

    numeric::decode_jws(digits)
}

fn scan_chunked(contents: &[String]) -> Result<String> {
    let mut chunks: Vec<(usize, &str)> = Vec::with_capacity(contents.len());
    let mut total = 0usize;

    for content in contents {
        let captures = CHUNK_REGEX.captures(content).ok_or_else(|| {
            HealthCardError::qr_code(
                "chunked QR content must match shc:/<index>/<total>/<digits>",
            )
        })?;

        let index: usize = captures[1]
            .parse()
            .map_err(|_| HealthCardError::qr_code("chunk index is not a valid number"))?;
        let chunk_total: usize = captures[2]
            .parse()
            .map_err(|_| HealthCardError::qr_code("chunk total is not a valid number"))?;

        if total == 0 {
            total = chunk_total;
        } else if chunk_total != total {
            return Err(HealthCardError::qr_code(format!(
                "inconsistent chunk totals: {total} and {chunk_total}"
            )));
        }

        if index == 0 || index > chunk_total {
            return Err(HealthCardError::qr_code(format!(
                "chunk index {index} is out of range 1..={chunk_total}"
            )));
        }

        let digits = captures.get(3).expect("regex has three groups").range();
        chunks.push((index, &content[digits]));
    }

    chunks.sort_by_key(|(index, _)| *index);
    for window in chunks.windows(2) {
        if window[0].0 == window[1].0 {
            return Err(HealthCardError::qr_code(format!(
                "duplicate chunk index {}",
                window[0].0
            )));
        }
    }
    if chunks.len() != total {
        return Err(HealthCardError::qr_code(format!(
            "expected {total} chunks, got {}",
            chunks.len()
        )));
    }

    debug!(total, "reassembling chunked health card QR set");
    let digits: String = chunks.iter().map(|(_, digits)| *digits).collect();
    numeric::decode_jws(&digits)
}
