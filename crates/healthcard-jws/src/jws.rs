//! Compact JWS construction and verification for health cards.
//!
//! The wire format is RFC 7515 compact serialization over ES256 with one
//! SMART Health Cards extension: when the protected header carries
//! `zip: "DEF"`, the signed payload bytes are the raw-DEFLATE compression of
//! the JWT JSON. The header is the sole authority for decompression, and
//! signatures are always checked before the payload bytes are inflated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use healthcard_core::codec::{base64url, deflate};
use healthcard_core::error::{HealthCardError, Result};
use healthcard_core::vc::VcClaim;

use crate::key::{Es256PrivateKey, Es256PublicKey};

/// The only algorithm SMART Health Cards permit.
pub const JWS_ALGORITHM: &str = "ES256";

/// The `zip` value signalling raw DEFLATE.
pub const ZIP_DEFLATE: &str = "DEF";

// =============================================================================
// Wire Types
// =============================================================================

/// The protected JWS header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signing algorithm; must be `"ES256"`.
    pub alg: String,

    /// Key ID, conventionally the issuer key's RFC 7638 thumbprint.
    pub kid: String,

    /// Token type; always `"JWT"`.
    pub typ: String,

    /// Present (as `"DEF"`) iff the payload bytes are raw DEFLATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// The JWT claims of a health card.
///
/// Unknown top-level claims are preserved and never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtPayload {
    /// Issuer URI.
    pub iss: String,

    /// Not-before, in seconds since the epoch. Kept as a JSON number so
    /// integer values stay integers on the wire while fractional values from
    /// other issuers still parse.
    pub nbf: Number,

    /// Optional expiry, strictly greater than `nbf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<Number>,

    /// The verifiable credential claim.
    pub vc: VcClaim,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JwtPayload {
    /// Build a payload with no extra claims.
    pub fn new(iss: impl Into<String>, nbf: i64, exp: Option<i64>, vc: VcClaim) -> Self {
        Self {
            iss: iss.into(),
            nbf: Number::from(nbf),
            exp: exp.map(Number::from),
            vc,
            extra: Map::new(),
        }
    }

    /// Enforce the payload invariants.
    ///
    /// # Errors
    ///
    /// Returns a `JWS_ERROR` if `iss` is empty, `nbf` is not a finite
    /// number, or `exp` is present and not strictly greater than `nbf`.
    pub fn validate(&self) -> Result<()> {
        if self.iss.is_empty() {
            return Err(HealthCardError::jws("payload iss must be a non-empty string"));
        }

        let nbf = self
            .nbf
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| HealthCardError::jws("payload nbf must be a finite number"))?;

        if let Some(exp) = &self.exp {
            let exp = exp
                .as_f64()
                .filter(|n| n.is_finite())
                .ok_or_else(|| HealthCardError::jws("payload exp must be a finite number"))?;
            if exp <= nbf {
                return Err(HealthCardError::jws(format!(
                    "payload exp ({exp}) must be greater than nbf ({nbf})"
                )));
            }
        }

        Ok(())
    }
}

/// An unauthenticated view of a parsed JWS, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedJws {
    /// The protected header.
    pub header: JwsHeader,

    /// The structurally validated payload. The signature has NOT been
    /// checked.
    pub payload: JwtPayload,
}

// =============================================================================
// Processor
// =============================================================================

/// Signs and verifies ES256 compact JWS tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwsProcessor;

impl JwsProcessor {
    /// Create a new processor.
    pub fn new() -> Self {
        Self
    }

    /// Sign a payload into compact JWS form.
    ///
    /// The payload is serialized to UTF-8 JSON, raw-DEFLATE compressed when
    /// `enable_compression` is set (adding `zip: "DEF"` to the header), and
    /// signed over the ASCII `base64url(header).base64url(payload)` string.
    ///
    /// # Errors
    ///
    /// Returns a `JWS_ERROR` if the payload fails validation or if
    /// serialization or compression fails.
    pub fn sign(
        &self,
        payload: &JwtPayload,
        private_key: &Es256PrivateKey,
        kid: &str,
        enable_compression: bool,
    ) -> Result<String> {
        payload.validate()?;

        let payload_json = serde_json::to_vec(payload)
            .map_err(|e| HealthCardError::jws(format!("payload serialization failed: {e}")))?;

        let (payload_bytes, zip) = if enable_compression {
            (deflate::compress(&payload_json)?, Some(ZIP_DEFLATE.to_string()))
        } else {
            (payload_json, None)
        };

        let header = JwsHeader {
            alg: JWS_ALGORITHM.to_string(),
            kid: kid.to_string(),
            typ: "JWT".to_string(),
            zip,
        };
        let header_json = serde_json::to_vec(&header)
            .map_err(|e| HealthCardError::jws(format!("header serialization failed: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            base64url::encode(&header_json),
            base64url::encode(&payload_bytes)
        );
        let signature = private_key.sign(signing_input.as_bytes());

        debug!(kid, compressed = enable_compression, "signed health card JWS");
        Ok(format!("{signing_input}.{}", base64url::encode(&signature)))
    }

    /// Verify a compact JWS and return its payload.
    ///
    /// The ECDSA signature is checked over the authenticated
    /// `header.payload` ASCII before any decompression or JSON parsing of
    /// the payload bytes.
    ///
    /// # Errors
    ///
    /// Returns a `JWS_ERROR` distinguishing format, algorithm,
    /// signature, decompression, and parse failures.
    pub fn verify(&self, jws: &str, public_key: &Es256PublicKey) -> Result<JwtPayload> {
        let (b64_header, b64_payload, b64_signature) = split_compact(jws)?;

        let header = parse_header(b64_header)?;

        let signature = base64url::decode(b64_signature)?;
        let signing_input = format!("{b64_header}.{b64_payload}");
        public_key.verify(signing_input.as_bytes(), &signature)?;

        let payload = parse_payload(&header, b64_payload)?;
        debug!(kid = %header.kid, iss = %payload.iss, "verified health card JWS");
        Ok(payload)
    }

    /// Parse a compact JWS without checking its signature.
    ///
    /// Useful for inspecting `iss`/`kid` before a key is chosen. The same
    /// decompression rule as [`Self::verify`] applies, and a payload that
    /// fails structural validation is never returned.
    ///
    /// # Errors
    ///
    /// Returns a `JWS_ERROR` on format, decompression, or parse failures.
    pub fn decode(&self, jws: &str) -> Result<DecodedJws> {
        let (b64_header, b64_payload, _) = split_compact(jws)?;
        let header = parse_header(b64_header)?;
        let payload = parse_payload(&header, b64_payload)?;
        Ok(DecodedJws { header, payload })
    }
}

fn split_compact(jws: &str) -> Result<(&str, &str, &str)> {
    let mut parts = jws.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
            Ok((h, p, s))
        }
        _ => Err(HealthCardError::jws(
            "compact JWS must have three non-empty dot-separated parts",
        )),
    }
}

fn parse_header(b64_header: &str) -> Result<JwsHeader> {
    let header_bytes = base64url::decode(b64_header)?;
    let header: JwsHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| HealthCardError::jws(format!("protected header is not valid JSON: {e}")))?;

    if header.alg != JWS_ALGORITHM {
        return Err(HealthCardError::jws(format!(
            "unsupported algorithm \"{}\", expected \"{JWS_ALGORITHM}\"",
            header.alg
        )));
    }
    Ok(header)
}

/// Decode, optionally inflate, and structurally validate the payload. The
/// header decides whether the bytes are compressed.
fn parse_payload(header: &JwsHeader, b64_payload: &str) -> Result<JwtPayload> {
    let payload_bytes = base64url::decode(b64_payload)?;

    let payload_json = match header.zip.as_deref() {
        Some(ZIP_DEFLATE) => deflate::decompress(&payload_bytes)?,
        Some(other) => {
            return Err(HealthCardError::jws(format!(
                "unsupported zip value \"{other}\", expected \"{ZIP_DEFLATE}\""
            )));
        }
        None => payload_bytes,
    };

    let payload: JwtPayload = serde_json::from_slice(&payload_json)
        .map_err(|e| HealthCardError::jws(format!("payload is not valid JSON: {e}")))?;
    payload.validate()?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthcard_core::vc::{VcOptions, VerifiableCredentialProcessor};
    use serde_json::json;

    fn sample_vc() -> VcClaim {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [{"resource": {"resourceType": "Patient"}}]
        });
        VerifiableCredentialProcessor::new()
            .create(&bundle, &VcOptions::default())
            .vc
    }

    fn sample_payload() -> JwtPayload {
        JwtPayload::new("https://issuer.example.org", 1_700_000_000, None, sample_vc())
    }

    #[test]
    fn test_sign_produces_three_parts() {
        let key = Es256PrivateKey::generate();
        let jws = JwsProcessor::new()
            .sign(&sample_payload(), &key, "key-1", true)
            .unwrap();

        let parts: Vec<&str> = jws.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_sign_verify_round_trip_compressed() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();
        let payload = sample_payload();

        let jws = processor.sign(&payload, &key, "key-1", true).unwrap();
        let verified = processor.verify(&jws, &key.public_key()).unwrap();
        assert_eq!(verified, payload);
    }

    #[test]
    fn test_sign_verify_round_trip_uncompressed() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();
        let payload = sample_payload();

        let jws = processor.sign(&payload, &key, "key-1", false).unwrap();
        let verified = processor.verify(&jws, &key.public_key()).unwrap();
        assert_eq!(verified, payload);
    }

    #[test]
    fn test_header_wire_shape() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();

        let compressed = processor.sign(&sample_payload(), &key, "kid-x", true).unwrap();
        let header_json: Value = serde_json::from_slice(
            &base64url::decode(compressed.split('.').next().unwrap()).unwrap(),
        )
        .unwrap();
        assert_eq!(header_json["alg"], "ES256");
        assert_eq!(header_json["kid"], "kid-x");
        assert_eq!(header_json["typ"], "JWT");
        assert_eq!(header_json["zip"], "DEF");

        let plain = processor.sign(&sample_payload(), &key, "kid-x", false).unwrap();
        let header_json: Value = serde_json::from_slice(
            &base64url::decode(plain.split('.').next().unwrap()).unwrap(),
        )
        .unwrap();
        assert!(header_json.get("zip").is_none());
    }

    #[test]
    fn test_nbf_serializes_as_integer() {
        let key = Es256PrivateKey::generate();
        let jws = JwsProcessor::new()
            .sign(&sample_payload(), &key, "key-1", false)
            .unwrap();
        let payload_bytes =
            base64url::decode(jws.split('.').nth(1).unwrap()).unwrap();
        let text = String::from_utf8(payload_bytes).unwrap();
        assert!(text.contains("\"nbf\":1700000000"));
        assert!(!text.contains("1700000000.0"));
    }

    #[test]
    fn test_sign_rejects_invalid_payload() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();

        let mut empty_iss = sample_payload();
        empty_iss.iss = String::new();
        assert!(processor.sign(&empty_iss, &key, "k", true).unwrap_err().is_jws_error());

        // exp == nbf is rejected; exp == nbf + 1 signs.
        let mut exp_equal = sample_payload();
        exp_equal.exp = Some(exp_equal.nbf.clone());
        assert!(processor.sign(&exp_equal, &key, "k", true).is_err());

        let payload = JwtPayload::new(
            "https://issuer.example.org",
            1_700_000_000,
            Some(1_700_000_001),
            sample_vc(),
        );
        assert!(processor.sign(&payload, &key, "k", true).is_ok());
    }

    #[test]
    fn test_verify_rejects_malformed_compact_form() {
        let processor = JwsProcessor::new();
        let public = Es256PrivateKey::generate().public_key();

        for bad in ["", "a.b", "a.b.c.d", ".b.c", "a..c", "a.b."] {
            let err = processor.verify(bad, &public).unwrap_err();
            assert!(err.is_jws_error(), "expected JWS error for {bad:?}");
        }
    }

    #[test]
    fn test_verify_rejects_wrong_algorithm() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();
        let jws = processor.sign(&sample_payload(), &key, "k", true).unwrap();

        // Re-assemble with an RS256 header; the signature check is never
        // reached because the algorithm gate comes first.
        let parts: Vec<&str> = jws.split('.').collect();
        let forged_header = base64url::encode(
            serde_json::to_vec(&json!({"alg": "RS256", "kid": "k", "typ": "JWT"}))
                .unwrap()
                .as_slice(),
        );
        let forged = format!("{forged_header}.{}.{}", parts[1], parts[2]);

        let err = processor.verify(&forged, &key.public_key()).unwrap_err();
        assert!(err.to_string().contains("unsupported algorithm"));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();
        let jws = processor.sign(&sample_payload(), &key, "k", true).unwrap();

        let flipped_last = {
            let mut chars: Vec<char> = jws.chars().collect();
            let last = *chars.last().unwrap();
            *chars.last_mut().unwrap() = if last == 'A' { 'B' } else { 'A' };
            chars.into_iter().collect::<String>()
        };

        let err = processor.verify(&flipped_last, &key.public_key()).unwrap_err();
        assert!(err.is_jws_error());
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();

        // Sign uncompressed so the payload part is directly editable JSON.
        let jws = processor.sign(&sample_payload(), &key, "k", false).unwrap();
        let parts: Vec<&str> = jws.split('.').collect();

        let mut payload: Value =
            serde_json::from_slice(&base64url::decode(parts[1]).unwrap()).unwrap();
        payload["iss"] = json!("https://attacker.example.org");
        let tampered_payload = base64url::encode(&serde_json::to_vec(&payload).unwrap());
        let tampered = format!("{}.{tampered_payload}.{}", parts[0], parts[2]);

        assert!(processor.verify(&tampered, &key.public_key()).is_err());
    }

    #[test]
    fn test_zip_header_is_authoritative() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();

        // Signed with compression, then the zip member is stripped and the
        // token re-signed: the same payload bytes no longer verify as a
        // payload because the header now says they are uncompressed JSON.
        let jws = processor.sign(&sample_payload(), &key, "k", true).unwrap();
        let parts: Vec<&str> = jws.split('.').collect();

        let stripped_header =
            base64url::encode(&serde_json::to_vec(&json!({"alg": "ES256", "kid": "k", "typ": "JWT"})).unwrap());
        let signing_input = format!("{stripped_header}.{}", parts[1]);
        let signature = base64url::encode(&key.sign(signing_input.as_bytes()));
        let reheadered = format!("{signing_input}.{signature}");

        let err = processor.verify(&reheadered, &key.public_key()).unwrap_err();
        assert!(err.is_jws_error());
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_verify_rejects_unknown_zip_value() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();
        let jws = processor.sign(&sample_payload(), &key, "k", true).unwrap();
        let parts: Vec<&str> = jws.split('.').collect();

        let gzip_header = base64url::encode(
            &serde_json::to_vec(&json!({"alg": "ES256", "kid": "k", "typ": "JWT", "zip": "GZIP"}))
                .unwrap(),
        );
        let signing_input = format!("{gzip_header}.{}", parts[1]);
        let signature = base64url::encode(&key.sign(signing_input.as_bytes()));
        let forged = format!("{signing_input}.{signature}");

        let err = processor.verify(&forged, &key.public_key()).unwrap_err();
        assert!(err.to_string().contains("unsupported zip"));
    }

    #[test]
    fn test_verify_preserves_unknown_claims() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();

        let mut payload = sample_payload();
        payload
            .extra
            .insert("jti".to_string(), json!("card-0001"));
        let jws = processor.sign(&payload, &key, "k", true).unwrap();

        let verified = processor.verify(&jws, &key.public_key()).unwrap();
        assert_eq!(verified.extra["jti"], "card-0001");
    }

    #[test]
    fn test_decode_without_key() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();
        let jws = processor.sign(&sample_payload(), &key, "issuer-key", true).unwrap();

        let decoded = processor.decode(&jws).unwrap();
        assert_eq!(decoded.header.kid, "issuer-key");
        assert_eq!(decoded.header.zip.as_deref(), Some("DEF"));
        assert_eq!(decoded.payload.iss, "https://issuer.example.org");
    }

    #[test]
    fn test_decode_rejects_structurally_invalid_payload() {
        let key = Es256PrivateKey::generate();
        let processor = JwsProcessor::new();

        // Hand-assemble a token whose payload is valid JSON but violates the
        // claim invariants (empty iss).
        let header = base64url::encode(
            &serde_json::to_vec(&json!({"alg": "ES256", "kid": "k", "typ": "JWT"})).unwrap(),
        );
        let payload = base64url::encode(
            &serde_json::to_vec(&json!({
                "iss": "",
                "nbf": 1_700_000_000,
                "vc": serde_json::to_value(sample_vc()).unwrap()
            }))
            .unwrap(),
        );
        let signing_input = format!("{header}.{payload}");
        let signature = base64url::encode(&key.sign(signing_input.as_bytes()));

        let err = processor
            .decode(&format!("{signing_input}.{signature}"))
            .unwrap_err();
        assert!(err.to_string().contains("iss"));
    }
}
