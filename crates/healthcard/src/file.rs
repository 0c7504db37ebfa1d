//! The `.smart-health-card` file wrapper.
//!
//! A health card file is a UTF-8 JSON document
//! `{"verifiableCredential":[<jws>, ...]}` served as
//! `application/smart-health-card`. This library writes single-entry arrays
//! and accepts any non-empty array on read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use healthcard_core::error::{HealthCardError, Result};
use healthcard_core::vc::VerifiableCredential;

use crate::card::SmartHealthCard;

/// MIME type for `.smart-health-card` files.
pub const SMART_HEALTH_CARD_MIME: &str = "application/smart-health-card";

/// Conventional file extension.
pub const SMART_HEALTH_CARD_EXTENSION: &str = ".smart-health-card";

/// The JSON shape of a health card file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCardFile {
    /// One or more compact JWS strings.
    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<String>,
}

/// File content paired with its MIME type, for hosts that serve downloads.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCardBlob {
    /// UTF-8 JSON bytes of the wrapper document.
    pub bytes: Vec<u8>,

    /// Always [`SMART_HEALTH_CARD_MIME`].
    pub content_type: &'static str,
}

impl SmartHealthCard {
    /// Issue a card and wrap it as `.smart-health-card` file content.
    ///
    /// # Errors
    ///
    /// Propagates creation failures; wrapper serialization failures surface
    /// as a `CREATION_ERROR`.
    pub fn create_file(&self, bundle: &Value) -> Result<String> {
        let jws = self.create(bundle, None)?;
        serde_json::to_string(&HealthCardFile {
            verifiable_credential: vec![jws],
        })
        .map_err(|e| HealthCardError::creation(format!("file serialization failed: {e}")))
    }

    /// Issue a card as a file blob with the `application/smart-health-card`
    /// MIME type.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::create_file`].
    pub fn create_file_blob(&self, bundle: &Value) -> Result<HealthCardBlob> {
        Ok(HealthCardBlob {
            bytes: self.create_file(bundle)?.into_bytes(),
            content_type: SMART_HEALTH_CARD_MIME,
        })
    }

    /// Verify the first card in `.smart-health-card` file content.
    ///
    /// # Errors
    ///
    /// Returns a `FILE_FORMAT_ERROR` if the content is not a JSON object
    /// with a non-empty `verifiableCredential` string array; verification
    /// failures of the entry itself propagate unchanged.
    pub fn verify_file(&self, contents: &str) -> Result<VerifiableCredential> {
        let file = parse_file(contents)?;
        self.verify(&file.verifiable_credential[0])
    }

    /// Verify every card in `.smart-health-card` file content.
    ///
    /// # Errors
    ///
    /// Returns a `FILE_FORMAT_ERROR` for wrapper shape violations and a
    /// `FILE_VERIFICATION_ERROR` naming the first entry that fails to
    /// verify.
    pub fn verify_file_all(&self, contents: &str) -> Result<Vec<VerifiableCredential>> {
        let file = parse_file(contents)?;
        file.verifiable_credential
            .iter()
            .enumerate()
            .map(|(index, jws)| {
                self.verify(jws).map_err(|e| {
                    HealthCardError::file_verification(format!(
                        "verifiableCredential[{index}] failed to verify: {e}"
                    ))
                })
            })
            .collect()
    }
}

fn parse_file(contents: &str) -> Result<HealthCardFile> {
    let file: HealthCardFile = serde_json::from_str(contents).map_err(|e| {
        HealthCardError::file_format(format!(
            "content is not a JSON object with a verifiableCredential array: {e}"
        ))
    })?;

    if file.verifiable_credential.is_empty() {
        return Err(HealthCardError::file_format(
            "verifiableCredential array is empty",
        ));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmartHealthCardConfig;
    use healthcard_jws::Es256PrivateKey;
    use serde_json::json;

    fn facade() -> SmartHealthCard {
        let key = Es256PrivateKey::generate();
        let public = key.public_key();
        SmartHealthCard::new(
            SmartHealthCardConfig::new("https://issuer.example.org", key, "k")
                .with_public_key(public),
        )
    }

    fn sample_bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [{"resource": {"resourceType": "Patient"}}]
        })
    }

    #[test]
    fn test_create_file_wire_shape() {
        let card = facade();
        let contents = card.create_file(&sample_bundle()).unwrap();

        let parsed: Value = serde_json::from_str(&contents).unwrap();
        let entries = parsed["verifiableCredential"].as_array().unwrap();
        assert_eq!(entries.len(), 1);

        // Exactly the wrapper object, nothing else.
        assert_eq!(parsed.as_object().unwrap().len(), 1);
        assert!(contents.starts_with("{\"verifiableCredential\":[\""));
    }

    #[test]
    fn test_file_round_trip() {
        let card = facade();
        let contents = card.create_file(&sample_bundle()).unwrap();
        let credential = card.verify_file(&contents).unwrap();
        assert_eq!(
            credential.vc.credential_subject.fhir_bundle["resourceType"],
            "Bundle"
        );
    }

    #[test]
    fn test_blob_mime_type() {
        let card = facade();
        let blob = card.create_file_blob(&sample_bundle()).unwrap();
        assert_eq!(blob.content_type, "application/smart-health-card");

        let text = String::from_utf8(blob.bytes).unwrap();
        assert!(card.verify_file(&text).is_ok());
    }

    #[test]
    fn test_verify_file_rejects_wrong_shapes() {
        let card = facade();
        for bad in [
            "not json",
            "{}",
            "{\"verifiableCredential\":\"jws\"}",
            "{\"verifiableCredential\":[1,2]}",
            "[]",
        ] {
            let err = card.verify_file(bad).unwrap_err();
            assert_eq!(err.code().as_str(), "FILE_FORMAT_ERROR", "input: {bad}");
        }
    }

    #[test]
    fn test_verify_file_rejects_empty_array() {
        let card = facade();
        let err = card
            .verify_file("{\"verifiableCredential\":[]}")
            .unwrap_err();
        assert_eq!(err.code().as_str(), "FILE_FORMAT_ERROR");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_verify_file_uses_first_entry() {
        let card = facade();
        let jws = card.create(&sample_bundle(), None).unwrap();
        let contents = serde_json::to_string(&HealthCardFile {
            verifiable_credential: vec![jws, "not.a.card".to_string()],
        })
        .unwrap();

        assert!(card.verify_file(&contents).is_ok());
    }

    #[test]
    fn test_verify_file_all() {
        let card = facade();
        let jws1 = card.create(&sample_bundle(), None).unwrap();
        let jws2 = card.create(&sample_bundle(), None).unwrap();
        let contents = serde_json::to_string(&HealthCardFile {
            verifiable_credential: vec![jws1, jws2],
        })
        .unwrap();

        assert_eq!(card.verify_file_all(&contents).unwrap().len(), 2);
    }

    #[test]
    fn test_verify_file_all_names_failing_entry() {
        let card = facade();
        let jws = card.create(&sample_bundle(), None).unwrap();
        let contents = serde_json::to_string(&HealthCardFile {
            verifiable_credential: vec![jws, "broken".to_string()],
        })
        .unwrap();

        let err = card.verify_file_all(&contents).unwrap_err();
        assert_eq!(err.code().as_str(), "FILE_VERIFICATION_ERROR");
        assert!(err.to_string().contains("verifiableCredential[1]"));
    }

    #[test]
    fn test_bubbled_verification_error_keeps_its_code() {
        let card = facade();
        let contents = "{\"verifiableCredential\":[\"a.b.c\"]}";
        let err = card.verify_file(contents).unwrap_err();
        // The entry itself is malformed; the JWS error propagates unchanged.
        assert!(err.is_jws_error());
    }
}
