//! W3C Verifiable Credential envelope for health card payloads.
//!
//! The envelope is typed rather than ad-hoc JSON: the `vc` claim, its `type`
//! array, and the `credentialSubject` are serde structs that serialize in
//! wire order. Unknown members are carried through flattened maps so
//! credentials from other issuers validate without loss.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bundle::FhirBundleProcessor;
use crate::error::{HealthCardError, Result};

/// The credential type URI every SMART Health Card must carry.
pub const HEALTH_CARD_VC_TYPE: &str = "https://smarthealth.cards#health-card";

/// FHIR release used when the caller does not specify one.
pub const DEFAULT_FHIR_VERSION: &str = "4.0.1";

static FHIR_VERSION_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\d+\.\d+\.\d+$").expect("Invalid fhirVersion regex")
});

/// A W3C Verifiable Credential wrapping a FHIR Bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    /// The `vc` claim as it appears in the JWT payload.
    pub vc: VcClaim,
}

/// The `vc` claim body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcClaim {
    /// Credential type URIs; must include [`HEALTH_CARD_VC_TYPE`].
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// The clinical payload.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,

    /// Members this library does not model (e.g. `@context` from older
    /// issuers) are preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `credentialSubject` of a health card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    /// FHIR release the bundle conforms to, `major.minor.patch`.
    #[serde(rename = "fhirVersion")]
    pub fhir_version: String,

    /// The (processed) FHIR Bundle.
    #[serde(rename = "fhirBundle")]
    pub fhir_bundle: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for credential construction.
#[derive(Debug, Clone, Default)]
pub struct VcOptions {
    /// Overrides [`DEFAULT_FHIR_VERSION`].
    pub fhir_version: Option<String>,

    /// Type URIs appended after [`HEALTH_CARD_VC_TYPE`].
    pub additional_types: Vec<String>,
}

impl VcOptions {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FHIR version string.
    pub fn with_fhir_version(mut self, version: impl Into<String>) -> Self {
        self.fhir_version = Some(version.into());
        self
    }

    /// Append an additional credential type URI.
    pub fn with_additional_type(mut self, type_uri: impl Into<String>) -> Self {
        self.additional_types.push(type_uri.into());
        self
    }
}

/// Builds and validates Verifiable Credential envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifiableCredentialProcessor;

impl VerifiableCredentialProcessor {
    /// Create a new processor.
    pub fn new() -> Self {
        Self
    }

    /// Wrap a processed Bundle in a credential envelope.
    ///
    /// The bundle is expected to have gone through
    /// [`FhirBundleProcessor::process`] or
    /// [`FhirBundleProcessor::process_for_qr`] already; it is copied, not
    /// moved.
    pub fn create(&self, bundle: &Value, options: &VcOptions) -> VerifiableCredential {
        let mut types = vec![HEALTH_CARD_VC_TYPE.to_string()];
        types.extend(options.additional_types.iter().cloned());

        VerifiableCredential {
            vc: VcClaim {
                types,
                credential_subject: CredentialSubject {
                    fhir_version: options
                        .fhir_version
                        .clone()
                        .unwrap_or_else(|| DEFAULT_FHIR_VERSION.to_string()),
                    fhir_bundle: bundle.clone(),
                    extra: Map::new(),
                },
                extra: Map::new(),
            },
        }
    }

    /// Enforce the credential invariants.
    ///
    /// # Errors
    ///
    /// Returns a `FHIR_VALIDATION_ERROR` naming the first offending field:
    /// a missing health-card type URI, a malformed `fhirVersion`, or a
    /// structurally invalid `fhirBundle`.
    pub fn validate(&self, credential: &VerifiableCredential) -> Result<()> {
        let vc = &credential.vc;

        if !vc.types.iter().any(|t| t == HEALTH_CARD_VC_TYPE) {
            return Err(HealthCardError::fhir_validation(format!(
                "vc.type must include \"{HEALTH_CARD_VC_TYPE}\""
            )));
        }

        let subject = &vc.credential_subject;
        if !FHIR_VERSION_REGEX.is_match(&subject.fhir_version) {
            return Err(HealthCardError::fhir_validation(format!(
                "vc.credentialSubject.fhirVersion must match major.minor.patch, got \"{}\"",
                subject.fhir_version
            )));
        }

        FhirBundleProcessor::new().validate(&subject.fhir_bundle)
    }
}
