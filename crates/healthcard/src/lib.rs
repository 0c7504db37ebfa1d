//! # healthcard
//!
//! SMART Health Cards for Rust: compact, cryptographically signed,
//! patient-shareable medical records.
//!
//! A caller supplies a FHIR R4 Bundle and an ES256 signing key; the library
//! yields a signed, compressed JWS that can be stored in a
//! `.smart-health-card` file, encoded as one or more QR images, and later
//! verified back to the original Bundle.
//!
//! ## Modules
//!
//! - [`card`] - the [`SmartHealthCard`] facade
//! - [`config`] - facade configuration and builder
//! - [`file`] - the `.smart-health-card` file wrapper
//!
//! The pipeline stages are first-class components in the companion crates:
//! `healthcard_core` (codecs, Bundle and credential processing),
//! `healthcard_jws` (keys and compact JWS), and `healthcard_qr` (QR
//! transport).
//!
//! ## Example
//!
//! ```
//! use healthcard::prelude::*;
//! use serde_json::json;
//!
//! let key = Es256PrivateKey::generate();
//! let public = key.public_key();
//! let kid = public.thumbprint();
//!
//! let card = SmartHealthCard::new(
//!     SmartHealthCardConfig::new("https://issuer.example.org", key, kid)
//!         .with_public_key(public),
//! );
//!
//! let bundle = json!({
//!     "resourceType": "Bundle",
//!     "type": "collection",
//!     "entry": [{"resource": {"resourceType": "Patient"}}]
//! });
//!
//! let jws = card.create(&bundle, None)?;
//! let credential = card.verify(&jws)?;
//! assert_eq!(
//!     credential.vc.credential_subject.fhir_bundle["resourceType"],
//!     "Bundle"
//! );
//! # Ok::<(), healthcard::HealthCardError>(())
//! ```

pub mod card;
pub mod config;
pub mod file;

pub use card::SmartHealthCard;
pub use config::SmartHealthCardConfig;
pub use file::{
    HealthCardBlob, HealthCardFile, SMART_HEALTH_CARD_EXTENSION, SMART_HEALTH_CARD_MIME,
};

pub use healthcard_core::bundle::FhirBundleProcessor;
pub use healthcard_core::error::{ErrorCode, HealthCardError, Result};
pub use healthcard_core::vc::{
    VcClaim, VcOptions, VerifiableCredential, VerifiableCredentialProcessor,
};
pub use healthcard_jws::{
    DecodedJws, Es256PrivateKey, Es256PublicKey, Jwk, JwsProcessor, JwtPayload,
};
pub use healthcard_qr::{
    ErrorCorrectionLevel, QrEncodeOptions, QrGenerator, QrGeneratorConfig, scan_qr,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use healthcard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::card::SmartHealthCard;
    pub use crate::config::SmartHealthCardConfig;
    pub use crate::file::{HealthCardBlob, HealthCardFile, SMART_HEALTH_CARD_MIME};
    pub use healthcard_core::bundle::FhirBundleProcessor;
    pub use healthcard_core::error::{ErrorCode, HealthCardError, Result};
    pub use healthcard_core::vc::{VcOptions, VerifiableCredential, VerifiableCredentialProcessor};
    pub use healthcard_jws::{Es256PrivateKey, Es256PublicKey, JwsProcessor};
    pub use healthcard_qr::{QrGenerator, QrGeneratorConfig, scan_qr};
}
