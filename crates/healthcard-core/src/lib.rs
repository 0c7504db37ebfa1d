//! # healthcard-core
//!
//! Core building blocks for SMART Health Cards: the error taxonomy, the
//! byte-level codecs, FHIR Bundle processing, and the Verifiable Credential
//! envelope.
//!
//! The crates above this one compose these pieces into the full pipeline:
//! `healthcard-jws` signs and verifies, `healthcard-qr` turns tokens into QR
//! content, and `healthcard` exposes the facade.

pub mod bundle;
pub mod codec;
pub mod error;
pub mod vc;

pub use bundle::{BUNDLE_TYPE_COLLECTION, FhirBundleProcessor};
pub use error::{ErrorCode, HealthCardError, Result};
pub use vc::{
    CredentialSubject, DEFAULT_FHIR_VERSION, HEALTH_CARD_VC_TYPE, VcClaim, VcOptions,
    VerifiableCredential, VerifiableCredentialProcessor,
};
