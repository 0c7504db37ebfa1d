//! The `SmartHealthCard` facade.

use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use healthcard_core::bundle::FhirBundleProcessor;
use healthcard_core::error::{HealthCardError, Result};
use healthcard_core::vc::{VcOptions, VerifiableCredential, VerifiableCredentialProcessor};
use healthcard_jws::{Es256PublicKey, JwsProcessor, JwtPayload};

use crate::config::SmartHealthCardConfig;

/// Creates and verifies SMART Health Cards.
///
/// Each operation is a one-shot value transformation: a FHIR Bundle in, a
/// signed JWS out, and back again. The facade holds only immutable
/// configuration, so a single instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct SmartHealthCard {
    config: SmartHealthCardConfig,
    bundles: FhirBundleProcessor,
    credentials: VerifiableCredentialProcessor,
    jws: JwsProcessor,
}

impl SmartHealthCard {
    /// Create a facade from configuration.
    pub fn new(config: SmartHealthCardConfig) -> Self {
        Self {
            config,
            bundles: FhirBundleProcessor::new(),
            credentials: VerifiableCredentialProcessor::new(),
            jws: JwsProcessor::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SmartHealthCardConfig {
        &self.config
    }

    /// Issue a signed health card for a FHIR Bundle.
    ///
    /// Runs the processing pipeline strictly in order: normalize (with the
    /// QR optimization rewrite when enabled), wrap in a Verifiable
    /// Credential, build the JWT with `nbf = now` (and `exp` when an
    /// expiration is configured), then compress and sign.
    ///
    /// # Errors
    ///
    /// Returns a `FHIR_VALIDATION_ERROR` for structurally invalid bundles
    /// and a `JWS_ERROR` for signing failures.
    pub fn create(&self, bundle: &Value, options: Option<&VcOptions>) -> Result<String> {
        let processed = if self.config.enable_qr_optimization {
            self.bundles.process_for_qr(bundle)?
        } else {
            self.bundles.process(bundle)?
        };

        let default_options = VcOptions::default();
        let credential = self
            .credentials
            .create(&processed, options.unwrap_or(&default_options));

        let nbf = OffsetDateTime::now_utc().unix_timestamp();
        let exp = self.config.expiration_seconds.map(|seconds| nbf + seconds);
        let payload = JwtPayload::new(&self.config.issuer, nbf, exp, credential.vc);

        let jws = self.jws.sign(
            &payload,
            &self.config.private_key,
            &self.config.kid,
            self.config.enable_compression,
        )?;
        debug!(issuer = %self.config.issuer, "created health card");
        Ok(jws)
    }

    /// Verify a health card JWS and return its Verifiable Credential.
    ///
    /// # Errors
    ///
    /// Returns a `VERIFICATION_ERROR` if no public key is configured, a
    /// `JWS_ERROR` if the token fails cryptographic or format checks, and a
    /// `FHIR_VALIDATION_ERROR` if the embedded credential is structurally
    /// invalid.
    pub fn verify(&self, jws: &str) -> Result<VerifiableCredential> {
        let public_key = self.public_key()?;
        let payload = self.jws.verify(jws, public_key)?;

        let credential = VerifiableCredential { vc: payload.vc };
        self.credentials.validate(&credential)?;
        debug!(iss = %payload.iss, "verified health card");
        Ok(credential)
    }

    /// Verify a health card and return just its FHIR Bundle.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::verify`].
    pub fn get_bundle(&self, jws: &str) -> Result<Value> {
        Ok(self.verify(jws)?.vc.credential_subject.fhir_bundle)
    }

    fn public_key(&self) -> Result<&Es256PublicKey> {
        self.config.public_key.as_ref().ok_or_else(|| {
            HealthCardError::verification("no public key configured for verification")
        })
    }
}
