//! Facade configuration.

use healthcard_jws::{Es256PrivateKey, Es256PublicKey};

/// Configuration for a [`crate::SmartHealthCard`] instance.
///
/// Immutable once the facade is constructed; a facade holding this
/// configuration is safe to share across threads.
#[derive(Debug, Clone)]
pub struct SmartHealthCardConfig {
    /// Issuer URI placed in the JWT `iss` claim.
    pub issuer: String,

    /// Signing key for card creation.
    pub private_key: Es256PrivateKey,

    /// Verification key; required only for the verify operations.
    pub public_key: Option<Es256PublicKey>,

    /// Key ID placed in the protected header, conventionally the public
    /// key's RFC 7638 thumbprint.
    pub kid: String,

    /// When set, cards carry `exp = nbf + expiration_seconds`.
    pub expiration_seconds: Option<i64>,

    /// Apply the QR size-reduction rewrite during creation (default on).
    pub enable_qr_optimization: bool,

    /// Compress payloads with raw DEFLATE and signal `zip: "DEF"`
    /// (default on).
    pub enable_compression: bool,
}

impl SmartHealthCardConfig {
    /// Create a configuration with the required fields and defaults for the
    /// rest.
    pub fn new(
        issuer: impl Into<String>,
        private_key: Es256PrivateKey,
        kid: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            private_key,
            public_key: None,
            kid: kid.into(),
            expiration_seconds: None,
            enable_qr_optimization: true,
            enable_compression: true,
        }
    }

    /// Set the verification key, enabling the verify operations.
    pub fn with_public_key(mut self, public_key: Es256PublicKey) -> Self {
        self.public_key = Some(public_key);
        self
    }

    /// Set the card lifetime in seconds.
    pub fn with_expiration_seconds(mut self, seconds: i64) -> Self {
        self.expiration_seconds = Some(seconds);
        self
    }

    /// Enable or disable the QR optimization rewrite.
    pub fn with_qr_optimization(mut self, enabled: bool) -> Self {
        self.enable_qr_optimization = enabled;
        self
    }

    /// Enable or disable payload compression.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}
