use thiserror::Error;

/// Error type for all SMART Health Card operations.
///
/// Every failure in the encode/decode pipeline maps onto one of these
/// variants. Each variant carries a human-readable message and a stable
/// [`ErrorCode`] for programmatic matching; messages never contain key
/// material or signature bytes.
#[derive(Debug, Error)]
pub enum HealthCardError {
    /// A FHIR Bundle or Verifiable Credential failed structural validation.
    #[error("FHIR validation error: {0}")]
    FhirValidation(String),

    /// JWS signing, verification, key import, compression, or format failure.
    #[error("JWS error: {0}")]
    Jws(String),

    /// Numeric transcoding or QR content assembly/reassembly failure.
    #[error("QR code error: {0}")]
    QrCode(String),

    /// A `.smart-health-card` wrapper does not have the expected shape.
    #[error("File format error: {0}")]
    FileFormat(String),

    /// A wrapper entry could not be verified.
    #[error("File verification error: {0}")]
    FileVerification(String),

    /// Facade-level verification precondition failure.
    #[error("Verification error: {0}")]
    Verification(String),

    /// Facade-level creation failure.
    #[error("Creation error: {0}")]
    Creation(String),
}

impl HealthCardError {
    /// Create a new `FhirValidation` error.
    pub fn fhir_validation(message: impl Into<String>) -> Self {
        Self::FhirValidation(message.into())
    }

    /// Create a new `Jws` error.
    pub fn jws(message: impl Into<String>) -> Self {
        Self::Jws(message.into())
    }

    /// Create a new `QrCode` error.
    pub fn qr_code(message: impl Into<String>) -> Self {
        Self::QrCode(message.into())
    }

    /// Create a new `FileFormat` error.
    pub fn file_format(message: impl Into<String>) -> Self {
        Self::FileFormat(message.into())
    }

    /// Create a new `FileVerification` error.
    pub fn file_verification(message: impl Into<String>) -> Self {
        Self::FileVerification(message.into())
    }

    /// Create a new `Verification` error.
    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification(message.into())
    }

    /// Create a new `Creation` error.
    pub fn creation(message: impl Into<String>) -> Self {
        Self::Creation(message.into())
    }

    /// Get the stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FhirValidation(_) => ErrorCode::FhirValidationError,
            Self::Jws(_) => ErrorCode::JwsError,
            Self::QrCode(_) => ErrorCode::QrCodeError,
            Self::FileFormat(_) => ErrorCode::FileFormatError,
            Self::FileVerification(_) => ErrorCode::FileVerificationError,
            Self::Verification(_) => ErrorCode::VerificationError,
            Self::Creation(_) => ErrorCode::CreationError,
        }
    }

    /// Check if this error came from structural validation of clinical data.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::FhirValidation(_))
    }

    /// Check if this error came from the cryptographic layer.
    pub fn is_jws_error(&self) -> bool {
        matches!(self, Self::Jws(_))
    }

    /// Check if this error came from QR encoding or decoding.
    pub fn is_qr_error(&self) -> bool {
        matches!(self, Self::QrCode(_))
    }

    /// Check if this error came from the file wrapper or facade layer.
    pub fn is_facade_error(&self) -> bool {
        matches!(
            self,
            Self::FileFormat(_)
                | Self::FileVerification(_)
                | Self::Verification(_)
                | Self::Creation(_)
        )
    }
}

/// Stable error codes, one per failure kind on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FhirValidationError,
    JwsError,
    QrCodeError,
    FileFormatError,
    FileVerificationError,
    VerificationError,
    CreationError,
}

impl ErrorCode {
    /// Get the code as its stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FhirValidationError => "FHIR_VALIDATION_ERROR",
            Self::JwsError => "JWS_ERROR",
            Self::QrCodeError => "QR_CODE_ERROR",
            Self::FileFormatError => "FILE_FORMAT_ERROR",
            Self::FileVerificationError => "FILE_VERIFICATION_ERROR",
            Self::VerificationError => "VERIFICATION_ERROR",
            Self::CreationError => "CREATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Convenience result type for health card operations.
pub type Result<T> = std::result::Result<T, HealthCardError>;
