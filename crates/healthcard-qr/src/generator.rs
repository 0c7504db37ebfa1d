//! QR generation: numeric transcoding, chunking, and rasterization.

use tracing::debug;

use healthcard_core::codec::numeric;
use healthcard_core::error::{HealthCardError, Result};

use crate::render::{self, ErrorCorrectionLevel};

/// QR content prefix for single-symbol cards.
pub const SHC_PREFIX: &str = "shc:/";

/// Characters reserved for the `i/N/` chunk header when splitting.
const CHUNK_HEADER_RESERVE: usize = 20;

// =============================================================================
// Options
// =============================================================================

/// Rasterization options passed through to symbol encoding and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrEncodeOptions {
    /// Error correction level (default low).
    pub error_correction: ErrorCorrectionLevel,

    /// Pixels per module (default 4).
    pub scale: u32,

    /// Quiet zone width in modules (default 1).
    pub margin: u32,

    /// Module color (default black).
    pub dark_color: [u8; 3],

    /// Background color (default white).
    pub light_color: [u8; 3],

    /// Fixed symbol version `1..=40`; `None` selects the smallest fit.
    pub version: Option<i16>,
}

impl Default for QrEncodeOptions {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrectionLevel::Low,
            scale: 4,
            margin: 1,
            dark_color: [0, 0, 0],
            light_color: [255, 255, 255],
            version: None,
        }
    }
}

impl QrEncodeOptions {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error correction level.
    pub fn with_error_correction(mut self, level: ErrorCorrectionLevel) -> Self {
        self.error_correction = level;
        self
    }

    /// Set the pixels-per-module scale.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the quiet zone width in modules.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the module and background colors.
    pub fn with_colors(mut self, dark: [u8; 3], light: [u8; 3]) -> Self {
        self.dark_color = dark;
        self.light_color = light;
        self
    }

    /// Pin the symbol version instead of auto-selecting.
    pub fn with_version(mut self, version: i16) -> Self {
        self.version = Some(version);
        self
    }
}

/// Configuration for [`QrGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrGeneratorConfig {
    /// Longest JWS (in characters) emitted as a single QR (default 1195).
    pub max_single_qr_size: usize,

    /// Whether oversized tokens are split across chunked QRs (default off).
    pub enable_chunking: bool,

    /// Rasterization options.
    pub encode: QrEncodeOptions,
}

impl Default for QrGeneratorConfig {
    fn default() -> Self {
        Self {
            max_single_qr_size: 1195,
            enable_chunking: false,
            encode: QrEncodeOptions::default(),
        }
    }
}

impl QrGeneratorConfig {
    /// Create a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the single-QR size limit.
    pub fn with_max_single_qr_size(mut self, size: usize) -> Self {
        self.max_single_qr_size = size;
        self
    }

    /// Enable or disable chunked output.
    pub fn with_chunking(mut self, enabled: bool) -> Self {
        self.enable_chunking = enabled;
        self
    }

    /// Set the rasterization options.
    pub fn with_encode_options(mut self, options: QrEncodeOptions) -> Self {
        self.encode = options;
        self
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Turns a signed JWS into one or more QR images.
#[derive(Debug, Clone, Default)]
pub struct QrGenerator {
    config: QrGeneratorConfig,
}

impl QrGenerator {
    /// Create a generator with the given configuration.
    pub fn new(config: QrGeneratorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &QrGeneratorConfig {
        &self.config
    }

    /// Encode a JWS as QR images, returned as PNG data URLs.
    ///
    /// A token no longer than `max_single_qr_size` becomes one
    /// `shc:/<digits>` symbol. A longer token is split into `shc:/i/N/<digits>`
    /// chunks when chunking is enabled, in chunk order.
    ///
    /// # Errors
    ///
    /// Returns a `QR_CODE_ERROR` if the token is empty, exceeds the size
    /// limit with chunking disabled, contains non-encodable characters, or
    /// does not fit a QR symbol.
    pub fn generate_qr(&self, jws: &str) -> Result<Vec<String>> {
        if jws.is_empty() {
            return Err(HealthCardError::qr_code("cannot encode an empty JWS"));
        }

        let max = self.config.max_single_qr_size;
        if jws.len() > max && !self.config.enable_chunking {
            return Err(HealthCardError::qr_code(format!(
                "JWS length {} exceeds the single QR limit of {max} and chunking is disabled",
                jws.len()
            )));
        }

        let digits = numeric::encode_jws(jws)?;

        if jws.len() <= max {
            debug!(jws_len = jws.len(), "encoding single health card QR");
            let code = render::encode_symbol(SHC_PREFIX, &digits, &self.config.encode)?;
            return Ok(vec![render::render_png_data_url(&code, &self.config.encode)?]);
        }

        if max <= CHUNK_HEADER_RESERVE {
            return Err(HealthCardError::qr_code(format!(
                "max_single_qr_size {max} leaves no room for chunk headers"
            )));
        }

        let chunk_count = digits.len().div_ceil(max - CHUNK_HEADER_RESERVE);
        let chunk_size = digits.len().div_ceil(chunk_count);
        debug!(
            jws_len = jws.len(),
            chunk_count, "encoding chunked health card QR set"
        );

        let mut urls = Vec::with_capacity(chunk_count);
        for (index, chunk) in digits.as_bytes().chunks(chunk_size).enumerate() {
            let chunk = std::str::from_utf8(chunk)
                .expect("numeric data is ASCII, so any byte split is valid UTF-8");
            let prefix = format!("shc:/{}/{}/", index + 1, chunk_count);
            let code = render::encode_symbol(&prefix, chunk, &self.config.encode)?;
            urls.push(render::render_png_data_url(&code, &self.config.encode)?);
        }
        Ok(urls)
    }

    /// Reassemble decoded QR content into the original JWS.
    ///
    /// Delegates to [`crate::scan::scan_qr`]; the generator configuration
    /// plays no part in scanning.
    ///
    /// # Errors
    ///
    /// See [`crate::scan::scan_qr`].
    pub fn scan_qr(&self, contents: &[String]) -> Result<String> {
        crate::scan::scan_qr(contents)
    }
}
