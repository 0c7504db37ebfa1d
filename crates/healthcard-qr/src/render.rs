//! QR symbol construction and PNG rasterization.
//!
//! A health card QR always carries exactly two segments: the `shc:/` prefix
//! in byte mode and the numeric payload in numeric mode.

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::bits::Bits;
use qrcode::{EcLevel, QrCode, Version};

use healthcard_core::error::{HealthCardError, Result};

use crate::generator::QrEncodeOptions;

/// Error correction level for a QR symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCorrectionLevel {
    /// ~7% recovery (the SMART Health Cards default).
    #[default]
    Low,
    /// ~15% recovery.
    Medium,
    /// ~25% recovery.
    Quartile,
    /// ~30% recovery.
    High,
}

impl ErrorCorrectionLevel {
    /// Convert to the `qrcode` crate level type.
    pub fn to_ec_level(self) -> EcLevel {
        match self {
            Self::Low => EcLevel::L,
            Self::Medium => EcLevel::M,
            Self::Quartile => EcLevel::Q,
            Self::High => EcLevel::H,
        }
    }
}

/// Build a two-segment QR symbol: byte-mode `prefix`, numeric-mode `digits`.
///
/// With no fixed version configured, the smallest version that fits at the
/// configured error correction level is selected.
pub(crate) fn encode_symbol(
    prefix: &str,
    digits: &str,
    options: &QrEncodeOptions,
) -> Result<QrCode> {
    let ec_level = options.error_correction.to_ec_level();

    let versions: Vec<i16> = match options.version {
        Some(v) => vec![v],
        None => (1..=40).collect(),
    };

    for version in versions {
        if let Some(code) = try_version(Version::Normal(version), ec_level, prefix, digits) {
            return Ok(code);
        }
    }

    Err(HealthCardError::qr_code(format!(
        "QR content of {} digits does not fit any permitted symbol version",
        digits.len()
    )))
}

fn try_version(version: Version, ec_level: EcLevel, prefix: &str, digits: &str) -> Option<QrCode> {
    let mut bits = Bits::new(version);
    bits.push_byte_data(prefix.as_bytes()).ok()?;
    bits.push_numeric_data(digits.as_bytes()).ok()?;
    bits.push_terminator(ec_level).ok()?;
    QrCode::with_bits(bits, ec_level).ok()
}

/// Rasterize a symbol to a `data:image/png;base64,<payload>` URL.
pub(crate) fn render_png_data_url(code: &QrCode, options: &QrEncodeOptions) -> Result<String> {
    let modules = code.to_colors();
    let width = code.width();
    let margin = options.margin as usize;
    let scale = options.scale.max(1) as usize;
    let dimension = ((width + 2 * margin) * scale) as u32;

    let mut img = RgbImage::from_pixel(dimension, dimension, Rgb(options.light_color));
    for (index, module) in modules.iter().enumerate() {
        if *module != qrcode::Color::Dark {
            continue;
        }
        let module_x = (index % width + margin) * scale;
        let module_y = (index / width + margin) * scale;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(
                    (module_x + dx) as u32,
                    (module_y + dy) as u32,
                    Rgb(options.dark_color),
                );
            }
        }
    }

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| HealthCardError::qr_code(format!("PNG rendering failed: {e}")))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}
