//! # healthcard-qr
//!
//! QR transport for SMART Health Cards: the numeric `shc:/` content format,
//! chunked multi-symbol sets, PNG rasterization, and scan-side reassembly.
//!
//! The generate side turns a compact JWS into one or more
//! `data:image/png;base64,<payload>` URLs; the scan side accepts decoded QR content
//! strings and recovers the JWS. Camera capture and image decoding belong to
//! the host application.

pub mod generator;
pub mod render;
pub mod scan;

pub use generator::{QrEncodeOptions, QrGenerator, QrGeneratorConfig, SHC_PREFIX};
pub use render::ErrorCorrectionLevel;
pub use scan::scan_qr;
