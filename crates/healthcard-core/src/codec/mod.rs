//! Byte-precise codec primitives with no domain knowledge.
//!
//! Three transformations, each with an exact inverse:
//!
//! - [`base64url`] - RFC 4648 §5 encoding without padding
//! - [`deflate`] - raw RFC 1951 compression (no zlib or gzip wrapper)
//! - [`numeric`] - the SMART Health Cards `ord(c) - 45` digit transcoding

pub mod base64url;
pub mod deflate;
pub mod numeric;
