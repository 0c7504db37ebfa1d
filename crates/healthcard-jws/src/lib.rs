//! # healthcard-jws
//!
//! ES256 key handling and compact JWS signing/verification for SMART Health
//! Cards, including the `zip: "DEF"` pre-signature DEFLATE extension.

pub mod jws;
pub mod key;

pub use jws::{
    DecodedJws, JWS_ALGORITHM, JwsHeader, JwsProcessor, JwtPayload, ZIP_DEFLATE,
};
pub use key::{Es256PrivateKey, Es256PublicKey, Jwk};
