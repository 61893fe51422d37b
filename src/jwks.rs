//! JSON Web Key Sets: wire model, RSA public key reconstruction, and the shared key store.
//!
//! `key` turns raw JWK entries into [`RsaPublicKey`] values (modulus and exponent decoded as
//! big-endian base64url per RFC 7518 §6.3.1) and the verification keys derived from them.
//! `store` fetches a provider's JWKS document and swaps complete key sets atomically so
//! concurrent validations always observe either the old or the new set, never a mix.

pub mod key;
pub mod store;

pub use key::*;
pub use store::*;
