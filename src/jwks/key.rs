//! JWK wire model and RSA key reconstruction.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::DecodingKey;
use rsa::BigUint;
// self
use crate::{_prelude::*, error::KeySetError};

const MAX_EXPONENT_BYTES: usize = 8;

/// Raw JSON Web Key as published in a JWKS document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
	/// Key identifier referenced by token headers.
	pub kid: String,
	/// Key type (`RSA`, `EC`, ...).
	pub kty: String,
	/// Algorithm the key is bound to, if declared.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alg: Option<String>,
	/// Intended use (`sig` or `enc`), if declared.
	#[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
	pub key_use: Option<String>,
	/// Base64url modulus (RSA only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub n: Option<String>,
	/// Base64url public exponent (RSA only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub e: Option<String>,
	/// X.509 certificate SHA-1 thumbprint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x5t: Option<String>,
	/// X.509 certificate chain (base64 DER).
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub x5c: Vec<String>,
}

/// JWKS document: `{"keys": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
	/// Published keys.
	pub keys: Vec<Jwk>,
}

/// RSA public key derived deterministically from a JWK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaPublicKey {
	/// Modulus as an arbitrary-precision unsigned integer.
	pub modulus: BigUint,
	/// Public exponent.
	pub exponent: u64,
}
impl RsaPublicKey {
	/// Decodes and validates the `n`/`e` pair carried by `jwk`.
	pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeySetError> {
		let n = jwk
			.n
			.as_deref()
			.ok_or_else(|| KeySetError::MissingComponent { kid: jwk.kid.clone(), component: "n" })?;
		let e = jwk
			.e
			.as_deref()
			.ok_or_else(|| KeySetError::MissingComponent { kid: jwk.kid.clone(), component: "e" })?;
		let key = Self {
			modulus: decode_modulus(&jwk.kid, n)?,
			exponent: decode_exponent(&jwk.kid, e)?,
		};

		key.check_structure()
			.map_err(|reason| KeySetError::InvalidRsaKey { kid: jwk.kid.clone(), reason })?;

		Ok(key)
	}

	// Size limits are left to the signature verifier; only impossible keys are refused here.
	fn check_structure(&self) -> Result<(), &'static str> {
		if self.modulus.bits() == 0 {
			return Err("modulus is zero");
		}
		if self.modulus.to_bytes_be().last().is_none_or(|byte| byte & 1 == 0) {
			return Err("modulus is even");
		}
		if self.exponent < 3 || self.exponent % 2 == 0 {
			return Err("exponent must be odd and at least 3");
		}

		Ok(())
	}

	/// Builds the signature verification key for these components.
	pub fn decoding_key(&self) -> DecodingKey {
		let exponent = self.exponent.to_be_bytes();
		let start = exponent.iter().position(|byte| *byte != 0).unwrap_or(exponent.len() - 1);

		DecodingKey::from_rsa_raw_components(&self.modulus.to_bytes_be(), &exponent[start..])
	}
}

/// Verification material held for one key id.
#[derive(Clone)]
pub enum KeyMaterial {
	/// RSA key usable for RS*/PS* signatures.
	Rsa {
		/// Decoded components.
		public: RsaPublicKey,
		/// Verification key handed to the JWT decoder.
		decoding: DecodingKey,
	},
	/// Key of a type this crate cannot verify with; rejected when a token references it.
	Unsupported {
		/// Declared key type.
		kty: String,
	},
}
impl Debug for KeyMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			KeyMaterial::Rsa { public, .. } => f
				.debug_struct("Rsa")
				.field("modulus_bits", &public.modulus.bits())
				.field("exponent", &public.exponent)
				.finish(),
			KeyMaterial::Unsupported { kty } =>
				f.debug_struct("Unsupported").field("kty", kty).finish(),
		}
	}
}

/// Key entry stored under its `kid`.
#[derive(Clone, Debug)]
pub struct StoredKey {
	/// Key identifier.
	pub kid: String,
	/// Algorithm the key is bound to, if declared.
	pub alg: Option<String>,
	/// Intended use, if declared.
	pub key_use: Option<String>,
	/// Verification material.
	pub material: KeyMaterial,
}
impl StoredKey {
	/// Converts a JWK, decoding RSA components eagerly so malformed keys fail early.
	pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeySetError> {
		let material = if jwk.kty == "RSA" {
			let public = RsaPublicKey::from_jwk(jwk)?;
			let decoding = public.decoding_key();

			KeyMaterial::Rsa { public, decoding }
		} else {
			KeyMaterial::Unsupported { kty: jwk.kty.clone() }
		};

		Ok(Self {
			kid: jwk.kid.clone(),
			alg: jwk.alg.clone(),
			key_use: jwk.key_use.clone(),
			material,
		})
	}

	/// RSA components, when the key is an RSA key.
	pub fn rsa(&self) -> Option<&RsaPublicKey> {
		match &self.material {
			KeyMaterial::Rsa { public, .. } => Some(public),
			KeyMaterial::Unsupported { .. } => None,
		}
	}
}

/// Immutable mapping from key id to key, built in one pass.
#[derive(Clone, Debug, Default)]
pub struct KeySet {
	keys: HashMap<String, StoredKey>,
}
impl KeySet {
	/// Builds a set from a JWKS document; any malformed entry fails the whole set.
	///
	/// When several entries share a `kid`, the last one wins.
	pub fn from_jwks(document: &JwkSet) -> Result<Self, KeySetError> {
		let mut keys = HashMap::with_capacity(document.keys.len());

		for jwk in &document.keys {
			let key = StoredKey::from_jwk(jwk)?;

			keys.insert(key.kid.clone(), key);
		}

		Ok(Self { keys })
	}

	/// Looks up a key by exact `kid` match.
	pub fn get(&self, kid: &str) -> Option<&StoredKey> {
		self.keys.get(kid)
	}

	/// Number of keys in the set.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Returns true if the set holds no keys.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Key identifiers in lexical order.
	pub fn kids(&self) -> Vec<&str> {
		let mut kids = self.keys.keys().map(String::as_str).collect::<Vec<_>>();

		kids.sort_unstable();

		kids
	}
}
impl FromIterator<StoredKey> for KeySet {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = StoredKey>,
	{
		Self { keys: iter.into_iter().map(|key| (key.kid.clone(), key)).collect() }
	}
}

/// Decodes a base64url modulus as a big-endian unsigned integer.
pub fn decode_modulus(kid: &str, raw: &str) -> Result<BigUint, KeySetError> {
	Ok(BigUint::from_bytes_be(&decode_component(kid, "n", raw)?))
}

/// Decodes a base64url public exponent as a big-endian unsigned integer.
///
/// Leading zero bytes are ignored; more than eight significant bytes is an error.
pub fn decode_exponent(kid: &str, raw: &str) -> Result<u64, KeySetError> {
	let bytes = decode_component(kid, "e", raw)?;
	let start = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len());
	let significant = &bytes[start..];

	if significant.len() > MAX_EXPONENT_BYTES {
		return Err(KeySetError::ExponentTooLarge { kid: kid.to_owned() });
	}

	Ok(significant.iter().fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

fn decode_component(
	kid: &str,
	component: &'static str,
	raw: &str,
) -> Result<Vec<u8>, KeySetError> {
	URL_SAFE_NO_PAD.decode(raw.trim_end_matches('=')).map_err(|source| {
		KeySetError::InvalidComponent { kid: kid.to_owned(), component, source }
	})
}
