//! Token validation engine.
//!
//! Two strategies share the [`TokenValidator`] contract:
//!
//! - [`OfflineValidator`] verifies the RSA signature against a [`KeyStore`](crate::jwks::KeyStore)
//!   snapshot and checks `iss`, `aud`, `exp`, and `nbf` locally, with no network call per token.
//! - [`IntrospectionValidator`] asks the provider's introspection endpoint and checks the
//!   structured answer.
//!
//! Neither strategy caches verdicts; every call re-verifies from scratch.

pub mod claims;
pub mod offline;
pub mod online;

pub use claims::*;
pub use offline::*;
pub use online::*;

// crates.io
use jsonwebtoken::Algorithm;
// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenValidator`] methods.
pub type ValidationFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Object-safe validation contract shared by the offline and introspection strategies.
pub trait TokenValidator
where
	Self: Send + Sync,
{
	/// Prepares the validator (fetches keys for offline validation; no-op for introspection).
	fn initialize(&self) -> ValidationFuture<'_, ()>;

	/// Validates `token`, failing with the specific check that rejected it.
	fn validate<'a>(&'a self, token: &'a str) -> ValidationFuture<'a, ()>;
}

/// Tunables for offline validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
	/// Signature algorithms accepted in token headers. Only RSA schemes can be honored.
	pub algorithms: Vec<Algorithm>,
	/// Clock skew tolerance applied to `exp` and `nbf`, in seconds.
	pub leeway: u64,
}
impl ValidationOptions {
	/// Replaces the accepted algorithms.
	pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
		self.algorithms = algorithms.into_iter().collect();

		self
	}

	/// Replaces the clock leeway.
	pub fn with_leeway(mut self, leeway: u64) -> Self {
		self.leeway = leeway;

		self
	}

	pub(crate) fn allows(&self, alg: Algorithm) -> bool {
		is_rsa(alg) && self.algorithms.contains(&alg)
	}
}
impl Default for ValidationOptions {
	fn default() -> Self {
		Self {
			algorithms: vec![
				Algorithm::RS256,
				Algorithm::RS384,
				Algorithm::RS512,
				Algorithm::PS256,
				Algorithm::PS384,
				Algorithm::PS512,
			],
			leeway: 0,
		}
	}
}

fn is_rsa(alg: Algorithm) -> bool {
	matches!(
		alg,
		Algorithm::RS256
			| Algorithm::RS384
			| Algorithm::RS512
			| Algorithm::PS256
			| Algorithm::PS384
			| Algorithm::PS512
	)
}
