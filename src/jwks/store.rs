//! Shared, read-mostly key store populated from a JWKS endpoint.

// crates.io
use oauth2::http::StatusCode;
// self
use crate::{
	_prelude::*,
	error::KeySetError,
	http::{self, AuthHttpClient, Endpoint},
	jwks::{JwkSet, KeySet, StoredKey},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Key store specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestKeyStore = KeyStore<ReqwestHttpClient>;

/// Key id → RSA key mapping shared by offline validators.
///
/// Readers take a cheap `Arc` snapshot; [`KeyStore::initialize`] builds a complete [`KeySet`]
/// before swapping it in, so a failed refresh leaves the previous set untouched.
pub struct KeyStore<C>
where
	C: ?Sized + AuthHttpClient,
{
	http_client: Arc<C>,
	keys: RwLock<Arc<KeySet>>,
	refresh: AsyncMutex<()>,
}
impl<C> KeyStore<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// Creates an empty store that fetches through the provided transport.
	pub fn with_http_client(http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			keys: RwLock::new(Arc::new(KeySet::default())),
			refresh: AsyncMutex::new(()),
		}
	}

	/// Fetches `jwks_uri` and atomically replaces the stored keys.
	///
	/// Returns the number of keys installed. Any malformed entry fails the call and keeps the
	/// previous set. Concurrent calls are serialized.
	pub async fn initialize(&self, jwks_uri: &Url) -> Result<usize> {
		const KIND: FlowKind = FlowKind::KeySetRefresh;

		let span = FlowSpan::new(KIND, "initialize");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _refresh = self.refresh.lock().await;
				let request = http::json_get(jwks_uri)?;
				let response =
					http::send(self.http_client.as_ref(), Endpoint::Jwks, request).await?;

				if response.status() != StatusCode::OK {
					return Err(KeySetError::Status {
						status: response.status().as_u16(),
						body: http::body_preview(response.body()),
					}
					.into());
				}

				let document = http::parse_json::<JwkSet>(response.body())
					.map_err(|source| KeySetError::Document { source })?;
				let set = KeySet::from_jwks(&document)?;
				let count = set.len();

				self.replace(set);

				Ok(count)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Installs a pre-built key set, replacing the current one.
	pub fn replace(&self, set: KeySet) {
		*self.keys.write() = Arc::new(set);
	}

	/// Returns the key set currently in effect.
	pub fn snapshot(&self) -> Arc<KeySet> {
		Arc::clone(&self.keys.read())
	}

	/// Looks up a key by exact `kid` match in the current set.
	pub fn get(&self, kid: &str) -> Option<StoredKey> {
		self.keys.read().get(kid).cloned()
	}
}
#[cfg(feature = "reqwest")]
impl KeyStore<ReqwestHttpClient> {
	/// Creates an empty store backed by a default reqwest client.
	pub fn new() -> Self {
		Self::with_http_client(ReqwestHttpClient::default())
	}
}
#[cfg(feature = "reqwest")]
impl Default for KeyStore<ReqwestHttpClient> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C> Debug for KeyStore<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeyStore").field("kids", &self.snapshot().kids()).finish()
	}
}
