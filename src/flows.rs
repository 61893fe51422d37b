//! OAuth 2.0 Device Authorization Grant (RFC 8628).
//!
//! A [`DeviceAuthorizer`] binds one transport to one frozen [`ProviderConfig`]. Each
//! authorization attempt is a strictly sequential pair of calls:
//! [`DeviceAuthorizer::request_code`] obtains the device and user codes, then
//! [`DeviceAuthorizer::acquire_token`] polls the token endpoint until a terminal outcome.
//! Attempts share no mutable state, so independent attempts may run concurrently on the
//! same authorizer.

pub mod device_code;
pub mod token_poll;

pub use device_code::*;
pub use token_poll::*;

// self
use crate::{_prelude::*, http::AuthHttpClient, provider::ProviderConfig};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Authorizer specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestDeviceAuthorizer = DeviceAuthorizer<ReqwestHttpClient>;

/// Runs device authorization attempts against a single provider configuration.
pub struct DeviceAuthorizer<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Frozen provider configuration.
	pub config: Arc<ProviderConfig>,
}
impl<C> DeviceAuthorizer<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// Creates an authorizer that reuses the caller-provided transport.
	pub fn with_http_client(
		config: impl Into<Arc<ProviderConfig>>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), config: config.into() }
	}
}
#[cfg(feature = "reqwest")]
impl DeviceAuthorizer<ReqwestHttpClient> {
	/// Creates an authorizer backed by a default reqwest client.
	pub fn new(config: impl Into<Arc<ProviderConfig>>) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for DeviceAuthorizer<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn clone(&self) -> Self {
		Self { http_client: Arc::clone(&self.http_client), config: Arc::clone(&self.config) }
	}
}
impl<C> Debug for DeviceAuthorizer<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DeviceAuthorizer")
			.field("provider", &self.config.provider)
			.field("client_id", &self.config.client_id)
			.field("client_secret_set", &self.config.client_secret.is_some())
			.finish()
	}
}
