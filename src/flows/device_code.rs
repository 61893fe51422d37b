//! Device authorization request (RFC 8628 §3.1–3.2).

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::http::StatusCode;
use tokio::time::Sleep;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ProtocolError,
	flows::DeviceAuthorizer,
	http::{self, AuthHttpClient, Endpoint},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Polling interval used when the provider omits `interval`.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Codes and URIs returned by the device authorization endpoint.
///
/// `device_code` stays inside [`TokenSecret`] because it must never be shown to the user; only
/// `user_code` and the verification URIs are meant for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCode {
	/// Opaque code exchanged at the token endpoint.
	pub device_code: TokenSecret,
	/// Short code the user types at the verification URI.
	pub user_code: String,
	/// Where the user goes to approve the request.
	#[serde(alias = "verification_url")]
	pub verification_uri: Url,
	/// Verification URI with the user code embedded, when the provider supplies one.
	#[serde(default)]
	pub verification_uri_complete: Option<Url>,
	/// Lifetime of the device code, in seconds.
	pub expires_in: u64,
	/// Minimum number of seconds between token polls.
	#[serde(default = "default_interval")]
	pub interval: u64,
}
impl DeviceCode {
	/// Sleep future that completes once the device code has expired.
	///
	/// Pass it (or a shorter deadline) as the cancellation signal of
	/// [`DeviceAuthorizer::acquire_token`] to stop polling when the code can no longer succeed.
	pub fn expiry_deadline(&self) -> Sleep {
		tokio::time::sleep(StdDuration::from_secs(self.expires_in))
	}

	/// URI to present to the user, preferring the variant with the code embedded.
	pub fn display_uri(&self) -> &Url {
		self.verification_uri_complete.as_ref().unwrap_or(&self.verification_uri)
	}
}

impl<C> DeviceAuthorizer<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// Starts an authorization attempt by requesting a device code.
	///
	/// Sends `client_id` and the joined `scope` (empty when no scopes are set) as a form POST,
	/// adding `audience` when configured.
	/// Any status other than 200 fails with [`ProtocolError::AuthRequestFailed`].
	pub async fn request_code(&self) -> Result<DeviceCode> {
		const KIND: FlowKind = FlowKind::DeviceCode;

		let span = FlowSpan::new(KIND, "request_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let config = self.config.as_ref();
				let scope = config.scope_param();
				let mut params =
					vec![("client_id", config.client_id.as_ref()), ("scope", scope.as_str())];

				if !config.audience.is_empty() {
					params.push(("audience", config.audience.as_str()));
				}

				let request = http::form_post(&config.endpoints.device_authorization, &params)?;
				let response =
					http::send(self.http_client.as_ref(), Endpoint::DeviceAuthorization, request)
						.await?;

				if response.status() != StatusCode::OK {
					return Err(ProtocolError::AuthRequestFailed {
						status: response.status().as_u16(),
						body: http::body_preview(response.body()),
					}
					.into());
				}

				Ok(http::decode_json::<DeviceCode>(Endpoint::DeviceAuthorization, &response)?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn default_interval() -> u64 {
	DEFAULT_POLL_INTERVAL_SECS
}
