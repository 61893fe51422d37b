//! Poll-based token acquisition (RFC 8628 §3.4–3.5).
//!
//! The loop keeps exactly one request in flight. `authorization_pending` and `slow_down` are
//! absorbed here and never reach the caller; every other `error` value is terminal. The only
//! suspension points are the in-flight poll and the wait between polls, and both race the
//! caller's cancellation future.

// std
use std::{pin::pin, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	error::ProtocolError,
	flows::{DeviceAuthorizer, DeviceCode},
	http::{self, AuthHttpClient, Endpoint},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// `grant_type` value sent with every poll.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Interval bookkeeping for one acquisition attempt.
///
/// The interval starts at the provider's value and only ever grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPacing {
	interval: u64,
}
impl PollPacing {
	/// Starts pacing at `interval` seconds.
	pub const fn new(interval: u64) -> Self {
		Self { interval }
	}

	/// Current interval, in seconds.
	pub const fn interval(&self) -> u64 {
		self.interval
	}

	/// Applies a `slow_down` signal by doubling the interval (0 becomes 1).
	pub fn slow_down(&mut self) {
		self.interval = if self.interval == 0 { 1 } else { self.interval.saturating_mul(2) };
	}

	/// Wait to observe before the next poll.
	pub fn wait(&self) -> StdDuration {
		StdDuration::from_secs(self.interval)
	}
}

/// Non-terminal classification of a token endpoint response.
#[derive(Debug)]
enum PollSignal {
	Granted(Token),
	Pending,
	SlowDown,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	error: Option<String>,
	error_description: Option<String>,
	access_token: Option<String>,
	refresh_token: Option<String>,
	id_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<u64>,
	scope: Option<String>,
}
impl TokenEndpointResponse {
	fn classify(self, received_at: OffsetDateTime) -> Result<PollSignal> {
		let Some(code) = self.error.filter(|code| !code.is_empty()) else {
			obs::record_poll_signal("granted");

			let access_token = self
				.access_token
				.filter(|token| !token.is_empty())
				.ok_or(ProtocolError::MissingAccessToken)?;

			return Ok(PollSignal::Granted(Token {
				access_token: TokenSecret::new(access_token),
				refresh_token: self.refresh_token.map(TokenSecret::new),
				id_token: self.id_token.map(TokenSecret::new),
				token_type: self.token_type.unwrap_or_default(),
				expires_in: self.expires_in,
				scope: self.scope,
				received_at,
			}));
		};

		match code.as_str() {
			"authorization_pending" => {
				obs::record_poll_signal("authorization_pending");

				Ok(PollSignal::Pending)
			},
			"slow_down" => {
				obs::record_poll_signal("slow_down");

				Ok(PollSignal::SlowDown)
			},
			"access_denied" => {
				obs::record_poll_signal("access_denied");

				Err(Error::AccessDenied)
			},
			_ => {
				obs::record_poll_signal("error");

				Err(Error::AuthorizationFailed { code, description: self.error_description })
			},
		}
	}
}

impl<C> DeviceAuthorizer<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// Polls the token endpoint with `code` until the user approves, denies, or the provider
	/// reports a terminal error.
	///
	/// `cancel` is the caller's cancellation or deadline signal: when it completes first the
	/// call returns [`Error::Cancelled`] without finishing the wait or issuing another poll.
	/// Use [`DeviceCode::expiry_deadline`] to stop once the device code has expired.
	pub async fn acquire_token<F>(&self, code: &DeviceCode, cancel: F) -> Result<Token>
	where
		F: Future<Output = ()>,
	{
		const KIND: FlowKind = FlowKind::TokenPoll;

		let span = FlowSpan::new(KIND, "acquire_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut cancel = pin!(cancel);
				let mut pacing = PollPacing::new(code.interval);

				loop {
					let signal = tokio::select! {
						biased;
						_ = &mut cancel => return Err(Error::Cancelled),
						signal = self.poll_once(code) => signal?,
					};

					match signal {
						PollSignal::Granted(token) => return Ok(token),
						PollSignal::Pending => {
							obs::trace_poll_signal("authorization_pending", pacing.interval());
						},
						PollSignal::SlowDown => {
							pacing.slow_down();
							obs::trace_poll_signal("slow_down", pacing.interval());
						},
					}

					tokio::select! {
						biased;
						_ = &mut cancel => return Err(Error::Cancelled),
						_ = tokio::time::sleep(pacing.wait()) => {},
					}
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn poll_once(&self, code: &DeviceCode) -> Result<PollSignal> {
		let config = self.config.as_ref();
		let mut params = vec![("client_id", config.client_id.as_ref())];

		if let Some(secret) = config.client_secret.as_ref().filter(|secret| !secret.is_empty()) {
			params.push(("client_secret", secret.expose()));
		}

		params.push(("device_code", code.device_code.expose()));
		params.push(("grant_type", DEVICE_CODE_GRANT_TYPE));

		let request = http::form_post(&config.endpoints.token, &params)?;
		let response = http::send(self.http_client.as_ref(), Endpoint::Token, request).await?;
		// Pending and denied answers arrive as 400, so the body is decoded for every status.
		let body = http::decode_json::<TokenEndpointResponse>(Endpoint::Token, &response)?;

		body.classify(OffsetDateTime::now_utc())
	}
}
