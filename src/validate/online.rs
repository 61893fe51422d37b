//! Online validation through the provider's introspection endpoint (RFC 7662).

// crates.io
use oauth2::http::StatusCode;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError, ValidationError},
	http::{self, AuthHttpClient, Endpoint},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{IntrospectionParams, ProviderConfig},
	validate::{self, Audience, TokenValidator, ValidationFuture},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Introspection answer. Only produced and consumed within one validation call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResult {
	/// Whether the provider considers the token live.
	#[serde(default)]
	pub active: bool,
	/// Space-delimited scopes.
	pub scope: Option<String>,
	/// Resource owner's username.
	pub username: Option<String>,
	/// Expiry (Unix seconds).
	pub exp: Option<i64>,
	/// Not-before (Unix seconds).
	pub nbf: Option<i64>,
	/// Issued-at (Unix seconds).
	pub iat: Option<i64>,
	/// Subject.
	pub sub: Option<String>,
	/// Audience.
	pub aud: Option<Audience>,
	/// Issuer.
	pub iss: Option<String>,
	/// Token identifier.
	pub jti: Option<String>,
	/// Token type.
	pub token_type: Option<String>,
	/// Client the token was issued to.
	pub client_id: Option<String>,
	/// Device the token was issued to (Okta).
	pub device_id: Option<String>,
	/// User identifier (Okta).
	pub uid: Option<String>,
}
impl IntrospectionResult {
	/// Applies the `active`, `client_id`, `aud`, and `exp` checks in that order.
	pub fn check(
		&self,
		config: &ProviderConfig,
		now: OffsetDateTime,
	) -> Result<(), ValidationError> {
		if !self.active {
			return Err(ValidationError::InactiveToken);
		}

		validate::check_client(self.client_id.as_deref(), &config.client_id)?;
		validate::check_audience(self.aud.as_ref(), &config.audience)?;
		validate::check_expiry(self.exp, now, 0)
	}
}

/// Validates tokens by asking the provider.
pub struct IntrospectionValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	http_client: Arc<C>,
	config: Arc<ProviderConfig>,
	endpoint: Url,
}
impl<C> IntrospectionValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// Creates a validator; fails when the provider declares no introspection endpoint.
	pub fn with_http_client(
		config: impl Into<Arc<ProviderConfig>>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let config = config.into();
		let endpoint = config.introspection_endpoint()?.clone();

		Ok(Self { http_client: http_client.into(), config, endpoint })
	}

	/// Calls the introspection endpoint and returns the decoded answer without checking it.
	pub async fn introspect(&self, token: &str) -> Result<IntrospectionResult> {
		let config = self.config.as_ref();
		let mut params = vec![("client_id", config.client_id.as_ref()), ("token", token)];

		if let Some(secret) = config.client_secret.as_ref().filter(|secret| !secret.is_empty()) {
			params.push(("client_secret", secret.expose()));
		}

		let request = match config.quirks.introspection_params {
			IntrospectionParams::Form => http::form_post(&self.endpoint, &params)?,
			IntrospectionParams::Query => http::query_post(&self.endpoint, &params)?,
		};
		let response =
			http::send(self.http_client.as_ref(), Endpoint::Introspection, request).await?;

		if response.status() != StatusCode::OK {
			return Err(ProtocolError::IntrospectionRequestFailed {
				status: response.status().as_u16(),
				body: http::body_preview(response.body()),
			}
			.into());
		}

		Ok(http::decode_json(Endpoint::Introspection, &response)?)
	}

	/// Validates `token` at the current UTC time.
	pub async fn validate(&self, token: &str) -> Result<IntrospectionResult> {
		self.validate_at(token, OffsetDateTime::now_utc()).await
	}

	/// Validates `token`, evaluating `exp` against `now`.
	pub async fn validate_at(
		&self,
		token: &str,
		now: OffsetDateTime,
	) -> Result<IntrospectionResult> {
		const KIND: FlowKind = FlowKind::Introspection;

		let span = FlowSpan::with_token(KIND, "validate", &obs::token_fingerprint(token));

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let answer = self.introspect(token).await?;

				answer.check(&self.config, now).inspect_err(|e| obs::trace_rejection(KIND, e))?;

				Ok(answer)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl IntrospectionValidator<ReqwestHttpClient> {
	/// Creates a validator backed by a default reqwest client.
	pub fn new(config: impl Into<Arc<ProviderConfig>>) -> Result<Self, ConfigError> {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> TokenValidator for IntrospectionValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn initialize(&self) -> ValidationFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}

	fn validate<'a>(&'a self, token: &'a str) -> ValidationFuture<'a, ()> {
		Box::pin(async move { IntrospectionValidator::validate(self, token).await.map(|_| ()) })
	}
}
impl<C> Debug for IntrospectionValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IntrospectionValidator")
			.field("provider", &self.config.provider)
			.field("endpoint", &self.endpoint.as_str())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::provider::ProviderRegistry;

	const NOW: OffsetDateTime = macros::datetime!(2023-07-25 15:00 UTC);

	fn okta() -> ProviderConfig {
		ProviderRegistry::builtin()
			.resolve("okta", "rockset", "0oa6zy1dgtX2nLzKv5d7")
			.expect("Okta config should resolve.")
	}

	fn answer() -> IntrospectionResult {
		serde_json::from_str(
			r#"{
				"active": true,
				"scope": "openid profile offline_access groups",
				"username": "pme@rockset.com",
				"exp": 1690302787,
				"iat": 1690299187,
				"sub": "pme@rockset.com",
				"aud": "https://rockset.okta.com",
				"iss": "https://rockset.okta.com",
				"jti": "AT.5mjpDSDqVSGQAgSwsEUs6ZGRWq0q2qn-sxHqMURStCw",
				"token_type": "Bearer",
				"client_id": "0oa6zy1dgtX2nLzKv5d7",
				"uid": "00usmr7rbxb5p5b8P5d6"
			}"#,
		)
		.expect("Okta introspection answer should deserialize.")
	}

	#[test]
	fn live_answers_pass() {
		assert_eq!(answer().check(&okta(), NOW), Ok(()));
	}

	#[test]
	fn each_check_fails_on_its_own_field() {
		let config = okta();

		assert_eq!(
			IntrospectionResult { active: false, ..answer() }.check(&config, NOW),
			Err(ValidationError::InactiveToken)
		);
		assert!(matches!(
			IntrospectionResult { client_id: Some("other".into()), ..answer() }.check(&config, NOW),
			Err(ValidationError::ClientMismatch { .. })
		));
		assert!(matches!(
			IntrospectionResult { aud: Some(Audience::Single("api://x".into())), ..answer() }
				.check(&config, NOW),
			Err(ValidationError::InvalidAudience { .. })
		));
		assert_eq!(
			answer().check(&config, macros::datetime!(2023-07-25 16:33:07 UTC)),
			Err(ValidationError::TokenExpired { exp: 1_690_302_787 })
		);
		assert_eq!(
			IntrospectionResult { exp: None, ..answer() }.check(&config, NOW),
			Err(ValidationError::MissingClaim { claim: "exp" })
		);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn providers_without_introspection_are_rejected() {
		let auth0 = ProviderRegistry::builtin()
			.resolve("auth0", "acme", "client")
			.expect("Auth0 config should resolve.");
		let err = IntrospectionValidator::<ReqwestHttpClient>::with_http_client(
			auth0,
			ReqwestHttpClient::default(),
		)
		.expect_err("Auth0 has no introspection endpoint.");

		assert!(matches!(err, ConfigError::MissingEndpoint { endpoint: "introspection", .. }));
	}
}
