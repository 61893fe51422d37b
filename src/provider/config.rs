//! Immutable provider configuration plus the builder that validates it.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, OrganizationId, ProviderName, Scopes, TokenSecret},
	error::ConfigError,
};

/// Errors raised while constructing or validating provider configurations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderConfigError {
	/// A required endpoint was not supplied.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// An endpoint template expanded into an unparsable URL.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Parser failure.
		#[source]
		source: url::ParseError,
	},
	/// Issuer is required for offline validation.
	#[error("Issuer cannot be empty.")]
	MissingIssuer,
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// How the introspection request carries its parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectionParams {
	/// `application/x-www-form-urlencoded` body (RFC 7662).
	#[default]
	Form,
	/// Query-string parameters with an empty body.
	Query,
}

/// Provider-specific quirks that influence how requests are shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Placement of introspection parameters.
	pub introspection_params: IntrospectionParams,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ', introspection_params: IntrospectionParams::default() }
	}
}

/// Endpoint set declared by a provider configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Device authorization endpoint.
	pub device_authorization: Url,
	/// Token endpoint polled with the device code.
	pub token: Url,
	/// JSON Web Key Set document.
	pub jwks: Url,
	/// Optional introspection endpoint.
	pub introspection: Option<Url>,
}

/// Fully populated configuration for one provider/organization/client triple.
///
/// Values are validated by [`ProviderConfigBuilder::build`] and on deserialization, and are
/// meant to be frozen behind an `Arc` before being handed to the authorizer and validators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProviderConfig")]
pub struct ProviderConfig {
	/// Registered provider name.
	pub provider: ProviderName,
	/// Organization the endpoints were derived from, when the provider is multi-tenant.
	pub organization: Option<OrganizationId>,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Optional client secret for confidential clients.
	pub client_secret: Option<TokenSecret>,
	/// Ordered scopes requested during device authorization.
	pub scopes: Scopes,
	/// Provider endpoints.
	pub endpoints: ProviderEndpoints,
	/// Expected audience; sent during device authorization when non-empty.
	pub audience: String,
	/// Expected issuer.
	pub issuer: String,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderConfig {
	/// Creates a new builder for the provided provider/client pair.
	pub fn builder(provider: ProviderName, client_id: ClientId) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(provider, client_id)
	}

	/// Attaches a client secret; call before sharing the configuration.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Returns the scope parameter joined with the provider's delimiter.
	pub fn scope_param(&self) -> String {
		self.scopes.join(self.quirks.scope_delimiter)
	}

	/// Returns the introspection endpoint or a configuration error naming the provider.
	pub fn introspection_endpoint(&self) -> Result<&Url, ConfigError> {
		self.endpoints.introspection.as_ref().ok_or_else(|| ConfigError::MissingEndpoint {
			provider: self.provider.to_string(),
			endpoint: "introspection",
		})
	}

	fn validate(&self) -> Result<(), ProviderConfigError> {
		validate_endpoint("device_authorization", &self.endpoints.device_authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("jwks", &self.endpoints.jwks)?;

		if let Some(introspection) = self.endpoints.introspection.as_ref() {
			validate_endpoint("introspection", introspection)?;
		}
		if self.issuer.is_empty() {
			return Err(ProviderConfigError::MissingIssuer);
		}

		validate_scope_delimiter(self.quirks.scope_delimiter)
	}
}

impl TryFrom<RawProviderConfig> for ProviderConfig {
	type Error = ProviderConfigError;

	fn try_from(raw: RawProviderConfig) -> Result<Self, Self::Error> {
		let config = Self {
			provider: raw.provider,
			organization: raw.organization,
			client_id: raw.client_id,
			client_secret: raw.client_secret,
			scopes: raw.scopes,
			endpoints: raw.endpoints,
			audience: raw.audience,
			issuer: raw.issuer,
			quirks: raw.quirks,
		};

		config.validate()?;

		Ok(config)
	}
}

// Unvalidated wire shape of `ProviderConfig`.
#[derive(Deserialize)]
struct RawProviderConfig {
	provider: ProviderName,
	organization: Option<OrganizationId>,
	client_id: ClientId,
	client_secret: Option<TokenSecret>,
	scopes: Scopes,
	endpoints: ProviderEndpoints,
	audience: String,
	issuer: String,
	quirks: ProviderQuirks,
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	/// Registered provider name.
	pub provider: ProviderName,
	/// Organization the endpoints were derived from.
	pub organization: Option<OrganizationId>,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Optional client secret.
	pub client_secret: Option<TokenSecret>,
	/// Requested scopes (defaults to `openid profile offline_access`).
	pub scopes: Scopes,
	/// Device authorization endpoint.
	pub device_authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// JWKS endpoint.
	pub jwks_endpoint: Option<Url>,
	/// Optional introspection endpoint.
	pub introspection_endpoint: Option<Url>,
	/// Expected audience.
	pub audience: String,
	/// Expected issuer.
	pub issuer: String,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provided identifiers.
	pub fn new(provider: ProviderName, client_id: ClientId) -> Self {
		Self {
			provider,
			organization: None,
			client_id,
			client_secret: None,
			scopes: Scopes::openid_defaults(),
			device_authorization_endpoint: None,
			token_endpoint: None,
			jwks_endpoint: None,
			introspection_endpoint: None,
			audience: String::new(),
			issuer: String::new(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Records the organization the endpoints belong to.
	pub fn organization(mut self, organization: OrganizationId) -> Self {
		self.organization = Some(organization);

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Overrides the requested scopes.
	pub fn scopes(mut self, scopes: Scopes) -> Self {
		self.scopes = scopes;

		self
	}

	/// Sets the device authorization endpoint.
	pub fn device_authorization_endpoint(mut self, url: Url) -> Self {
		self.device_authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the JWKS endpoint.
	pub fn jwks_endpoint(mut self, url: Url) -> Self {
		self.jwks_endpoint = Some(url);

		self
	}

	/// Sets the optional introspection endpoint.
	pub fn introspection_endpoint(mut self, url: Url) -> Self {
		self.introspection_endpoint = Some(url);

		self
	}

	/// Sets the expected audience.
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = audience.into();

		self
	}

	/// Sets the expected issuer.
	pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = issuer.into();

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let device_authorization = self
			.device_authorization_endpoint
			.ok_or(ProviderConfigError::MissingEndpoint { endpoint: "device_authorization" })?;
		let token =
			self.token_endpoint.ok_or(ProviderConfigError::MissingEndpoint { endpoint: "token" })?;
		let jwks =
			self.jwks_endpoint.ok_or(ProviderConfigError::MissingEndpoint { endpoint: "jwks" })?;
		let config = ProviderConfig {
			provider: self.provider,
			organization: self.organization,
			client_id: self.client_id,
			client_secret: self.client_secret,
			scopes: self.scopes,
			endpoints: ProviderEndpoints {
				device_authorization,
				token,
				jwks,
				introspection: self.introspection_endpoint,
			},
			audience: self.audience,
			issuer: self.issuer,
			quirks: self.quirks,
		};

		config.validate()?;

		Ok(config)
	}
}

/// Parses an endpoint URL, tagging failures with the endpoint label.
pub fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ProviderConfigError> {
	Url::parse(raw).map_err(|source| ProviderConfigError::InvalidUrl { endpoint, source })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderConfigError> {
	if url.scheme() != "https" {
		Err(ProviderConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderConfigError> {
	if delimiter.is_control() {
		Err(ProviderConfigError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Test URL should parse.")
	}

	fn builder() -> ProviderConfigBuilder {
		ProviderConfig::builder(
			ProviderName::new("custom").expect("Provider name should be valid."),
			ClientId::new("client-1").expect("Client id should be valid."),
		)
		.device_authorization_endpoint(url("https://id.example.com/device"))
		.token_endpoint(url("https://id.example.com/token"))
		.jwks_endpoint(url("https://id.example.com/keys"))
		.issuer("https://id.example.com")
	}

	#[test]
	fn builder_rejects_missing_and_insecure_endpoints() {
		let err = ProviderConfig::builder(
			ProviderName::new("custom").expect("Provider name should be valid."),
			ClientId::new("client-1").expect("Client id should be valid."),
		)
		.build()
		.expect_err("Empty builder must fail.");

		assert_eq!(err, ProviderConfigError::MissingEndpoint { endpoint: "device_authorization" });

		let err = builder()
			.introspection_endpoint(url("http://id.example.com/introspect"))
			.build()
			.expect_err("Plain HTTP introspection must be rejected.");

		assert!(matches!(
			err,
			ProviderConfigError::InsecureEndpoint { endpoint: "introspection", .. }
		));
	}

	#[test]
	fn builder_requires_issuer_and_printable_delimiter() {
		assert_eq!(
			builder().issuer("").build().expect_err("Empty issuer must fail."),
			ProviderConfigError::MissingIssuer,
		);

		let quirks = ProviderQuirks { scope_delimiter: '\n', ..ProviderQuirks::default() };

		assert!(matches!(
			builder().quirks(quirks).build(),
			Err(ProviderConfigError::InvalidScopeDelimiter { delimiter: '\n' })
		));
	}

	#[test]
	fn scope_param_uses_the_configured_delimiter() {
		let config = builder()
			.scopes(Scopes::new(["openid", "email"]).expect("Scopes should be valid."))
			.quirks(ProviderQuirks { scope_delimiter: ',', ..ProviderQuirks::default() })
			.build()
			.expect("Config should build.");

		assert_eq!(config.scope_param(), "openid,email");
	}

	#[test]
	fn missing_introspection_surfaces_a_config_error() {
		let config = builder().build().expect("Config should build.");
		let err = config.introspection_endpoint().expect_err("No introspection configured.");

		assert!(matches!(err, ConfigError::MissingEndpoint { endpoint: "introspection", .. }));
	}

	#[test]
	fn deserialization_applies_builder_validation() {
		let config = builder().build().expect("Config should build.");
		let valid = serde_json::to_value(&config).expect("Config should serialize.");
		let decoded: ProviderConfig =
			serde_json::from_value(valid.clone()).expect("Valid config should deserialize.");

		assert_eq!(decoded, config);

		let mut insecure = valid.clone();

		insecure["endpoints"]["token"] = "http://id.example.com/token".into();

		let err = serde_json::from_value::<ProviderConfig>(insecure)
			.expect_err("Plain HTTP token endpoint must be rejected.");

		assert!(err.to_string().contains("token endpoint must use HTTPS"));

		let mut no_issuer = valid.clone();

		no_issuer["issuer"] = "".into();

		let err = serde_json::from_value::<ProviderConfig>(no_issuer)
			.expect_err("Empty issuer must be rejected.");

		assert!(err.to_string().contains("Issuer cannot be empty"));

		let mut control_delimiter = valid;

		control_delimiter["quirks"]["scope_delimiter"] = "\n".into();

		let err = serde_json::from_value::<ProviderConfig>(control_delimiter)
			.expect_err("Control-character delimiter must be rejected.");

		assert!(err.to_string().contains("Scope delimiter must be a printable character"));
	}

	#[test]
	fn debug_output_hides_the_client_secret() {
		let config = builder()
			.build()
			.expect("Config should build.")
			.with_client_secret("super-secret");

		assert!(!format!("{config:?}").contains("super-secret"));
	}
}
