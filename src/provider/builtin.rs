//! Factories for the providers shipped with the crate.

// self
use crate::{
	auth::ProviderName,
	provider::{
		IntrospectionParams, ProviderConfig, ProviderConfigError, ProviderQuirks, ProviderRegistry,
		ProviderSeed, parse_endpoint,
	},
};

/// Registry name of the Auth0 factory.
pub const AUTH0: &str = "auth0";
/// Registry name of the Okta factory.
pub const OKTA: &str = "okta";

/// Auth0 tenant at `https://{org}.auth0.com`. Auth0 exposes no introspection endpoint.
pub fn auth0(seed: ProviderSeed) -> Result<ProviderConfig, ProviderConfigError> {
	let base = format!("https://{}.auth0.com", seed.organization);

	ProviderConfig::builder(ProviderName::from_static(AUTH0), seed.client_id)
		.organization(seed.organization)
		.scopes(seed.scopes)
		.device_authorization_endpoint(parse_endpoint(
			"device_authorization",
			&format!("{base}/oauth/device/code"),
		)?)
		.token_endpoint(parse_endpoint("token", &format!("{base}/oauth/token"))?)
		.jwks_endpoint(parse_endpoint("jwks", &format!("{base}/.well-known/jwks.json"))?)
		.audience(base.clone())
		.issuer(format!("{base}/"))
		.build()
}

/// Okta org authorization server at `https://{org}.okta.com`.
pub fn okta(seed: ProviderSeed) -> Result<ProviderConfig, ProviderConfigError> {
	let base = format!("https://{}.okta.com", seed.organization);

	ProviderConfig::builder(ProviderName::from_static(OKTA), seed.client_id)
		.organization(seed.organization)
		.scopes(seed.scopes)
		.device_authorization_endpoint(parse_endpoint(
			"device_authorization",
			&format!("{base}/oauth2/v1/device/authorize"),
		)?)
		.token_endpoint(parse_endpoint("token", &format!("{base}/oauth2/v1/token"))?)
		.jwks_endpoint(parse_endpoint("jwks", &format!("{base}/oauth2/v1/keys"))?)
		.introspection_endpoint(parse_endpoint(
			"introspection",
			&format!("{base}/oauth2/v1/introspect"),
		)?)
		.audience(base.clone())
		.issuer(base)
		.quirks(ProviderQuirks {
			introspection_params: IntrospectionParams::Query,
			..ProviderQuirks::default()
		})
		.build()
}

pub(crate) fn register_all(registry: &mut ProviderRegistry) {
	registry
		.register(ProviderName::from_static(AUTH0), auth0)
		.register(ProviderName::from_static(OKTA), okta);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ClientId, OrganizationId, Scopes};

	fn seed() -> ProviderSeed {
		ProviderSeed {
			organization: OrganizationId::new("acme").expect("Organization should be valid."),
			client_id: ClientId::new("client-1").expect("Client id should be valid."),
			scopes: Scopes::openid_defaults(),
		}
	}

	#[test]
	fn auth0_endpoints_follow_the_tenant_domain() {
		let config = auth0(seed()).expect("Auth0 config should build.");

		assert_eq!(
			config.endpoints.device_authorization.as_str(),
			"https://acme.auth0.com/oauth/device/code"
		);
		assert_eq!(config.endpoints.token.as_str(), "https://acme.auth0.com/oauth/token");
		assert_eq!(config.endpoints.jwks.as_str(), "https://acme.auth0.com/.well-known/jwks.json");
		assert_eq!(config.endpoints.introspection, None);
		assert_eq!(config.audience, "https://acme.auth0.com");
		assert_eq!(config.issuer, "https://acme.auth0.com/");
	}

	#[test]
	fn okta_uses_query_string_introspection() {
		let config = okta(seed()).expect("Okta config should build.");

		assert_eq!(
			config.endpoints.device_authorization.as_str(),
			"https://acme.okta.com/oauth2/v1/device/authorize"
		);
		assert_eq!(config.endpoints.jwks.as_str(), "https://acme.okta.com/oauth2/v1/keys");
		assert_eq!(
			config.endpoints.introspection.as_ref().map(|url| url.as_str()),
			Some("https://acme.okta.com/oauth2/v1/introspect")
		);
		assert_eq!(config.quirks.introspection_params, IntrospectionParams::Query);
		assert_eq!(config.issuer, "https://acme.okta.com");
		assert_eq!(config.scope_param(), "openid profile offline_access");
	}
}
