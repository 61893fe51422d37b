//! Walks a headless login end to end against a mock provider: request a device code, poll
//! until the token arrives, then verify the access token offline with the published JWKS.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::OffsetDateTime;
use url::Url;
// self
use device_authorization::{
	auth::{ClientId, ProviderName, Scopes},
	flows::DeviceAuthorizer,
	http::ReqwestHttpClient,
	jsonwebtoken::{self, Algorithm, EncodingKey, Header},
	jwks::KeyStore,
	provider::ProviderConfig,
	reqwest::Client,
	validate::OfflineValidator,
};

const ISSUER: &str = "https://demo.auth0.com/";
const AUDIENCE: &str = "https://demo.auth0.com";
const KID: &str = "demo-signing";
const SIGNING_PEM: &[u8] = include_bytes!("../tests/fixtures/signing_key.pem");
const SIGNING_N: &str = "4_wPLt0JpGG5KmaUOhX5-PfT3cG-KsE_Pwc491dKKXxfIeeoEFX0HulVWLNk6MXQ1VCcGpan35_Br2PQkyf-qJoLXpXHDKWrxirV1tctF3T-sbthy0DMBjeiX7TVeE305GhK3lr9by7UspDKjWjRrT8pqvjI3wrtpvW3oyDeKK62lzSlGSfbqqg3EqMTop86vUWAxHF19obr6NgH16t28wmRA8oDniddy1hZe4-ThDnpydmjMDcwRSP1CtRUeLcSLpy90ZdHi5553rWlBhxx1GtA_hYG9UK4EtOtqwtjMcedxO7zx49K6QVYLUEUqc-endllfpF1LKdiyn5PlNM__w";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc().unix_timestamp();
	let mut header = Header::new(Algorithm::RS256);

	header.kid = Some(KID.into());

	let access_token = jsonwebtoken::encode(
		&header,
		&json!({ "iss": ISSUER, "aud": AUDIENCE, "sub": "auth0|demo", "iat": now, "exp": now + 900 }),
		&EncodingKey::from_rsa_pem(SIGNING_PEM)?,
	)?;
	let device_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/device/code");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"device_code": "demo-device-code",
					"user_code": "BDWP-HQPK",
					"verification_uri": "https://demo.auth0.com/activate",
					"verification_uri_complete": "https://demo.auth0.com/activate?user_code=BDWP-HQPK",
					"expires_in": 900,
					"interval": 1
				})
				.to_string(),
			);
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"access_token": access_token,
					"refresh_token": "demo-refresh",
					"token_type": "Bearer",
					"expires_in": 900
				})
				.to_string(),
			);
		})
		.await;
	let jwks_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/jwks.json");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"keys": [{ "kty": "RSA", "kid": KID, "use": "sig", "alg": "RS256", "n": SIGNING_N, "e": "AQAB" }]
				})
				.to_string(),
			);
		})
		.await;
	let config = Arc::new(
		ProviderConfig::builder(ProviderName::new("demo")?, ClientId::new("demo-cli")?)
			.scopes(Scopes::openid_defaults())
			.device_authorization_endpoint(Url::parse(&server.url("/oauth/device/code"))?)
			.token_endpoint(Url::parse(&server.url("/oauth/token"))?)
			.jwks_endpoint(Url::parse(&server.url("/.well-known/jwks.json"))?)
			.audience(AUDIENCE)
			.issuer(ISSUER)
			.build()?,
	);
	let http_client = Arc::new(ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	));
	let authorizer =
		<DeviceAuthorizer<ReqwestHttpClient>>::with_http_client(config.clone(), http_client.clone());
	let code = authorizer.request_code().await?;

	println!("Visit {} and enter {}.", code.display_uri(), code.user_code);

	let token = authorizer.acquire_token(&code, code.expiry_deadline()).await?;

	println!("Received a {} token expiring in {:?}s.", token.token_type, token.expires_in);

	let key_store = Arc::new(KeyStore::<ReqwestHttpClient>::with_http_client(http_client));
	let validator = OfflineValidator::new(config, key_store);
	let keys = validator.refresh_keys().await?;
	let claims = validator.validate(token.access_token.expose())?;

	println!("Loaded {keys} signing key(s); token subject is {:?}.", claims.sub);

	device_mock.assert_async().await;
	token_mock.assert_async().await;
	jwks_mock.assert_async().await;

	Ok(())
}
