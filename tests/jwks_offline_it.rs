// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use device_authorization::{
	_preludet::*,
	auth::{ClientId, ProviderName},
	error::{KeySetError, ValidationError},
	http::ReqwestHttpClient,
	jsonwebtoken::{Algorithm, EncodingKey, Header},
	provider::ProviderConfig,
	validate::{Audience, OfflineValidator, TokenValidator, ValidationOptions},
};

const ISSUER: &str = "https://acme.auth0.com/";
const AUDIENCE: &str = "https://acme.auth0.com";
const SIGNING_KID: &str = "signing-2024";
const SIGNING_N: &str = "4_wPLt0JpGG5KmaUOhX5-PfT3cG-KsE_Pwc491dKKXxfIeeoEFX0HulVWLNk6MXQ1VCcGpan35_Br2PQkyf-qJoLXpXHDKWrxirV1tctF3T-sbthy0DMBjeiX7TVeE305GhK3lr9by7UspDKjWjRrT8pqvjI3wrtpvW3oyDeKK62lzSlGSfbqqg3EqMTop86vUWAxHF19obr6NgH16t28wmRA8oDniddy1hZe4-ThDnpydmjMDcwRSP1CtRUeLcSLpy90ZdHi5553rWlBhxx1GtA_hYG9UK4EtOtqwtjMcedxO7zx49K6QVYLUEUqc-endllfpF1LKdiyn5PlNM__w";
const ROGUE_N: &str = "2Gn8aJ5vfAVf9QdS50goCFdz4WwDtGLTboBiYauG5WeKgM1FvBATpRNmPzxbNu_Gwe0_TKmcuvzOsl4af1NdGQG6WaZMUoCXViFSSZHbObDUpIHdVInU-wIoP5PkmS1pQejN0WBx66YbnrZGot8g1c-UeG072A_cybrxZwIyR6EDEubULsdfnjs0OU74KvOe16FpvtsO4xr64Mn4k-7IfAzDz04qJ0Ehg5Ouxq9SErB_eVaJXvSq_5XiLj0vkGmK6L0iYaJAERIiDW0n0TtvuO0R2U9jSYlrzPMQ0LDUMwZh_-fV6AEN3NQuSpdzjJ8zG9wwgyDcZ_J8FGYofj5cMw";
const SIGNING_PEM: &[u8] = include_bytes!("fixtures/signing_key.pem");
const ROGUE_PEM: &[u8] = include_bytes!("fixtures/rogue_key.pem");

fn build_config(server: &MockServer) -> ProviderConfig {
	ProviderConfig::builder(
		ProviderName::new("mock-jwks").expect("Provider name should be valid for JWKS tests."),
		ClientId::new("cli-jwks").expect("Client id should be valid for JWKS tests."),
	)
	.device_authorization_endpoint(
		Url::parse(&server.url("/device")).expect("Mock device endpoint should parse."),
	)
	.token_endpoint(Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."))
	.jwks_endpoint(Url::parse(&server.url("/jwks")).expect("Mock JWKS endpoint should parse."))
	.audience(AUDIENCE)
	.issuer(ISSUER)
	.build()
	.expect("Mock provider config should build.")
}

fn jwks_body() -> String {
	json!({
		"keys": [
			{ "kty": "RSA", "kid": SIGNING_KID, "use": "sig", "alg": "RS256", "n": SIGNING_N, "e": "AQAB" },
			{ "kty": "RSA", "kid": "rotated-out", "use": "sig", "n": ROGUE_N, "e": "AQAB" },
			{ "kty": "EC", "kid": "ec-1", "crv": "P-256", "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU", "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0" }
		]
	})
	.to_string()
}

fn now() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

fn valid_claims() -> Value {
	json!({
		"iss": ISSUER,
		"sub": "auth0|user-1",
		"aud": [AUDIENCE, "https://acme.auth0.com/userinfo"],
		"iat": now(),
		"exp": now() + 600,
		"scope": "openid profile offline_access",
	})
}

fn sign(kid: Option<&str>, alg: Algorithm, pem: &[u8], claims: &Value) -> String {
	let mut header = Header::new(alg);

	header.kid = kid.map(str::to_owned);

	jsonwebtoken::encode(
		&header,
		claims,
		&EncodingKey::from_rsa_pem(pem).expect("Fixture key should parse."),
	)
	.expect("Token should sign.")
}

fn sign_valid(claims: &Value) -> String {
	sign(Some(SIGNING_KID), Algorithm::RS256, SIGNING_PEM, claims)
}

async fn ready_validator(server: &MockServer) -> OfflineValidator<ReqwestHttpClient> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks");
			then.status(200).header("content-type", "application/json").body(jwks_body());
		})
		.await;

	let validator = OfflineValidator::new(build_config(server), build_reqwest_test_key_store());
	let count = validator.refresh_keys().await.expect("JWKS refresh should succeed.");

	assert_eq!(count, 3);

	validator
}

#[tokio::test]
async fn valid_tokens_pass_and_expose_claims() {
	let server = MockServer::start_async().await;
	let validator = ready_validator(&server).await;
	let claims = validator.validate(&sign_valid(&valid_claims())).expect("Token should validate.");

	assert_eq!(claims.iss.as_deref(), Some(ISSUER));
	assert_eq!(claims.sub.as_deref(), Some("auth0|user-1"));
	assert!(matches!(claims.aud, Some(Audience::Multiple(ref values)) if values.len() == 2));
	assert_eq!(claims.scope.as_deref(), Some("openid profile offline_access"));
}

#[tokio::test]
async fn validator_trait_objects_initialize_and_validate() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks");
			then.status(200).header("content-type", "application/json").body(jwks_body());
		})
		.await;
	let validator: Box<dyn TokenValidator> =
		Box::new(OfflineValidator::new(build_config(&server), build_reqwest_test_key_store()));

	validator.initialize().await.expect("Initialization should fetch the JWKS.");
	validator
		.validate(&sign_valid(&valid_claims()))
		.await
		.expect("Token should validate through the trait object.");

	mock.assert_async().await;
}

#[tokio::test]
async fn each_failed_check_is_reported_specifically() {
	let server = MockServer::start_async().await;
	let validator = ready_validator(&server).await;
	let reject = |token: String| validator.validate(&token).expect_err("Token should be rejected.");
	let mut wrong_issuer = valid_claims();
	let mut wrong_audience = valid_claims();
	let mut expired = valid_claims();
	let mut future = valid_claims();
	let mut no_expiry = valid_claims();

	wrong_issuer["iss"] = json!("https://evil.example/");
	wrong_audience["aud"] = json!("https://other.example");
	expired["exp"] = json!(now() - 60);
	future["nbf"] = json!(now() + 3_600);
	no_expiry.as_object_mut().expect("Claims should be an object.").remove("exp");

	assert_eq!(
		reject(sign(None, Algorithm::RS256, SIGNING_PEM, &valid_claims())),
		ValidationError::UnknownKeyId { kid: None }
	);
	assert_eq!(
		reject(sign(Some("missing"), Algorithm::RS256, SIGNING_PEM, &valid_claims())),
		ValidationError::UnknownKeyId { kid: Some("missing".into()) }
	);
	assert_eq!(
		reject(sign(Some(SIGNING_KID), Algorithm::RS256, ROGUE_PEM, &valid_claims())),
		ValidationError::InvalidSignature
	);
	assert_eq!(
		reject(sign(Some("rotated-out"), Algorithm::RS256, SIGNING_PEM, &valid_claims())),
		ValidationError::InvalidSignature
	);
	assert_eq!(
		reject(sign(Some(SIGNING_KID), Algorithm::RS384, SIGNING_PEM, &valid_claims())),
		ValidationError::KeyAlgorithmMismatch {
			kid: SIGNING_KID.into(),
			expected: "RS256".into(),
			actual: "RS384".into(),
		}
	);
	assert!(matches!(
		reject(sign(Some("ec-1"), Algorithm::RS256, SIGNING_PEM, &valid_claims())),
		ValidationError::UnsupportedKey { ref kid, .. } if kid == "ec-1"
	));
	assert!(matches!(
		reject(sign_valid(&wrong_issuer)),
		ValidationError::InvalidIssuer { ref actual, .. } if actual.as_deref() == Some("https://evil.example/")
	));
	assert_eq!(
		reject(sign_valid(&wrong_audience)),
		ValidationError::InvalidAudience { expected: AUDIENCE.into() }
	);
	assert!(matches!(reject(sign_valid(&expired)), ValidationError::TokenExpired { .. }));
	assert!(matches!(reject(sign_valid(&future)), ValidationError::TokenNotYetValid { .. }));
	assert_eq!(reject(sign_valid(&no_expiry)), ValidationError::MissingClaim { claim: "exp" });
	assert!(matches!(reject("not-a-jwt".into()), ValidationError::MalformedToken { .. }));
}

#[tokio::test]
async fn rotated_out_keys_still_verify_their_own_tokens() {
	let server = MockServer::start_async().await;
	let validator = ready_validator(&server).await;

	validator
		.validate(&sign(Some("rotated-out"), Algorithm::RS256, ROGUE_PEM, &valid_claims()))
		.expect("Older keys without an alg binding should still verify.");
	validator
		.validate(&sign(Some("rotated-out"), Algorithm::PS256, ROGUE_PEM, &valid_claims()))
		.expect("PSS signatures should verify against the same RSA key.");
}

#[tokio::test]
async fn algorithm_allow_list_and_leeway_are_configurable() {
	let server = MockServer::start_async().await;
	let validator = ready_validator(&server).await.with_options(
		ValidationOptions::default().with_algorithms([Algorithm::RS512]).with_leeway(120),
	);
	let mut recently_expired = valid_claims();

	recently_expired["exp"] = json!(now() - 30);

	assert_eq!(
		validator.validate(&sign_valid(&valid_claims())),
		Err(ValidationError::UnsupportedAlgorithm { alg: "RS256".into() })
	);

	let lenient = ready_validator(&server)
		.await
		.with_options(ValidationOptions::default().with_leeway(120));

	lenient.validate(&sign_valid(&recently_expired)).expect("Leeway should absorb the skew.");
}

#[tokio::test]
async fn failed_refreshes_keep_the_previous_keys() {
	let server = MockServer::start_async().await;
	let validator = ready_validator(&server).await;
	let store = validator.key_store();
	let broken = server
		.mock_async(|when, then| {
			when.method(GET).path("/broken");
			then.status(503).body("maintenance");
		})
		.await;
	let garbage = server
		.mock_async(|when, then| {
			when.method(GET).path("/garbage");
			then.status(200).header("content-type", "application/json").body("{\"keys\":\"nope\"}");
		})
		.await;
	let bad_key = server
		.mock_async(|when, then| {
			when.method(GET).path("/bad-key");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"keys\":[{\"kty\":\"RSA\",\"kid\":\"k\",\"n\":\"AQAB\"}]}");
		})
		.await;
	let err = store
		.initialize(&Url::parse(&server.url("/broken")).expect("URL should parse."))
		.await
		.expect_err("Non-200 JWKS should fail.");

	assert!(matches!(
		err,
		Error::KeySet(KeySetError::Status { status: 503, ref body }) if body == "maintenance"
	));

	let err = store
		.initialize(&Url::parse(&server.url("/garbage")).expect("URL should parse."))
		.await
		.expect_err("Malformed JWKS should fail.");

	assert!(matches!(err, Error::KeySet(KeySetError::Document { .. })));

	let err = store
		.initialize(&Url::parse(&server.url("/bad-key")).expect("URL should parse."))
		.await
		.expect_err("Incomplete key should fail.");

	assert!(matches!(
		err,
		Error::KeySet(KeySetError::MissingComponent { component: "e", .. })
	));

	broken.assert_async().await;
	garbage.assert_async().await;
	bad_key.assert_async().await;

	assert_eq!(store.snapshot().kids(), ["ec-1", "rotated-out", SIGNING_KID]);

	validator
		.validate(&sign_valid(&valid_claims()))
		.expect("Previous keys should remain in effect.");
}

#[tokio::test]
async fn one_store_serves_several_validators() {
	let server = MockServer::start_async().await;
	let first = ready_validator(&server).await;
	let second = OfflineValidator::new(build_config(&server), Arc::clone(first.key_store()));
	let token = sign_valid(&valid_claims());

	second.validate(&token).expect("Shared store should serve the second validator.");
	first.validate(&token).expect("Shared store should serve the first validator.");
	assert!(Arc::ptr_eq(first.key_store(), second.key_store()));
}
