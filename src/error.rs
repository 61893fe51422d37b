//! Crate-level error types shared across flows, key stores, and validators.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Transient poll signals (`authorization_pending`, `slow_down`) never surface here; they are
/// absorbed by the token acquisition loop.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Provider answered with an unexpected status or an undecodable body.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Key set could not be fetched or reconstructed.
	#[error(transparent)]
	KeySet(#[from] KeySetError),
	/// Presented token failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// The user refused the authorization request.
	#[error("Access denied by user.")]
	AccessDenied,
	/// Provider ended the authorization attempt with a terminal OAuth error.
	#[error("Authorization failed: {code}.")]
	AuthorizationFailed {
		/// Provider-supplied OAuth `error` code.
		code: String,
		/// Provider-supplied `error_description`, when present.
		description: Option<String>,
	},
	/// Caller's cancellation signal fired before a terminal outcome was reached.
	#[error("Authorization attempt was cancelled.")]
	Cancelled,
}

/// Configuration and validation failures raised before any request leaves the process.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No factory is registered under the requested provider name.
	#[error("Provider `{name}` is not registered.")]
	ProviderNotFound {
		/// Requested provider name.
		name: String,
	},
	/// Provider factory produced an invalid configuration.
	#[error("Provider `{name}` produced an invalid configuration.")]
	InvalidProvider {
		/// Provider name whose factory failed.
		name: String,
		/// Underlying validation failure.
		#[source]
		source: crate::provider::ProviderConfigError,
	},
	/// Identifier (provider, organization, client) failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Provider configuration lacks an endpoint required by the requested operation.
	#[error("Provider `{provider}` does not declare a {endpoint} endpoint.")]
	MissingEndpoint {
		/// Provider name.
		provider: String,
		/// Missing endpoint label.
		endpoint: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO). Never retried by this crate.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label (device_authorization, token, jwks, introspection).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the {endpoint} endpoint.")]
	Io {
		/// Endpoint label.
		endpoint: &'static str,
		/// IO failure.
		#[source]
		source: std::io::Error,
	},
	/// HTTP client failed without a structured error.
	#[error("HTTP client error occurred while calling the {endpoint} endpoint: {message}.")]
	Other {
		/// Endpoint label.
		endpoint: &'static str,
		/// Message reported by the HTTP client.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Provider responses that violate the expected protocol.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Device authorization endpoint returned a non-200 status.
	#[error("Device authorization request failed with HTTP {status}: {body}.")]
	AuthRequestFailed {
		/// HTTP status code.
		status: u16,
		/// Truncated response body for diagnostics.
		body: String,
	},
	/// Introspection endpoint returned a non-200 status.
	#[error("Introspection request failed with HTTP {status}: {body}.")]
	IntrospectionRequestFailed {
		/// HTTP status code.
		status: u16,
		/// Truncated response body for diagnostics.
		body: String,
	},
	/// Response body could not be decoded into the expected JSON shape.
	#[error("The {endpoint} endpoint returned malformed JSON (HTTP {status}).")]
	MalformedResponse {
		/// Endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint reported success without an access token.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
}

/// Failures raised while fetching or reconstructing a JSON Web Key Set.
#[derive(Debug, ThisError)]
pub enum KeySetError {
	/// JWKS endpoint returned a non-200 status.
	#[error("JWKS request failed with HTTP {status}: {body}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body for diagnostics.
		body: String,
	},
	/// JWKS document could not be decoded.
	#[error("JWKS document is malformed.")]
	Document {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// RSA key is missing a required component.
	#[error("JWK `{kid}` is missing the `{component}` component.")]
	MissingComponent {
		/// Key identifier.
		kid: String,
		/// Component name (`n` or `e`).
		component: &'static str,
	},
	/// RSA component is not valid base64url.
	#[error("JWK `{kid}` has a malformed `{component}` component.")]
	InvalidComponent {
		/// Key identifier.
		kid: String,
		/// Component name (`n` or `e`).
		component: &'static str,
		/// Decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// RSA exponent has more than eight significant bytes, so it cannot be held as a `u64`.
	#[error("JWK `{kid}` exponent has more than 8 significant bytes.")]
	ExponentTooLarge {
		/// Key identifier.
		kid: String,
	},
	/// Components do not form a usable RSA public key.
	#[error("JWK `{kid}` does not describe a valid RSA public key: {reason}.")]
	InvalidRsaKey {
		/// Key identifier.
		kid: String,
		/// Which structural check failed.
		reason: &'static str,
	},
}

/// Local, non-retryable token validation failures.
///
/// Variants identify which check failed for audit logging; none of them carry the raw token.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Token header or claims could not be decoded.
	#[error("Token is malformed: {reason}.")]
	MalformedToken {
		/// Decoder-supplied reason.
		reason: String,
	},
	/// Header lacks a `kid`, or the `kid` is not present in the key store.
	#[error("Unknown key id: {}.", .kid.as_deref().unwrap_or("<missing>"))]
	UnknownKeyId {
		/// Key identifier from the token header, if any.
		kid: Option<String>,
	},
	/// Header algorithm is not an allowed RSA signature scheme.
	#[error("Unsupported signature algorithm: {alg}.")]
	UnsupportedAlgorithm {
		/// Algorithm named by the token header.
		alg: String,
	},
	/// Referenced key cannot verify RSA signatures.
	#[error("Key `{kid}` cannot verify RSA signatures ({reason}).")]
	UnsupportedKey {
		/// Key identifier.
		kid: String,
		/// Why the key was rejected.
		reason: String,
	},
	/// Referenced key declares a different algorithm than the token header.
	#[error("Key `{kid}` is bound to {expected} but the token uses {actual}.")]
	KeyAlgorithmMismatch {
		/// Key identifier.
		kid: String,
		/// Algorithm declared by the JWK.
		expected: String,
		/// Algorithm declared by the token header.
		actual: String,
	},
	/// Signature does not verify against the resolved key.
	#[error("Token signature is invalid.")]
	InvalidSignature,
	/// `iss` does not match the configured issuer.
	#[error("Invalid issuer: expected {expected}, found {}.", .actual.as_deref().unwrap_or("<missing>"))]
	InvalidIssuer {
		/// Configured issuer.
		expected: String,
		/// Issuer carried by the token.
		actual: Option<String>,
	},
	/// `aud` does not match the configured audience.
	#[error("Invalid audience: expected {expected}.")]
	InvalidAudience {
		/// Configured audience.
		expected: String,
	},
	/// A claim required by the check is absent.
	#[error("Token is missing the `{claim}` claim.")]
	MissingClaim {
		/// Claim name.
		claim: &'static str,
	},
	/// `exp` is not strictly after the current time.
	#[error("Token expired at {exp}.")]
	TokenExpired {
		/// Expiry as a Unix timestamp.
		exp: i64,
	},
	/// `nbf` is after the current time.
	#[error("Token is not valid before {nbf}.")]
	TokenNotYetValid {
		/// Not-before as a Unix timestamp.
		nbf: i64,
	},
	/// Introspection reported the token as inactive.
	#[error("Token is inactive.")]
	InactiveToken,
	/// Introspection reported a different client id.
	#[error("Token was issued to client {}, expected {expected}.", .actual.as_deref().unwrap_or("<missing>"))]
	ClientMismatch {
		/// Configured client id.
		expected: String,
		/// Client id reported by introspection.
		actual: Option<String>,
	},
}
