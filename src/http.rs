//! Transport primitives shared by the device flow, key store, and introspection validator.
//!
//! The module exposes [`AuthHttpClient`] so downstream crates can plug in custom HTTP stacks.
//! Every outbound request is an [`oauth2::HttpRequest`] built by the helpers below and every
//! transport failure is normalized into [`TransportError`] tagged with the [`Endpoint`] that
//! was being called.

// std
use std::ops::Deref;
// crates.io
pub use oauth2;
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError, TransportError},
};

const BODY_PREVIEW_LIMIT: usize = 256;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Abstraction over HTTP transports used for every provider call.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared (behind `Arc`)
/// between an authorizer, a key store, and validators. The handles they return must own
/// whatever state the request needs so the request future stays `Send`.
pub trait AuthHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle executing a single request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle ready to execute one request.
	fn handle(&self) -> Self::Handle;
}

/// Provider endpoints contacted by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Device authorization endpoint (RFC 8628 §3.1).
	DeviceAuthorization,
	/// Token endpoint polled with the device code.
	Token,
	/// JSON Web Key Set endpoint.
	Jwks,
	/// Token introspection endpoint (RFC 7662).
	Introspection,
}
impl Endpoint {
	/// Returns a stable label suitable for errors, spans, or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::DeviceAuthorization => "device_authorization",
			Endpoint::Token => "token",
			Endpoint::Jwks => "jwks",
			Endpoint::Introspection => "introspection",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider endpoints answer directly, so custom clients should disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl AuthHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`AuthHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Builds a `POST` carrying `params` as an `application/x-www-form-urlencoded` body.
pub(crate) fn form_post(url: &Url, params: &[(&str, &str)]) -> Result<HttpRequest> {
	let body = Serializer::new(String::new()).extend_pairs(params).finish();

	Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(body.into_bytes())
		.map_err(|e| ConfigError::from(e).into())
}

/// Builds a `POST` carrying `params` in the query string with an empty body.
pub(crate) fn query_post(url: &Url, params: &[(&str, &str)]) -> Result<HttpRequest> {
	let mut target = url.clone();

	target.query_pairs_mut().extend_pairs(params);

	Request::builder()
		.method(Method::POST)
		.uri(target.as_str())
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

/// Builds a plain `GET` expecting JSON.
pub(crate) fn json_get(url: &Url) -> Result<HttpRequest> {
	Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

/// Executes `request` and maps transport failures into crate errors.
pub(crate) async fn send<C>(
	client: &C,
	endpoint: Endpoint,
	request: HttpRequest,
) -> Result<HttpResponse>
where
	C: ?Sized + AuthHttpClient,
{
	let handle = client.handle();

	handle.call(request).await.map_err(|e| map_transport_error(endpoint, e))
}

/// Decodes a JSON body, reporting the failing path on error.
pub(crate) fn decode_json<T>(
	endpoint: Endpoint,
	response: &HttpResponse,
) -> Result<T, ProtocolError>
where
	T: DeserializeOwned,
{
	parse_json(response.body()).map_err(|source| ProtocolError::MalformedResponse {
		endpoint: endpoint.as_str(),
		status: response.status().as_u16(),
		source,
	})
}

/// Decodes a JSON byte slice, keeping the path of the first failing field.
pub(crate) fn parse_json<T>(body: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

/// Returns at most [`BODY_PREVIEW_LIMIT`] characters of the body for diagnostics.
pub(crate) fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let mut preview = String::new();

	for (idx, ch) in text.chars().enumerate() {
		if idx == BODY_PREVIEW_LIMIT {
			preview.push('…');

			break;
		}

		preview.push(ch);
	}

	preview
}

fn map_transport_error<E>(endpoint: Endpoint, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let endpoint = endpoint.as_str();

	match err {
		HttpClientError::Reqwest(inner) => TransportError::Network { endpoint, source: inner }.into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(source) => TransportError::Io { endpoint, source }.into(),
		HttpClientError::Other(message) => TransportError::Other { endpoint, message }.into(),
		_ => TransportError::Other { endpoint, message: "Unknown HTTP client failure".into() }
			.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn form_post_encodes_parameters() {
		let url = Url::parse("https://acme.okta.com/oauth2/v1/token").expect("URL should parse.");
		let request = form_post(&url, &[("client_id", "abc"), ("scope", "openid profile")])
			.expect("Form request should build.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.headers()[CONTENT_TYPE], FORM_CONTENT_TYPE);
		assert_eq!(request.body().as_slice(), b"client_id=abc&scope=openid+profile");
	}

	#[test]
	fn query_post_moves_parameters_into_the_url() {
		let url = Url::parse("https://acme.okta.com/oauth2/v1/introspect")
			.expect("URL should parse.");
		let request = query_post(&url, &[("token", "a b"), ("client_id", "abc")])
			.expect("Query request should build.");

		assert_eq!(request.uri().query(), Some("token=a+b&client_id=abc"));
		assert!(request.body().is_empty());
		assert!(request.headers().get(CONTENT_TYPE).is_none());
	}

	#[test]
	fn body_preview_truncates_long_bodies() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = body_preview(body.as_bytes());

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
		assert_eq!(body_preview(b"short"), "short");
	}

	#[test]
	fn decode_json_reports_the_failing_path() {
		let mut response = HttpResponse::new(br#"{"interval":"soon"}"#.to_vec());

		*response.status_mut() = oauth2::http::StatusCode::OK;

		#[derive(Debug, Deserialize)]
		struct Shape {
			#[allow(dead_code)]
			interval: u64,
		}

		let err = decode_json::<Shape>(Endpoint::DeviceAuthorization, &response)
			.expect_err("String interval should fail to decode.");

		match err {
			ProtocolError::MalformedResponse { endpoint, status, source } => {
				assert_eq!(endpoint, "device_authorization");
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "interval");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
