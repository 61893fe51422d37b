//! OAuth 2.0 Device Authorization Grant for headless and CLI clients, paired with a token
//! validation engine that verifies tokens offline (JWKS signatures + claims) or online
//! (provider introspection).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod http;
pub mod jwks;
pub mod obs;
pub mod provider;
pub mod validate;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		error::ConfigError, flows::DeviceAuthorizer, http::ReqwestHttpClient, jwks::KeyStore,
		provider::ProviderConfig, validate::IntrospectionValidator,
	};

	/// Authorizer type alias used by reqwest-backed integration tests.
	pub type ReqwestTestAuthorizer = DeviceAuthorizer<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`DeviceAuthorizer`] backed by the insecure reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_authorizer(config: ProviderConfig) -> ReqwestTestAuthorizer {
		DeviceAuthorizer::with_http_client(config, test_reqwest_http_client())
	}

	/// Constructs an empty [`KeyStore`] backed by the insecure reqwest transport.
	pub fn build_reqwest_test_key_store() -> Arc<KeyStore<ReqwestHttpClient>> {
		Arc::new(KeyStore::with_http_client(test_reqwest_http_client()))
	}

	/// Constructs an [`IntrospectionValidator`] backed by the insecure reqwest transport.
	pub fn build_reqwest_test_introspector(
		config: ProviderConfig,
	) -> Result<IntrospectionValidator<ReqwestHttpClient>, ConfigError> {
		IntrospectionValidator::with_http_client(config, test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
