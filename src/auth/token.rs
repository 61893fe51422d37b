//! Token issued at the end of a successful device authorization.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token (plus optional companions) returned by the token endpoint.
///
/// Produced exactly once per successful acquisition and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one (requires `offline_access` on most IdPs).
	pub refresh_token: Option<TokenSecret>,
	/// OIDC ID token, if the provider issued one.
	pub id_token: Option<TokenSecret>,
	/// Token type reported by the provider (usually `Bearer`).
	pub token_type: String,
	/// Lifetime in seconds reported by the provider.
	pub expires_in: Option<u64>,
	/// Scopes granted, as the raw space-delimited string returned by the provider.
	pub scope: Option<String>,
	/// Local instant at which the token response was received.
	pub received_at: OffsetDateTime,
}
impl Token {
	/// Absolute expiry derived from `received_at + expires_in`, when the provider reported one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let secs = i64::try_from(self.expires_in?).ok()?;

		self.received_at.checked_add(Duration::seconds(secs))
	}

	/// Returns true when the reported lifetime has elapsed at `now`.
	///
	/// Tokens without `expires_in` are never considered expired locally.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| now >= expires_at)
	}

	/// Formats the value for an `Authorization` header.
	pub fn authorization_header(&self) -> String {
		let scheme = if self.token_type.is_empty() { "Bearer" } else { &self.token_type };

		format!("{scheme} {}", self.access_token.expose())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn token(expires_in: Option<u64>) -> Token {
		Token {
			access_token: TokenSecret::new("tok123"),
			refresh_token: None,
			id_token: None,
			token_type: "Bearer".into(),
			expires_in,
			scope: None,
			received_at: macros::datetime!(2025-11-10 12:00 UTC),
		}
	}

	#[test]
	fn expiry_is_derived_from_received_at() {
		let token = token(Some(3600));

		assert_eq!(token.expires_at(), Some(macros::datetime!(2025-11-10 13:00 UTC)));
		assert!(!token.is_expired_at(macros::datetime!(2025-11-10 12:59:59 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-11-10 13:00 UTC)));
	}

	#[test]
	fn tokens_without_lifetime_never_expire_locally() {
		let token = token(None);

		assert_eq!(token.expires_at(), None);
		assert!(!token.is_expired_at(macros::datetime!(2099-01-01 0:00 UTC)));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let rendered = format!("{:?}", token(Some(60)));

		assert!(!rendered.contains("tok123"));
		assert_eq!(token(None).authorization_header(), "Bearer tok123");
	}
}
