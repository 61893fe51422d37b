//! Typed JWT claims and the named checks applied to them.

// self
use crate::{_prelude::*, error::ValidationError};

/// `aud` as either a single string or an array of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// Single audience string.
	Single(String),
	/// Several audiences.
	Multiple(Vec<String>),
}
impl Audience {
	/// Returns true when `expected` equals the single value or appears in the list.
	pub fn contains(&self, expected: &str) -> bool {
		match self {
			Audience::Single(value) => value == expected,
			Audience::Multiple(values) => values.iter().any(|value| value == expected),
		}
	}
}

/// Registered and common claims decoded from a verified token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Issuer.
	pub iss: Option<String>,
	/// Subject.
	pub sub: Option<String>,
	/// Audience.
	pub aud: Option<Audience>,
	/// Expiry (Unix seconds).
	pub exp: Option<i64>,
	/// Not-before (Unix seconds).
	pub nbf: Option<i64>,
	/// Issued-at (Unix seconds).
	pub iat: Option<i64>,
	/// Token identifier.
	pub jti: Option<String>,
	/// Space-delimited granted scopes.
	pub scope: Option<String>,
	/// Client the token was issued to (`client_id`, or Okta's `cid`).
	#[serde(alias = "cid")]
	pub client_id: Option<String>,
}

/// `iss` must equal the configured issuer.
pub fn check_issuer(actual: Option<&str>, expected: &str) -> Result<(), ValidationError> {
	match actual {
		Some(iss) if iss == expected => Ok(()),
		_ => Err(ValidationError::InvalidIssuer {
			expected: expected.to_owned(),
			actual: actual.map(str::to_owned),
		}),
	}
}

/// `aud` must equal, or contain, the configured audience.
pub fn check_audience(actual: Option<&Audience>, expected: &str) -> Result<(), ValidationError> {
	if actual.is_some_and(|aud| aud.contains(expected)) {
		Ok(())
	} else {
		Err(ValidationError::InvalidAudience { expected: expected.to_owned() })
	}
}

/// `exp` must be present and strictly after `now` (widened by `leeway` seconds).
pub fn check_expiry(
	exp: Option<i64>,
	now: OffsetDateTime,
	leeway: u64,
) -> Result<(), ValidationError> {
	let exp = exp.ok_or(ValidationError::MissingClaim { claim: "exp" })?;

	if exp.saturating_add(leeway_secs(leeway)) > now.unix_timestamp() {
		Ok(())
	} else {
		Err(ValidationError::TokenExpired { exp })
	}
}

/// `nbf`, when present, must be at or before `now` (widened by `leeway` seconds).
pub fn check_not_before(
	nbf: Option<i64>,
	now: OffsetDateTime,
	leeway: u64,
) -> Result<(), ValidationError> {
	match nbf {
		Some(nbf) if nbf > now.unix_timestamp().saturating_add(leeway_secs(leeway)) =>
			Err(ValidationError::TokenNotYetValid { nbf }),
		_ => Ok(()),
	}
}

/// Reported client id must equal the configured one.
pub fn check_client(actual: Option<&str>, expected: &str) -> Result<(), ValidationError> {
	match actual {
		Some(client_id) if client_id == expected => Ok(()),
		_ => Err(ValidationError::ClientMismatch {
			expected: expected.to_owned(),
			actual: actual.map(str::to_owned),
		}),
	}
}

fn leeway_secs(leeway: u64) -> i64 {
	i64::try_from(leeway).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const NOW: OffsetDateTime = macros::datetime!(2025-07-25 16:00 UTC);

	#[test]
	fn audience_accepts_strings_and_arrays() {
		let single: Claims =
			serde_json::from_str(r#"{"aud":"https://acme.okta.com"}"#).expect("Claims decode.");
		let multiple: Claims =
			serde_json::from_str(r#"{"aud":["api://default","https://acme.okta.com"],"cid":"c1"}"#)
				.expect("Claims decode.");

		assert!(check_audience(single.aud.as_ref(), "https://acme.okta.com").is_ok());
		assert!(check_audience(multiple.aud.as_ref(), "https://acme.okta.com").is_ok());
		assert_eq!(multiple.client_id.as_deref(), Some("c1"));
		assert_eq!(
			check_audience(None, "https://acme.okta.com"),
			Err(ValidationError::InvalidAudience { expected: "https://acme.okta.com".into() })
		);
	}

	#[test]
	fn expiry_is_strict() {
		let now = NOW.unix_timestamp();

		assert!(check_expiry(Some(now + 1), NOW, 0).is_ok());
		assert_eq!(check_expiry(Some(now), NOW, 0), Err(ValidationError::TokenExpired { exp: now }));
		assert!(check_expiry(Some(now), NOW, 5).is_ok(), "Leeway widens the window.");
		assert_eq!(check_expiry(None, NOW, 0), Err(ValidationError::MissingClaim { claim: "exp" }));
	}

	#[test]
	fn not_before_allows_equality() {
		let now = NOW.unix_timestamp();

		assert!(check_not_before(None, NOW, 0).is_ok());
		assert!(check_not_before(Some(now), NOW, 0).is_ok());
		assert_eq!(
			check_not_before(Some(now + 60), NOW, 0),
			Err(ValidationError::TokenNotYetValid { nbf: now + 60 })
		);
		assert!(check_not_before(Some(now + 60), NOW, 60).is_ok());
	}

	#[test]
	fn issuer_and_client_mismatches_name_both_sides() {
		assert_eq!(
			check_issuer(Some("https://evil.example"), "https://acme.auth0.com/"),
			Err(ValidationError::InvalidIssuer {
				expected: "https://acme.auth0.com/".into(),
				actual: Some("https://evil.example".into()),
			})
		);
		assert_eq!(
			check_client(None, "c1"),
			Err(ValidationError::ClientMismatch { expected: "c1".into(), actual: None })
		);
		assert!(check_client(Some("c1"), "c1").is_ok());
	}
}
