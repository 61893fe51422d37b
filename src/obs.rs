//! Optional observability helpers for device flows and validators.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `device_authorization.flow` with the `flow`
//!   and `stage` fields, plus `debug` events for every poll signal.
//! - Enable `metrics` to increment the `device_authorization_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `device_authorization_poll_total` counter labeled by `signal`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const FINGERPRINT_LEN: usize = 16;

/// Operations observed by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Device authorization request.
	DeviceCode,
	/// Token polling loop.
	TokenPoll,
	/// JWKS fetch and key reconstruction.
	KeySetRefresh,
	/// Signature and claim checks against cached keys.
	OfflineValidation,
	/// Validation through the provider's introspection endpoint.
	Introspection,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::DeviceCode => "device_code",
			FlowKind::TokenPoll => "token_poll",
			FlowKind::KeySetRefresh => "key_set_refresh",
			FlowKind::OfflineValidation => "offline_validation",
			FlowKind::Introspection => "introspection",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Short, non-reversible identifier for a token, safe to log in place of the token itself.
pub fn token_fingerprint(token: &str) -> String {
	let digest = Sha256::digest(token.as_bytes());
	let mut encoded = URL_SAFE_NO_PAD.encode(digest);

	encoded.truncate(FINGERPRINT_LEN);

	encoded
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fingerprints_are_stable_and_short() {
		let first = token_fingerprint("eyJhbGciOiJSUzI1NiJ9.payload.signature");
		let second = token_fingerprint("eyJhbGciOiJSUzI1NiJ9.payload.signature");

		assert_eq!(first, second);
		assert_eq!(first.len(), FINGERPRINT_LEN);
		assert!(!first.contains("eyJ"));
		assert_ne!(first, token_fingerprint("another-token"));
	}
}
