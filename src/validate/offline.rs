//! Offline validation: RSA signature against cached keys plus local claim checks.

// crates.io
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
// self
use crate::{
	_prelude::*,
	error::ValidationError,
	http::AuthHttpClient,
	jwks::{KeyMaterial, KeyStore, StoredKey},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderConfig,
	validate::{self, Claims, TokenValidator, ValidationFuture, ValidationOptions},
};

/// Validates tokens against a [`KeyStore`] populated by [`KeyStore::initialize`].
///
/// The store is shared; several validators (or several providers' validators) may hold the
/// same `Arc`. Each call works on one snapshot of the key set.
pub struct OfflineValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	config: Arc<ProviderConfig>,
	keys: Arc<KeyStore<C>>,
	options: ValidationOptions,
}
impl<C> OfflineValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	/// Creates a validator for `config` backed by `keys`, using default options.
	pub fn new(config: impl Into<Arc<ProviderConfig>>, keys: Arc<KeyStore<C>>) -> Self {
		Self { config: config.into(), keys, options: ValidationOptions::default() }
	}

	/// Overrides the validation options.
	pub fn with_options(mut self, options: ValidationOptions) -> Self {
		self.options = options;

		self
	}

	/// Shared key store.
	pub fn key_store(&self) -> &Arc<KeyStore<C>> {
		&self.keys
	}

	/// Fetches the provider's JWKS into the key store, returning the number of keys.
	pub async fn refresh_keys(&self) -> Result<usize> {
		self.keys.initialize(&self.config.endpoints.jwks).await
	}

	/// Validates `token` at the current UTC time.
	pub fn validate(&self, token: &str) -> Result<Claims, ValidationError> {
		self.validate_at(token, OffsetDateTime::now_utc())
	}

	/// Validates `token` as if the current time were `now`.
	pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, ValidationError> {
		const KIND: FlowKind = FlowKind::OfflineValidation;

		let _span =
			FlowSpan::with_token(KIND, "validate", &obs::token_fingerprint(token)).entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.check(token, now);

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				obs::trace_rejection(KIND, e);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	fn check(&self, token: &str, now: OffsetDateTime) -> Result<Claims, ValidationError> {
		let header = jsonwebtoken::decode_header(token).map_err(malformed)?;
		let kid = header.kid.ok_or(ValidationError::UnknownKeyId { kid: None })?;
		let snapshot = self.keys.snapshot();
		let key = snapshot
			.get(&kid)
			.ok_or_else(|| ValidationError::UnknownKeyId { kid: Some(kid.clone()) })?;

		if !self.options.allows(header.alg) {
			return Err(ValidationError::UnsupportedAlgorithm { alg: alg_name(header.alg) });
		}

		let claims = verify_signature(token, key, header.alg)?;

		validate::check_issuer(claims.iss.as_deref(), &self.config.issuer)?;
		validate::check_audience(claims.aud.as_ref(), &self.config.audience)?;
		validate::check_expiry(claims.exp, now, self.options.leeway)?;
		validate::check_not_before(claims.nbf, now, self.options.leeway)?;

		Ok(claims)
	}
}
impl<C> TokenValidator for OfflineValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn initialize(&self) -> ValidationFuture<'_, ()> {
		Box::pin(async move { self.refresh_keys().await.map(|_| ()) })
	}

	fn validate<'a>(&'a self, token: &'a str) -> ValidationFuture<'a, ()> {
		Box::pin(async move {
			OfflineValidator::validate(self, token).map(|_| ()).map_err(Into::into)
		})
	}
}
impl<C> Debug for OfflineValidator<C>
where
	C: ?Sized + AuthHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OfflineValidator")
			.field("provider", &self.config.provider)
			.field("issuer", &self.config.issuer)
			.field("audience", &self.config.audience)
			.field("options", &self.options)
			.finish()
	}
}

fn verify_signature(
	token: &str,
	key: &StoredKey,
	alg: Algorithm,
) -> Result<Claims, ValidationError> {
	if key.key_use.as_deref() == Some("enc") {
		return Err(ValidationError::UnsupportedKey {
			kid: key.kid.clone(),
			reason: "key is reserved for encryption".into(),
		});
	}
	if let Some(expected) = key.alg.as_deref().filter(|expected| *expected != alg_name(alg)) {
		return Err(ValidationError::KeyAlgorithmMismatch {
			kid: key.kid.clone(),
			expected: expected.to_owned(),
			actual: alg_name(alg),
		});
	}

	let decoding = match &key.material {
		KeyMaterial::Rsa { decoding, .. } => decoding,
		KeyMaterial::Unsupported { kty } =>
			return Err(ValidationError::UnsupportedKey {
				kid: key.kid.clone(),
				reason: format!("key type {kty} is not RSA"),
			}),
	};
	// Signature only; claims are checked by the named functions afterwards.
	let mut validation = Validation::new(alg);

	validation.validate_exp = false;
	validation.validate_nbf = false;
	validation.validate_aud = false;
	validation.required_spec_claims.clear();

	jsonwebtoken::decode::<Claims>(token, decoding, &validation).map(|data| data.claims).map_err(
		|e| {
			let bad_signature = matches!(
				e.kind(),
				ErrorKind::InvalidSignature
					| ErrorKind::InvalidRsaKey(_)
					| ErrorKind::InvalidAlgorithm
					| ErrorKind::Crypto(_)
			);

			if bad_signature { ValidationError::InvalidSignature } else { malformed(e) }
		},
	)
}

fn malformed(e: jsonwebtoken::errors::Error) -> ValidationError {
	ValidationError::MalformedToken { reason: e.to_string() }
}

fn alg_name(alg: Algorithm) -> String {
	format!("{alg:?}")
}
