//! Name → factory table used to resolve provider configurations.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, OrganizationId, ProviderName, Scopes},
	error::ConfigError,
	provider::{ProviderConfig, ProviderConfigError, builtin},
};

/// Factory producing a configuration from the caller-supplied seed.
pub type ProviderFactory =
	Arc<dyn Fn(ProviderSeed) -> Result<ProviderConfig, ProviderConfigError> + Send + Sync>;

/// Inputs handed to a [`ProviderFactory`].
#[derive(Clone, Debug)]
pub struct ProviderSeed {
	/// Organization substituted into endpoint templates.
	pub organization: OrganizationId,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Scopes to request; the registry's defaults unless overridden.
	pub scopes: Scopes,
}

/// Registration table mapping provider names to configuration factories.
///
/// Resolution never panics: unknown names surface as [`ConfigError::ProviderNotFound`].
#[derive(Clone)]
pub struct ProviderRegistry {
	factories: HashMap<ProviderName, ProviderFactory>,
	default_scopes: Scopes,
}
impl ProviderRegistry {
	/// Creates an empty registry using `openid profile offline_access` as default scopes.
	pub fn new() -> Self {
		Self { factories: HashMap::new(), default_scopes: Scopes::openid_defaults() }
	}

	/// Creates a registry pre-populated with the built-in providers (`auth0`, `okta`).
	pub fn builtin() -> Self {
		let mut registry = Self::new();

		builtin::register_all(&mut registry);

		registry
	}

	/// Replaces the scopes handed to factories.
	pub fn with_default_scopes(mut self, scopes: Scopes) -> Self {
		self.default_scopes = scopes;

		self
	}

	/// Adds or replaces the factory registered under `name`.
	pub fn register<F>(&mut self, name: ProviderName, factory: F) -> &mut Self
	where
		F: 'static + Fn(ProviderSeed) -> Result<ProviderConfig, ProviderConfigError> + Send + Sync,
	{
		self.factories.insert(name, Arc::new(factory));

		self
	}

	/// Returns true when a factory is registered under `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	/// Registered provider names in lexical order.
	pub fn names(&self) -> Vec<&ProviderName> {
		let mut names = self.factories.keys().collect::<Vec<_>>();

		names.sort();

		names
	}

	/// Resolves a configuration for `name` using the registry's default scopes.
	pub fn resolve(
		&self,
		name: &str,
		organization: &str,
		client_id: &str,
	) -> Result<ProviderConfig, ConfigError> {
		self.resolve_with_scopes(name, organization, client_id, self.default_scopes.clone())
	}

	/// Resolves a configuration for `name`, requesting `scopes` instead of the defaults.
	pub fn resolve_with_scopes(
		&self,
		name: &str,
		organization: &str,
		client_id: &str,
		scopes: Scopes,
	) -> Result<ProviderConfig, ConfigError> {
		let factory = self
			.factories
			.get(name)
			.ok_or_else(|| ConfigError::ProviderNotFound { name: name.to_owned() })?;
		let seed = ProviderSeed {
			organization: OrganizationId::new(organization)?,
			client_id: ClientId::new(client_id)?,
			scopes,
		};

		factory(seed).map_err(|source| ConfigError::InvalidProvider { name: name.to_owned(), source })
	}
}
impl Default for ProviderRegistry {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry")
			.field("providers", &self.names())
			.field("default_scopes", &self.default_scopes)
			.finish()
	}
}
