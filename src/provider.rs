//! Provider configuration (data) and the registry that produces it.
//!
//! `config` exposes the validated, immutable [`ProviderConfig`] consumed by the device flow and
//! both validators. `registry` maps provider names to factory closures so new identity
//! providers can be added without touching the resolver, and `builtin` carries the factories
//! for the providers shipped with the crate.

pub mod builtin;
pub mod config;
pub mod registry;

pub use config::*;
pub use registry::*;
