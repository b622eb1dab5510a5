//! Registry trait for self-registering implementations.
//!
//! This module provides the base trait that all pluggable implementations
//! must implement to register themselves with their configuration name and
//! factory function.

/// Base trait for implementation registries.
///
/// Each implementation module (storage backends, auth providers) provides a
/// `Registry` struct implementing this trait, tying the name used in TOML
/// configuration to the factory that builds the implementation.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example
	/// "memory" for `storage.implementations.memory` or "static" for
	/// `auth.implementations.static`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
