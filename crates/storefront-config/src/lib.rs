//! Configuration module for the storefront system.
//!
//! This module provides structures and utilities for managing storefront
//! configuration. It supports loading configuration from TOML files,
//! resolving `${ENV_VAR}` references, and validating that all required
//! configuration values are properly set before services are built.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the storefront service.
///
/// This structure contains all configuration sections required for the
/// service to operate: instance identity, the document-store backend,
/// the authentication provider, the live order feed, and the HTTP API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this storefront instance.
	pub storefront: StorefrontConfig,
	/// Configuration for the document-store backend.
	pub storage: StorageConfig,
	/// Configuration for the authentication provider.
	pub auth: AuthConfig,
	/// Configuration for the live order feed.
	#[serde(default)]
	pub orders: OrdersConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to this storefront instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorefrontConfig {
	/// Unique identifier for this instance, used in logs.
	pub id: String,
}

/// Configuration for the document-store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the authentication provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of auth implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the live order feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
	/// Whether the engine opens the live subscription at startup.
	/// When disabled, only manual refresh populates the order store.
	#[serde(default = "default_live_feed")]
	pub live_feed: bool,
}

impl Default for OrdersConfig {
	fn default() -> Self {
		Self {
			live_feed: default_live_feed(),
		}
	}
}

/// Returns the default live-feed toggle.
///
/// The live subscription is on unless configuration turns it off.
fn default_live_feed() -> bool {
	true
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	3000
}

/// Returns the default API timeout in seconds.
fn default_api_timeout() -> u64 {
	30
}

/// Resolves `${ENV_VAR}` references in raw configuration text.
///
/// Unset variables are a validation error rather than an empty
/// substitution, so a missing secret fails at startup.
pub fn resolve_env_vars(content: &str) -> Result<String, ConfigError> {
	let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
		.map_err(|e| ConfigError::Parse(e.to_string()))?;
	let mut missing = Vec::new();
	let resolved = pattern.replace_all(content, |caps: &regex::Captures<'_>| {
		let name = &caps[1];
		match std::env::var(name) {
			Ok(value) => value,
			Err(_) => {
				missing.push(name.to_string());
				String::new()
			}
		}
	});
	if missing.is_empty() {
		Ok(resolved.into_owned())
	} else {
		Err(ConfigError::Validation(format!(
			"Unset environment variables referenced in config: {}",
			missing.join(", ")
		)))
	}
}

impl Config {
	/// Loads configuration from a TOML file.
	pub async fn from_file_async(path: &str) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Validates the configuration beyond what serde can express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.storefront.id.is_empty() {
			return Err(ConfigError::Validation("storefront.id must not be empty".into()));
		}
		if !self.storage.implementations.contains_key(&self.storage.primary) {
			return Err(ConfigError::Validation(format!(
				"storage.primary '{}' has no matching entry in storage.implementations",
				self.storage.primary
			)));
		}
		if !self.auth.implementations.contains_key(&self.auth.primary) {
			return Err(ConfigError::Validation(format!(
				"auth.primary '{}' has no matching entry in auth.implementations",
				self.auth.primary
			)));
		}
		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = r#"
		[storefront]
		id = "storefront-test"

		[storage]
		primary = "memory"
		[storage.implementations.memory]

		[auth]
		primary = "static"
		[auth.implementations.static]
		id = "op-1"
		username = "operator"
		role = "admin"

		[api]
		enabled = true
		port = 8080
	"#;

	#[test]
	fn parses_sample_config() {
		let config: Config = SAMPLE.parse().unwrap();
		assert_eq!(config.storefront.id, "storefront-test");
		assert_eq!(config.storage.primary, "memory");
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.port, 8080);
		assert_eq!(api.host, "127.0.0.1");
		assert!(config.orders.live_feed);
	}

	#[test]
	fn rejects_unknown_primary_storage() {
		let broken = SAMPLE.replace("primary = \"memory\"", "primary = \"redis\"");
		let result: Result<Config, _> = broken.parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn resolves_env_vars_in_config_text() {
		std::env::set_var("STOREFRONT_TEST_ID", "from-env");
		let text = SAMPLE.replace("storefront-test", "${STOREFRONT_TEST_ID}");
		let config: Config = text.parse().unwrap();
		assert_eq!(config.storefront.id, "from-env");
	}

	#[test]
	fn unset_env_var_is_a_validation_error() {
		let text = SAMPLE.replace("storefront-test", "${STOREFRONT_UNSET_VAR}");
		let result: Result<Config, _> = text.parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}
}
