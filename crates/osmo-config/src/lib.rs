//! Configuration module for the Osmosis wallet client.
//!
//! Configuration is read from a TOML file (or string), environment variables
//! referenced as `${VAR}` or `${VAR:-default}` are substituted, and the result
//! is validated before use. Every section is optional; an empty file yields
//! the built-in Osmosis mainnet configuration.

use osmo_types::networks::{
	deserialize_networks, normalize_network_name, ADDRESS_PLACEHOLDER, HASH_PLACEHOLDER,
};
use osmo_types::{NetworkConfig, NetworkRegistry, NetworksConfig, OSMOSIS};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
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

/// Main configuration structure for the wallet client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
	/// Client-wide settings.
	#[serde(default)]
	pub client: ClientConfig,
	/// Settings for connections to nodes.
	#[serde(default)]
	pub node: NodeConfig,
	/// Network configurations keyed by network name.
	#[serde(
		default = "default_networks",
		deserialize_with = "deserialize_networks"
	)]
	pub networks: NetworksConfig,
}

/// Client-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
	/// Network used when a caller does not name one, and whose address prefix
	/// is used by the wallet address validator.
	#[serde(default = "default_network")]
	pub default_network: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			default_network: default_network(),
		}
	}
}

/// Settings for connections to nodes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeConfig {
	/// Per-request timeout in seconds.
	/// Defaults to 30 seconds if not specified.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			timeout_seconds: default_timeout_seconds(),
		}
	}
}

fn default_network() -> String {
	OSMOSIS.to_string()
}

fn default_timeout_seconds() -> u64 {
	30
}

fn default_networks() -> NetworksConfig {
	let mut networks = HashMap::new();
	networks.insert(OSMOSIS.to_string(), NetworkConfig::osmosis());
	networks
}

impl Default for Config {
	fn default() -> Self {
		Self {
			client: ClientConfig::default(),
			node: NodeConfig::default(),
			networks: default_networks(),
		}
	}
}

/// Largest configuration text accepted for substitution.
const MAX_CONFIG_BYTES: usize = 1024 * 1024;

/// Expands `${NAME}` and `${NAME:-fallback}` references from the process
/// environment. Names are upper-case; an unset name without a fallback is an
/// error naming it.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	if input.len() > MAX_CONFIG_BYTES {
		return Err(ConfigError::Validation(format!(
			"Configuration is {} bytes, above the {} byte limit",
			input.len(),
			MAX_CONFIG_BYTES
		)));
	}

	let pattern = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
		.map_err(|e| ConfigError::Parse(format!("Invalid substitution pattern: {}", e)))?;

	let mut unset = None;
	let expanded = pattern.replace_all(input, |caps: &Captures| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(fallback)) => fallback.as_str().to_string(),
			(Err(_), None) => {
				unset.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match unset {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' is not set",
			name
		))),
		None => Ok(expanded.into_owned()),
	}
}

impl Config {
	/// Loads configuration from a file, resolving environment variables and
	/// validating the result.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		let config: Config = content.parse()?;
		tracing::debug!(
			path = %path.display(),
			networks = config.networks.len(),
			"Loaded configuration"
		);
		Ok(config)
	}

	/// Builds the read-only network registry described by this configuration.
	pub fn registry(&self) -> NetworkRegistry {
		NetworkRegistry::new(self.networks.clone())
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method checks:
	/// - At least one network is configured and the default network is one of them
	/// - Every network has an HTTP(S) RPC URL, link templates with their
	///   placeholders, a lowercase alphanumeric address prefix, a chain id,
	///   a native denomination and a nonzero default gas limit
	/// - The node timeout is within bounds
	fn validate(&self) -> Result<(), ConfigError> {
		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"Networks configuration cannot be empty".into(),
			));
		}

		let default_network = normalize_network_name(&self.client.default_network);
		if !self.networks.contains_key(&default_network) {
			return Err(ConfigError::Validation(format!(
				"Default network '{}' not found in networks",
				self.client.default_network
			)));
		}

		for (name, network) in &self.networks {
			if !(network.rpc_url.starts_with("http://") || network.rpc_url.starts_with("https://"))
			{
				return Err(ConfigError::Validation(format!(
					"Network {} must have an http(s) rpc_url",
					name
				)));
			}
			if !network.transaction_link.contains(HASH_PLACEHOLDER) {
				return Err(ConfigError::Validation(format!(
					"Network {} transaction_link must contain {}",
					name, HASH_PLACEHOLDER
				)));
			}
			if !network.wallet_link.contains(ADDRESS_PLACEHOLDER) {
				return Err(ConfigError::Validation(format!(
					"Network {} wallet_link must contain {}",
					name, ADDRESS_PLACEHOLDER
				)));
			}
			if network.bech32_prefix.is_empty()
				|| !network
					.bech32_prefix
					.chars()
					.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
			{
				return Err(ConfigError::Validation(format!(
					"Network {} bech32_prefix must be non-empty lowercase alphanumeric",
					name
				)));
			}
			if network.chain_id.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} must have a chain_id",
					name
				)));
			}
			if network.native_denom.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} must have a native_denom",
					name
				)));
			}
			if network.default_gas == 0 {
				return Err(ConfigError::Validation(format!(
					"Network {} default_gas must be greater than 0",
					name
				)));
			}
		}

		if self.node.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Node timeout_seconds must be greater than 0".into(),
			));
		}
		if self.node.timeout_seconds > 300 {
			return Err(ConfigError::Validation(
				"Node timeout_seconds cannot exceed 300".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
