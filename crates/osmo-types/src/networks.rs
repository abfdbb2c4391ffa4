//! Network configuration types for the wallet client.
//!
//! This module defines the per-chain descriptor (RPC endpoint, identifiers,
//! explorer links and fee defaults) and the read-only registry that resolves a
//! network name to its descriptor.

use crate::proto::Coin;
use crate::utils::GasPrice;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Placeholder substituted by [`NetworkConfig::transaction_link`].
pub const HASH_PLACEHOLDER: &str = "{hash}";
/// Placeholder substituted by [`NetworkConfig::wallet_link`].
pub const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Errors raised when resolving network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
	/// The requested network name is not registered.
	#[error("Unknown network: {0}")]
	UnknownNetwork(String),
	/// The network's default gas limit is zero, so no gas price can be derived.
	#[error("Invalid gas limit for network {0}: default gas is zero")]
	InvalidGasLimit(String),
}

/// Configuration for a single Cosmos SDK network.
///
/// # Fields
///
/// * `rpc_url` - Tendermint/CometBFT RPC endpoint
/// * `transaction_link` - Explorer URL template containing `{hash}`
/// * `wallet_link` - Explorer URL template containing `{address}`
/// * `chain_id` - Chain identifier used in sign documents (e.g. "osmosis-1")
/// * `bech32_prefix` - Human readable part of account addresses (e.g. "osmo")
/// * `native_denom` - Base denomination of the staking token (e.g. "uosmo")
/// * `default_tx_fee` - Flat fee, in base units, attached to transfers
/// * `default_gas` - Gas limit attached to transfers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
	pub rpc_url: String,
	pub transaction_link: String,
	pub wallet_link: String,
	pub chain_id: String,
	pub bech32_prefix: String,
	pub native_denom: String,
	pub default_tx_fee: u64,
	pub default_gas: u64,
}

impl NetworkConfig {
	/// Formats the explorer link for a transaction hash.
	pub fn transaction_link(&self, hash: &str) -> String {
		self.transaction_link.replace(HASH_PLACEHOLDER, hash)
	}

	/// Formats the explorer link for a wallet address.
	pub fn wallet_link(&self, address: &str) -> String {
		self.wallet_link.replace(ADDRESS_PLACEHOLDER, address)
	}

	/// The Osmosis mainnet descriptor.
	pub fn osmosis() -> Self {
		Self {
			rpc_url: "https://rpc-osmosis.keplr.app/".to_string(),
			transaction_link: "https://www.mintscan.io/osmosis/txs/{hash}".to_string(),
			wallet_link: "https://www.mintscan.io/osmosis/account/{address}".to_string(),
			chain_id: "osmosis-1".to_string(),
			bech32_prefix: "osmo".to_string(),
			native_denom: "uosmo".to_string(),
			default_tx_fee: 0,
			default_gas: 200_000,
		}
	}
}

/// Fee attached to a transaction: coins paid plus the gas limit as a string,
/// the shape the signing client expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StdFee {
	pub amount: Vec<Coin>,
	pub gas: String,
}

/// Networks configuration mapping network names to their configurations.
pub type NetworksConfig = HashMap<String, NetworkConfig>;

/// Name under which the built-in Osmosis configuration is registered.
pub const OSMOSIS: &str = "osmosis";

/// Canonical form of a network name: trimmed and lowercase.
pub fn normalize_network_name(name: &str) -> String {
	name.trim().to_lowercase()
}

/// Helper function to deserialize network configurations from TOML.
///
/// Network names are normalized so that lookups are case-insensitive, which
/// means two keys differing only by case would describe the same network.
///
/// # Errors
///
/// Returns a deserialization error if:
/// - A network name is empty
/// - Two names normalize to the same network
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: HashMap<String, NetworkConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in raw {
		let name = normalize_network_name(&key);
		if name.is_empty() {
			return Err(serde::de::Error::custom("Network name cannot be empty"));
		}
		if result.insert(name.clone(), value).is_some() {
			return Err(serde::de::Error::custom(format!(
				"Network '{}' is configured more than once",
				name
			)));
		}
	}

	Ok(result)
}

/// Read-only table of named network configurations.
///
/// Built once (from configuration or [`NetworkRegistry::builtin`]) and shared
/// behind an `Arc`; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
	networks: NetworksConfig,
}

impl NetworkRegistry {
	/// Creates a registry from a networks table.
	pub fn new(networks: NetworksConfig) -> Self {
		let networks = networks
			.into_iter()
			.map(|(name, config)| (normalize_network_name(&name), config))
			.collect();
		Self { networks }
	}

	/// Registry containing only the Osmosis mainnet entry.
	pub fn builtin() -> Self {
		let mut networks = HashMap::new();
		networks.insert(OSMOSIS.to_string(), NetworkConfig::osmosis());
		Self::new(networks)
	}

	/// Looks up a network by name.
	///
	/// Fails with [`NetworkError::UnknownNetwork`] rather than falling back to
	/// any default network.
	pub fn lookup(&self, name: &str) -> Result<&NetworkConfig, NetworkError> {
		self.networks
			.get(&normalize_network_name(name))
			.ok_or_else(|| NetworkError::UnknownNetwork(name.to_string()))
	}

	/// Registered network names, sorted.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.networks.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Default fee for a transfer on the network: the flat fee in the native
	/// denomination, with the default gas limit.
	pub fn default_fee(&self, name: &str) -> Result<StdFee, NetworkError> {
		let network = self.lookup(name)?;
		Ok(StdFee {
			amount: vec![Coin::new(
				network.native_denom.clone(),
				network.default_tx_fee,
			)],
			gas: network.default_gas.to_string(),
		})
	}

	/// Default gas price for the network, `default_tx_fee / default_gas`.
	///
	/// A zero fee yields a zero gas price, which is a legitimate value.
	pub fn default_gas_price(&self, name: &str) -> Result<GasPrice, NetworkError> {
		let network = self.lookup(name)?;
		GasPrice::new(u128::from(network.default_tx_fee), network.default_gas)
			.ok_or_else(|| NetworkError::InvalidGasLimit(name.to_string()))
	}
}
