//! Core client for the Osmosis wallet.
//!
//! [`WalletClient`] is the public surface of the workspace. Each operation is a
//! short, sequential chain: resolve the network, connect to its node, query or
//! broadcast, fetch the block timestamp, and hand the result to the
//! [`ReceiptBuilder`]. Nothing is cached between calls.

use chrono::{DateTime, Utc};
use osmo_account::{AccountError, AccountFactory, AccountService};
use osmo_config::Config;
use osmo_delivery::implementations::tendermint;
use osmo_delivery::{
	DeliveryError, DeliveryService, FactoryConnector, NodeConnector, NodeInterface, NodeSettings,
};
use osmo_types::networks::normalize_network_name;
use osmo_types::{
	parse_amount, truncate_id, AddressValidator, BroadcastResult, Coin, GasPrice, NetworkConfig,
	NetworkError, NetworkRegistry, RawTransactionEnvelope, Receipt, SecretString, StdFee,
	TransactionHash, TransferRequest,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

pub mod receipt;
pub mod resolver;

pub use receipt::{ReceiptBuilder, ReceiptError};
pub use resolver::MessageResolver;

/// Errors returned by [`WalletClient`] operations.
///
/// Every variant names the network and, where one exists, the transaction
/// hash or address involved.
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Unknown network: {0}")]
	UnknownNetwork(String),
	#[error("Invalid gas limit for network {network}")]
	InvalidGasLimit { network: String },
	#[error("Invalid wallet address for network {network}: {address}")]
	InvalidAddress { network: String, address: String },
	#[error("Invalid transaction hash {hash}: {reason}")]
	InvalidHash { hash: String, reason: String },
	#[error("Invalid balance for {address} on {network}: {value}")]
	InvalidBalance {
		network: String,
		address: String,
		value: String,
	},
	#[error("Node error on {network}: {source}")]
	Node {
		network: String,
		#[source]
		source: DeliveryError,
	},
	#[error("Account error on {network}: {source}")]
	Account {
		network: String,
		#[source]
		source: AccountError,
	},
	#[error("Receipt error on {network}: {source}")]
	Receipt {
		network: String,
		#[source]
		source: ReceiptError,
	},
	#[error("Transaction {hash} rejected on {network} with code {code}: {log}")]
	BroadcastRejected {
		network: String,
		hash: String,
		code: u32,
		log: String,
	},
}

impl From<NetworkError> for ClientError {
	fn from(err: NetworkError) -> Self {
		match err {
			NetworkError::UnknownNetwork(name) => ClientError::UnknownNetwork(name),
			NetworkError::InvalidGasLimit(network) => ClientError::InvalidGasLimit { network },
		}
	}
}

/// Parameters of [`WalletClient::send_transaction`].
#[derive(Debug, Clone)]
pub struct SendRequest {
	/// Recipient address.
	pub to: String,
	/// Amount in base units.
	pub amount: u128,
	pub network: String,
	/// Mnemonic of the sending account.
	pub mnemonic: SecretString,
	/// Denomination to send; the network's native denomination when `None`.
	pub denom: Option<String>,
}

/// A looked-up transaction: the receipt plus the envelope it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
	pub receipt: Receipt,
	pub tx_data: RawTransactionEnvelope,
}

/// A sent transaction: the receipt plus the node's broadcast result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
	pub receipt: Receipt,
	pub tx_response: BroadcastResult,
}

/// Wallet client over one or more Cosmos SDK networks.
pub struct WalletClient {
	/// Read-only network table.
	registry: Arc<NetworkRegistry>,
	/// Network whose prefix is used by [`WalletClient::is_valid_wallet_address`].
	default_network: String,
	validator: AddressValidator,
	connector: Arc<dyn NodeConnector>,
	account_factory: AccountFactory,
	builder: ReceiptBuilder,
}

impl WalletClient {
	/// Creates a client. The default network must be registered.
	pub fn new(
		registry: Arc<NetworkRegistry>,
		default_network: &str,
		connector: Arc<dyn NodeConnector>,
		account_factory: AccountFactory,
	) -> Result<Self, ClientError> {
		let default_network = normalize_network_name(default_network);
		let validator = AddressValidator::new(&registry.lookup(&default_network)?.bech32_prefix);
		Ok(Self {
			builder: ReceiptBuilder::new(registry.clone()),
			registry,
			default_network,
			validator,
			connector,
			account_factory,
		})
	}

	/// Creates a client that reaches nodes over Tendermint RPC and signs with
	/// mnemonic accounts.
	pub fn from_config(config: &Config) -> Result<Self, ClientError> {
		let settings = NodeSettings {
			timeout: Duration::from_secs(config.node.timeout_seconds),
		};
		let connector = FactoryConnector::new(tendermint::factory(), settings);
		let client = Self::new(
			Arc::new(config.registry()),
			&config.client.default_network,
			Arc::new(connector),
			osmo_account::implementations::mnemonic::factory(),
		)?;

		tracing::info!(
			default_network = %client.default_network,
			networks = ?client.registry.names(),
			timeout_seconds = config.node.timeout_seconds,
			"Wallet client ready"
		);
		Ok(client)
	}

	pub fn registry(&self) -> &NetworkRegistry {
		&self.registry
	}

	pub fn default_network(&self) -> &str {
		&self.default_network
	}

	fn connect(
		&self,
		network: &str,
	) -> Result<(&NetworkConfig, Arc<dyn NodeInterface>), ClientError> {
		let config = self.registry.lookup(network)?;
		let node = self
			.connector
			.connect(config)
			.map_err(|source| node_error(network, source))?;
		Ok((config, node))
	}

	/// Queries the native-denomination balance of an address.
	#[instrument(skip_all, fields(network = %network))]
	pub async fn get_balance(&self, address: &str, network: &str) -> Result<u128, ClientError> {
		let (config, node) = self.connect(network)?;
		let coin = node
			.get_balance(address, &config.native_denom)
			.await
			.map_err(|source| node_error(network, source))?;

		parse_amount(&coin.amount).map_err(|_| ClientError::InvalidBalance {
			network: network.to_string(),
			address: address.to_string(),
			value: coin.amount,
		})
	}

	/// Looks up a transaction by hash.
	///
	/// Returns `None` when the node does not know the hash or the transaction
	/// is not a bank transfer.
	#[instrument(skip_all, fields(network = %network, tx_hash = %truncate_id(tx_hash)))]
	pub async fn get_transaction(
		&self,
		tx_hash: &str,
		network: &str,
	) -> Result<Option<TransactionResult>, ClientError> {
		let hash = TransactionHash::from_hex(tx_hash).map_err(|e| ClientError::InvalidHash {
			hash: tx_hash.to_string(),
			reason: e.to_string(),
		})?;
		let (_, node) = self.connect(network)?;
		let delivery = DeliveryService::new(node.clone());

		let Some(envelope) = node
			.get_tx(&hash)
			.await
			.map_err(|source| node_error(network, source))?
		else {
			tracing::debug!("Transaction not found");
			return Ok(None);
		};

		let block_time = fetch_block_time(&delivery, envelope.height, network).await?;
		let receipt = self
			.builder
			.build_from_lookup(&envelope, block_time, network)
			.map_err(|source| receipt_error(network, source))?;

		match receipt {
			Some(receipt) => Ok(Some(TransactionResult {
				receipt,
				tx_data: envelope,
			})),
			None => {
				tracing::debug!("Transaction is not a transfer");
				Ok(None)
			},
		}
	}

	/// Signs and broadcasts a transfer, returning its receipt.
	///
	/// The sender is derived from the mnemonic with the network's address
	/// prefix and pays the network's default fee. A transaction rejected by
	/// the node is an error; no receipt is built for it.
	#[instrument(skip_all, fields(network = %request.network, amount = %request.amount))]
	pub async fn send_transaction(&self, request: SendRequest) -> Result<SendResult, ClientError> {
		let network = request.network.as_str();
		let (config, node) = self.connect(network)?;

		if !AddressValidator::new(&config.bech32_prefix).is_valid(&request.to) {
			return Err(ClientError::InvalidAddress {
				network: network.to_string(),
				address: request.to,
			});
		}

		let account = AccountService::from_mnemonic(self.account_factory, &request.mnemonic, config)
			.map_err(|source| account_error(network, source))?;
		let from = account
			.get_address()
			.await
			.map_err(|source| account_error(network, source))?;

		let fee = self.registry.default_fee(network)?;
		let denom = request
			.denom
			.clone()
			.unwrap_or_else(|| config.native_denom.clone());

		let delivery = DeliveryService::new(node.clone());
		let result = delivery
			.send_tokens(
				&account,
				&request.to,
				vec![Coin::new(denom, request.amount)],
				&fee,
				&config.chain_id,
			)
			.await
			.map_err(|source| node_error(network, source))?;

		if !result.is_success() {
			tracing::warn!(
				tx_hash = %truncate_id(&result.hash.to_hex()),
				code = result.code,
				log = %result.raw_log,
				"Transfer rejected"
			);
			return Err(ClientError::BroadcastRejected {
				network: network.to_string(),
				hash: result.hash.to_hex(),
				code: result.code,
				log: result.raw_log,
			});
		}

		let block_time = fetch_block_time(&delivery, result.height, network).await?;
		let sequence = delivery
			.get_sequence(&from)
			.await
			.map_err(|source| node_error(network, source))?;

		let transfer = TransferRequest {
			from,
			to: request.to.clone(),
			amount: request.amount,
		};
		let receipt = self
			.builder
			.build_from_broadcast(&result, &transfer, block_time, sequence, network, &fee)
			.map_err(|source| receipt_error(network, source))?;

		tracing::info!(
			tx_hash = %truncate_id(&receipt.transaction_hash),
			height = result.height,
			nonce = receipt.nonce,
			"Transfer included"
		);

		Ok(SendResult {
			receipt,
			tx_response: result,
		})
	}

	/// Checks an address against the default network's address pattern.
	pub fn is_valid_wallet_address(&self, address: &str) -> bool {
		self.validator.is_valid(address)
	}

	pub fn get_transaction_link(&self, tx_hash: &str, network: &str) -> Result<String, ClientError> {
		Ok(self.registry.lookup(network)?.transaction_link(tx_hash))
	}

	pub fn get_wallet_link(&self, address: &str, network: &str) -> Result<String, ClientError> {
		Ok(self.registry.lookup(network)?.wallet_link(address))
	}

	pub fn get_default_fee(&self, network: &str) -> Result<StdFee, ClientError> {
		Ok(self.registry.default_fee(network)?)
	}

	pub fn get_default_gas_price(&self, network: &str) -> Result<GasPrice, ClientError> {
		Ok(self.registry.default_gas_price(network)?)
	}
}

async fn fetch_block_time(
	delivery: &DeliveryService,
	height: u64,
	network: &str,
) -> Result<DateTime<Utc>, ClientError> {
	delivery
		.get_block(height)
		.await
		.map(|block| block.time)
		.map_err(|source| node_error(network, source))
}

fn node_error(network: &str, source: DeliveryError) -> ClientError {
	ClientError::Node {
		network: network.to_string(),
		source,
	}
}

fn account_error(network: &str, source: AccountError) -> ClientError {
	ClientError::Account {
		network: network.to_string(),
		source,
	}
}

fn receipt_error(network: &str, source: ReceiptError) -> ClientError {
	match source {
		ReceiptError::UnknownNetwork(name) => ClientError::UnknownNetwork(name),
		source => ClientError::Receipt {
			network: network.to_string(),
			source,
		},
	}
}
