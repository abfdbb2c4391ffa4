//! Transaction delivery module for the Osmosis wallet client.
//!
//! This module handles everything that talks to a node: fetching transactions,
//! blocks, balances and account records, and composing, signing and
//! broadcasting bank transfers. Node access goes through [`NodeInterface`] so
//! the client can run against a live RPC endpoint or an in-memory node.

use async_trait::async_trait;
use osmo_account::AccountService;
use osmo_types::proto::{
	Any, AuthInfo, Fee, ModeInfo, ModeInfoSingle, MsgSend, PubKey, SignDoc, SignMode,
	SignerInfo, TxBody, TxRaw, MSG_SEND_TYPE_URL, SECP256K1_PUBKEY_TYPE_URL,
};
use osmo_types::{
	truncate_id, AccountInfo, BlockHeader, BroadcastResult, Coin, NetworkConfig,
	RawTransactionEnvelope, StdFee, TransactionHash,
};
use prost::Message;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod tendermint;

	#[cfg(any(test, feature = "testing"))]
	pub mod mock;
}

/// Errors that can occur during node and delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// The node could not be reached or the transport failed.
	#[error("Network error: {0}")]
	Network(String),
	/// The node answered with a nonzero result code.
	#[error("Node error (code {code}): {log}")]
	Node { code: u32, log: String },
	/// A node response could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The requested object does not exist on the node.
	#[error("Not found: {0}")]
	NotFound(String),
	/// Signing the transaction failed.
	#[error("Signing error: {0}")]
	Signing(String),
	/// The signer has no on-chain account yet.
	#[error("Account not found: {0}")]
	AccountNotFound(String),
}

/// Settings applied to every node connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSettings {
	/// Per-request timeout.
	pub timeout: Duration,
}

impl Default for NodeSettings {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(30),
		}
	}
}

/// Trait defining the interface for node clients.
///
/// Lookups that can legitimately miss return `Option` rather than an error.
#[async_trait]
pub trait NodeInterface: Send + Sync {
	/// Fetches a transaction by hash, `None` if the node does not know it.
	async fn get_tx(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<RawTransactionEnvelope>, DeliveryError>;

	/// Fetches the header of the block at the given height.
	async fn get_block(&self, height: u64) -> Result<BlockHeader, DeliveryError>;

	/// Queries the balance of one denomination. A missing balance is zero.
	async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin, DeliveryError>;

	/// Queries the account record, `None` if the account does not exist yet.
	async fn get_account(&self, address: &str) -> Result<Option<AccountInfo>, DeliveryError>;

	/// Broadcasts signed `TxRaw` bytes and waits for inclusion.
	async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> Result<BroadcastResult, DeliveryError>;
}

/// Type alias for node factory functions.
pub type NodeFactory =
	fn(&NetworkConfig, &NodeSettings) -> Result<Box<dyn NodeInterface>, DeliveryError>;

/// Opens node connections for a network.
pub trait NodeConnector: Send + Sync {
	fn connect(&self, network: &NetworkConfig) -> Result<Arc<dyn NodeInterface>, DeliveryError>;
}

/// Connector that builds a fresh node client per call from a factory.
pub struct FactoryConnector {
	factory: NodeFactory,
	settings: NodeSettings,
}

impl FactoryConnector {
	pub fn new(factory: NodeFactory, settings: NodeSettings) -> Self {
		Self { factory, settings }
	}
}

impl NodeConnector for FactoryConnector {
	fn connect(&self, network: &NetworkConfig) -> Result<Arc<dyn NodeInterface>, DeliveryError> {
		(self.factory)(network, &self.settings).map(Arc::from)
	}
}

/// Service that signs and submits transfers through a node.
pub struct DeliveryService {
	node: Arc<dyn NodeInterface>,
}

impl DeliveryService {
	pub fn new(node: Arc<dyn NodeInterface>) -> Self {
		Self { node }
	}

	/// Sends `coins` from the account to `to` with the given fee.
	///
	/// This method:
	/// 1. Looks up the signer's account number and sequence
	/// 2. Builds the `MsgSend` body and the auth info for a single DIRECT signer
	/// 3. Signs the sign document and broadcasts the resulting `TxRaw`
	///
	/// A nonzero result code is returned as part of the [`BroadcastResult`];
	/// callers decide how to surface it.
	pub async fn send_tokens(
		&self,
		account: &AccountService,
		to: &str,
		coins: Vec<Coin>,
		fee: &StdFee,
		chain_id: &str,
	) -> Result<BroadcastResult, DeliveryError> {
		let from = account
			.get_address()
			.await
			.map_err(|e| DeliveryError::Signing(e.to_string()))?;
		let public_key = account
			.get_public_key()
			.await
			.map_err(|e| DeliveryError::Signing(e.to_string()))?;

		let info = self
			.node
			.get_account(&from)
			.await?
			.ok_or_else(|| DeliveryError::AccountNotFound(from.clone()))?;

		let gas_limit = fee
			.gas
			.parse::<u64>()
			.map_err(|e| DeliveryError::Decode(format!("Invalid gas limit {}: {}", fee.gas, e)))?;

		let msg = MsgSend {
			from_address: from.clone(),
			to_address: to.to_string(),
			amount: coins,
		};
		let body = TxBody {
			messages: vec![Any {
				type_url: MSG_SEND_TYPE_URL.to_string(),
				value: msg.encode_to_vec(),
			}],
			memo: String::new(),
			timeout_height: 0,
		};
		let auth_info = AuthInfo {
			signer_infos: vec![SignerInfo {
				public_key: Some(Any {
					type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
					value: PubKey { key: public_key }.encode_to_vec(),
				}),
				mode_info: Some(ModeInfo {
					single: Some(ModeInfoSingle {
						mode: SignMode::Direct as i32,
					}),
				}),
				sequence: info.sequence,
			}],
			fee: Some(Fee {
				amount: fee.amount.clone(),
				gas_limit,
				payer: String::new(),
				granter: String::new(),
			}),
		};

		let body_bytes = body.encode_to_vec();
		let auth_info_bytes = auth_info.encode_to_vec();
		let sign_doc = SignDoc {
			body_bytes: body_bytes.clone(),
			auth_info_bytes: auth_info_bytes.clone(),
			chain_id: chain_id.to_string(),
			account_number: info.account_number,
		};

		let signature = account
			.sign(&sign_doc.encode_to_vec())
			.await
			.map_err(|e| DeliveryError::Signing(e.to_string()))?;

		let tx_raw = TxRaw {
			body_bytes,
			auth_info_bytes,
			signatures: vec![signature],
		};

		let result = self.node.broadcast_tx(tx_raw.encode_to_vec()).await?;
		let hash = result.hash.to_hex();
		tracing::info!(
			tx_hash = %truncate_id(&hash),
			from = %from,
			to = %to,
			sequence = info.sequence,
			height = result.height,
			code = result.code,
			"Broadcast transfer"
		);

		Ok(result)
	}

	/// Fetches the header of the block at `height`.
	pub async fn get_block(&self, height: u64) -> Result<BlockHeader, DeliveryError> {
		self.node.get_block(height).await
	}

	/// Returns the account's current sequence, 0 when the account does not exist.
	pub async fn get_sequence(&self, address: &str) -> Result<u64, DeliveryError> {
		Ok(self
			.node
			.get_account(address)
			.await?
			.map(|info| info.sequence)
			.unwrap_or(0))
	}
}
