//! In-memory node for tests.
//!
//! `MockNode` keeps accounts, balances, blocks and transactions in shared
//! state, so clones handed to different services observe each other's writes.
//! Broadcasting decodes the submitted `TxRaw`, hashes it with SHA-256, includes
//! it in a new block and bumps the sender's sequence.

use crate::{DeliveryError, NodeConnector, NodeInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osmo_types::proto::{MsgSend, MSG_SEND_TYPE_URL};
use osmo_types::{
	AccountInfo, BlockHeader, BroadcastResult, Coin, EncodedMessage, NetworkConfig,
	RawTransactionEnvelope, TransactionBody, TransactionHash,
};
use prost::Message;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Timestamp of block 0.
const GENESIS_TIMESTAMP: i64 = 1_704_067_200;
/// Seconds between blocks.
const BLOCK_INTERVAL: i64 = 6;

#[derive(Default)]
struct MockState {
	height: u64,
	accounts: HashMap<String, AccountInfo>,
	balances: HashMap<(String, String), u128>,
	blocks: HashMap<u64, DateTime<Utc>>,
	txs: HashMap<Vec<u8>, (RawTransactionEnvelope, Vec<u8>)>,
	reject_next: Option<(u32, String)>,
}

/// Shared in-memory node.
#[derive(Clone)]
pub struct MockNode {
	chain_id: String,
	state: Arc<Mutex<MockState>>,
}

impl MockNode {
	pub fn new(chain_id: &str) -> Self {
		Self {
			chain_id: chain_id.to_string(),
			state: Arc::new(Mutex::new(MockState::default())),
		}
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// Registers an on-chain account.
	pub fn add_account(&self, address: &str, account_number: u64, sequence: u64) {
		self.state().accounts.insert(
			address.to_string(),
			AccountInfo {
				address: address.to_string(),
				account_number,
				sequence,
			},
		);
	}

	pub fn set_balance(&self, address: &str, denom: &str, amount: u128) {
		self.state()
			.balances
			.insert((address.to_string(), denom.to_string()), amount);
	}

	/// Stores a transaction as already included, along with its block time.
	pub fn insert_tx(&self, envelope: RawTransactionEnvelope, block_time: DateTime<Utc>) {
		let mut state = self.state();
		state.blocks.insert(envelope.height, block_time);
		state.height = state.height.max(envelope.height);
		state
			.txs
			.insert(envelope.hash.0.clone(), (envelope, Vec::new()));
	}

	/// Makes the next broadcast fail with the given result code.
	pub fn reject_next(&self, code: u32, log: &str) {
		self.state().reject_next = Some((code, log.to_string()));
	}

	/// Raw `TxRaw` bytes of a transaction broadcast through this node.
	pub fn raw_tx(&self, hash: &TransactionHash) -> Option<Vec<u8>> {
		self.state()
			.txs
			.get(&hash.0)
			.map(|(_, bytes)| bytes.clone())
			.filter(|bytes| !bytes.is_empty())
	}

	pub fn height(&self) -> u64 {
		self.state().height
	}

	/// Time of the block at `height` on this node's clock.
	pub fn block_time(height: u64) -> DateTime<Utc> {
		DateTime::from_timestamp(GENESIS_TIMESTAMP + height as i64 * BLOCK_INTERVAL, 0)
			.unwrap_or_default()
	}
}

fn sender(body: &TransactionBody) -> Option<String> {
	match body.messages.first()? {
		EncodedMessage::Proto(msg) if msg.type_url == MSG_SEND_TYPE_URL => {
			MsgSend::decode(msg.value.as_slice())
				.ok()
				.map(|send| send.from_address)
		},
		_ => None,
	}
}

#[async_trait]
impl NodeInterface for MockNode {
	async fn get_tx(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<RawTransactionEnvelope>, DeliveryError> {
		Ok(self
			.state()
			.txs
			.get(&hash.0)
			.map(|(envelope, _)| envelope.clone()))
	}

	async fn get_block(&self, height: u64) -> Result<BlockHeader, DeliveryError> {
		let time = self
			.state()
			.blocks
			.get(&height)
			.copied()
			.ok_or_else(|| DeliveryError::NotFound(format!("block {}", height)))?;
		Ok(BlockHeader {
			chain_id: self.chain_id.clone(),
			height,
			time,
		})
	}

	async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin, DeliveryError> {
		let amount = self
			.state()
			.balances
			.get(&(address.to_string(), denom.to_string()))
			.copied()
			.unwrap_or(0);
		Ok(Coin::new(denom, amount))
	}

	async fn get_account(&self, address: &str) -> Result<Option<AccountInfo>, DeliveryError> {
		Ok(self.state().accounts.get(address).cloned())
	}

	async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> Result<BroadcastResult, DeliveryError> {
		let body = TransactionBody::from_tx_bytes(&tx_bytes)
			.map_err(|e| DeliveryError::Decode(format!("Invalid transaction: {}", e)))?;
		let hash = TransactionHash(Sha256::digest(&tx_bytes).to_vec());
		let gas_wanted = body.fee.as_ref().map(|fee| fee.gas_limit).unwrap_or(0);

		let mut state = self.state();
		if let Some((code, log)) = state.reject_next.take() {
			return Ok(BroadcastResult {
				hash,
				height: 0,
				code,
				gas_wanted,
				gas_used: 0,
				raw_log: log,
			});
		}

		state.height += 1;
		let height = state.height;
		state.blocks.insert(height, Self::block_time(height));
		if let Some(from) = sender(&body) {
			if let Some(account) = state.accounts.get_mut(&from) {
				account.sequence += 1;
			}
		}

		let gas_used = gas_wanted / 2;
		let envelope = RawTransactionEnvelope {
			hash: hash.clone(),
			height,
			code: 0,
			gas_wanted,
			gas_used,
			raw_log: String::new(),
			body,
		};
		state.txs.insert(hash.0.clone(), (envelope, tx_bytes));

		Ok(BroadcastResult {
			hash,
			height,
			code: 0,
			gas_wanted,
			gas_used,
			raw_log: String::new(),
		})
	}
}

impl NodeConnector for MockNode {
	fn connect(&self, _network: &NetworkConfig) -> Result<Arc<dyn NodeInterface>, DeliveryError> {
		Ok(Arc::new(self.clone()))
	}
}
