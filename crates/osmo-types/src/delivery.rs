//! Transaction delivery types for the wallet client.
//!
//! This module defines what the node hands back to the client: transaction
//! hashes, fetched transaction envelopes, broadcast results, block headers and
//! account records.

use crate::message::EncodedMessage;
use crate::proto::{AuthInfo, Coin, TxBody, TxRaw};
use crate::utils::without_0x_prefix;
use chrono::{DateTime, Utc};
use prost::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blockchain transaction hash representation.
///
/// Stores the raw hash bytes; CometBFT displays them as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl TransactionHash {
	/// Parses a hex hash, with or without "0x" prefix, in either case.
	pub fn from_hex(hash: &str) -> Result<Self, hex::FromHexError> {
		let bytes = hex::decode(without_0x_prefix(hash.trim()))?;
		if bytes.is_empty() {
			return Err(hex::FromHexError::InvalidStringLength);
		}
		Ok(Self(bytes))
	}

	/// Uppercase hex form used by explorers and the node.
	pub fn to_hex(&self) -> String {
		hex::encode_upper(&self.0)
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

/// Fee metadata from a transaction's auth info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInfo {
	pub amount: Vec<Coin>,
	pub gas_limit: u64,
}

/// Decoded body of a transaction: its ordered messages plus fee and
/// per-signer sequence metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
	pub messages: Vec<EncodedMessage>,
	#[serde(default)]
	pub memo: String,
	pub fee: Option<FeeInfo>,
	/// Sequence (nonce) of each signer, in signer order.
	#[serde(default)]
	pub signer_sequences: Vec<u64>,
}

impl TransactionBody {
	/// Decodes the body and auth info of a protobuf `TxRaw`.
	pub fn from_tx_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
		let raw = TxRaw::decode(bytes)?;
		let body = TxBody::decode(raw.body_bytes.as_slice())?;
		let auth_info = AuthInfo::decode(raw.auth_info_bytes.as_slice())?;

		Ok(Self {
			messages: body.messages.into_iter().map(EncodedMessage::from).collect(),
			memo: body.memo,
			fee: auth_info.fee.map(|fee| FeeInfo {
				amount: fee.amount,
				gas_limit: fee.gas_limit,
			}),
			signer_sequences: auth_info
				.signer_infos
				.iter()
				.map(|info| info.sequence)
				.collect(),
		})
	}
}

/// A transaction as returned by the node for a hash lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionEnvelope {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block height at which the transaction was included.
	pub height: u64,
	/// Result code of execution; 0 means success.
	pub code: u32,
	/// Gas limit declared by the transaction.
	pub gas_wanted: u64,
	/// Gas actually consumed.
	pub gas_used: u64,
	/// Raw execution log.
	#[serde(default)]
	pub raw_log: String,
	/// Decoded transaction body.
	pub body: TransactionBody,
}

/// Result of broadcasting a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
	pub hash: TransactionHash,
	/// Inclusion height, 0 when the transaction never reached a block.
	pub height: u64,
	/// Result code from check or delivery; 0 means success.
	pub code: u32,
	pub gas_wanted: u64,
	pub gas_used: u64,
	#[serde(default)]
	pub raw_log: String,
}

impl BroadcastResult {
	pub fn is_success(&self) -> bool {
		self.code == 0
	}
}

/// Block header fields the client needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
	pub chain_id: String,
	pub height: u64,
	pub time: DateTime<Utc>,
}

/// On-chain account record used to sign transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
	pub address: String,
	pub account_number: u64,
	/// Next sequence the account must sign with.
	pub sequence: u64,
}
