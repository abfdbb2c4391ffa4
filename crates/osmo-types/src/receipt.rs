//! Receipt types returned to callers.
//!
//! A [`Receipt`] is the chain-agnostic summary of a transfer. Its serialized
//! key names are stable and camelCase.

use chrono::{DateTime, Utc};
use crate::utils::GasPrice;
use serde::{Deserialize, Serialize};

/// Status flags of a transaction fetched from the chain.
///
/// `is_failed` and `is_invalid` are aliases; both are set whenever the result
/// code is nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
	pub is_pending: bool,
	pub is_executed: bool,
	pub is_successful: bool,
	pub is_failed: bool,
	pub is_invalid: bool,
}

impl TransactionStatus {
	/// Flags for a transaction already included in a block with the given result code.
	pub fn from_code(code: u32) -> Self {
		let failed = code != 0;
		Self {
			is_pending: false,
			is_executed: true,
			is_successful: !failed,
			is_failed: failed,
			is_invalid: failed,
		}
	}
}

/// Canonical receipt of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
	/// Amount transferred, in base units.
	pub amount: u128,
	/// Timestamp of the block containing the transaction.
	pub date: DateTime<Utc>,
	pub from: String,
	pub gas_cost_crypto_currency: String,
	pub gas_cost_in_crypto: u128,
	pub gas_limit: u64,
	/// Exact `gas_cost_in_crypto / gas_limit`.
	pub gas_price: GasPrice,
	/// Present only for historical lookups.
	#[serde(flatten)]
	pub status: Option<TransactionStatus>,
	pub network: String,
	pub nonce: u64,
	pub to: String,
	pub transaction_hash: String,
	pub transaction_link: String,
}

/// Transfer parameters already known to the sender when building a receipt
/// for a fresh broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
	pub from: String,
	pub to: String,
	pub amount: u128,
}
