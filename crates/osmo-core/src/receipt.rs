//! Receipt assembly.
//!
//! [`ReceiptBuilder`] turns either a fetched transaction envelope or a fresh
//! broadcast result into a [`Receipt`]. Both paths share the fee and gas
//! derivation; only the lookup path resolves the message and sets status flags.
//! Block timestamps are fetched by the caller and passed in.

use crate::resolver::MessageResolver;
use chrono::{DateTime, Utc};
use osmo_types::networks::normalize_network_name;
use osmo_types::{
	parse_amount, BroadcastResult, Coin, GasPrice, NetworkConfig, NetworkRegistry,
	RawTransactionEnvelope, Receipt, StdFee, TransactionStatus, TransferRequest,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
	#[error("Unknown network: {0}")]
	UnknownNetwork(String),
	/// Gas limit of zero; no gas price can be derived.
	#[error("Transaction {hash} has a zero gas limit")]
	InvalidGasLimit { hash: String },
	#[error("Transaction {hash} has an invalid amount: {value}")]
	InvalidAmount { hash: String, value: String },
	#[error("Transaction {hash} has an invalid fee: {value}")]
	InvalidFee { hash: String, value: String },
	#[error("Transaction {hash} has no signer info")]
	MissingSignerInfo { hash: String },
	#[error("Transaction {hash} was rejected with code {code}: {log}")]
	BroadcastRejected { hash: String, code: u32, log: String },
}

/// Fee fields shared by both receipt kinds.
struct GasFields {
	cost: u128,
	currency: String,
	limit: u64,
	price: GasPrice,
}

/// Builds receipts against a network registry.
pub struct ReceiptBuilder {
	registry: Arc<NetworkRegistry>,
}

impl ReceiptBuilder {
	pub fn new(registry: Arc<NetworkRegistry>) -> Self {
		Self { registry }
	}

	fn network(&self, name: &str) -> Result<&NetworkConfig, ReceiptError> {
		self.registry
			.lookup(name)
			.map_err(|_| ReceiptError::UnknownNetwork(name.to_string()))
	}

	/// Builds the receipt of a transaction fetched by hash.
	///
	/// Returns `Ok(None)` when the body has no message or its first message is
	/// not a bank transfer.
	pub fn build_from_lookup(
		&self,
		envelope: &RawTransactionEnvelope,
		block_time: DateTime<Utc>,
		network: &str,
	) -> Result<Option<Receipt>, ReceiptError> {
		let config = self.network(network)?;
		let hash = envelope.hash.to_hex();

		let Some(message) = envelope.body.messages.first() else {
			return Ok(None);
		};
		let Some(transfer) = MessageResolver::resolve(message, &config.bech32_prefix) else {
			return Ok(None);
		};

		// The resolver only yields transfers with at least one coin.
		let amount = match transfer.amount.first() {
			Some(coin) => parse_amount(&coin.amount).map_err(|_| ReceiptError::InvalidAmount {
				hash: hash.clone(),
				value: coin.amount.clone(),
			})?,
			None => return Ok(None),
		};

		let fee_coin = envelope
			.body
			.fee
			.as_ref()
			.and_then(|fee| fee.amount.first());
		let gas = gas_fields(&hash, fee_coin, envelope.gas_wanted, config)?;

		let nonce = envelope
			.body
			.signer_sequences
			.first()
			.copied()
			.ok_or_else(|| ReceiptError::MissingSignerInfo { hash: hash.clone() })?;

		Ok(Some(Receipt {
			amount,
			date: block_time,
			from: transfer.from_address,
			gas_cost_crypto_currency: gas.currency,
			gas_cost_in_crypto: gas.cost,
			gas_limit: gas.limit,
			gas_price: gas.price,
			status: Some(TransactionStatus::from_code(envelope.code)),
			network: normalize_network_name(network),
			nonce,
			to: transfer.to_address,
			transaction_link: config.transaction_link(&hash),
			transaction_hash: hash,
		}))
	}

	/// Builds the receipt of a transfer this client just broadcast.
	///
	/// Amount and parties come from the request, fee fields from the fee used
	/// to sign. `sequence_after` is the signer's sequence queried after
	/// inclusion, so the transaction's own nonce is one less.
	pub fn build_from_broadcast(
		&self,
		result: &BroadcastResult,
		request: &TransferRequest,
		block_time: DateTime<Utc>,
		sequence_after: u64,
		network: &str,
		fee: &StdFee,
	) -> Result<Receipt, ReceiptError> {
		let config = self.network(network)?;
		let hash = result.hash.to_hex();

		if !result.is_success() {
			return Err(ReceiptError::BroadcastRejected {
				hash,
				code: result.code,
				log: result.raw_log.clone(),
			});
		}

		let gas_limit = fee.gas.parse::<u64>().map_err(|_| ReceiptError::InvalidFee {
			hash: hash.clone(),
			value: fee.gas.clone(),
		})?;
		let gas = gas_fields(&hash, fee.amount.first(), gas_limit, config)?;

		Ok(Receipt {
			amount: request.amount,
			date: block_time,
			from: request.from.clone(),
			gas_cost_crypto_currency: gas.currency,
			gas_cost_in_crypto: gas.cost,
			gas_limit: gas.limit,
			gas_price: gas.price,
			status: None,
			network: normalize_network_name(network),
			nonce: sequence_after.saturating_sub(1),
			to: request.to.clone(),
			transaction_link: config.transaction_link(&hash),
			transaction_hash: hash,
		})
	}
}

fn gas_fields(
	hash: &str,
	fee: Option<&Coin>,
	gas_limit: u64,
	config: &NetworkConfig,
) -> Result<GasFields, ReceiptError> {
	let (cost, currency) = match fee {
		Some(coin) => {
			let cost = parse_amount(&coin.amount).map_err(|_| ReceiptError::InvalidFee {
				hash: hash.to_string(),
				value: coin.amount.clone(),
			})?;
			(cost, coin.denom.clone())
		},
		None => (0, config.native_denom.clone()),
	};

	let price = GasPrice::new(cost, gas_limit).ok_or_else(|| ReceiptError::InvalidGasLimit {
		hash: hash.to_string(),
	})?;

	Ok(GasFields {
		cost,
		currency,
		limit: gas_limit,
		price,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use osmo_account::implementations::mnemonic::encode_address;
	use osmo_types::proto::{Any, MsgSend, MSG_SEND_TYPE_URL};
	use osmo_types::{
		AminoMessage, EncodedMessage, FeeInfo, TransactionBody, TransactionHash,
		AMINO_MSG_SEND_TYPE,
	};
	use num_rational::Ratio;
	use prost::Message;
	use serde_json::json;

	fn address(seed: u8) -> String {
		let mut key = vec![0x03];
		key.extend_from_slice(&[seed; 32]);
		encode_address("osmo", &key).unwrap()
	}

	fn block_time() -> DateTime<Utc> {
		DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
			.unwrap()
			.with_timezone(&Utc)
	}

	fn builder() -> ReceiptBuilder {
		ReceiptBuilder::new(Arc::new(NetworkRegistry::builtin()))
	}

	fn send_message(amount: &str) -> EncodedMessage {
		let msg = MsgSend {
			from_address: address(1),
			to_address: address(2),
			amount: vec![Coin::new("uosmo", amount)],
		};
		EncodedMessage::from(Any {
			type_url: MSG_SEND_TYPE_URL.to_string(),
			value: msg.encode_to_vec(),
		})
	}

	fn envelope(code: u32, gas_wanted: u64, messages: Vec<EncodedMessage>) -> RawTransactionEnvelope {
		RawTransactionEnvelope {
			hash: TransactionHash(vec![0xab, 0xcd, 0xef, 0x12]),
			height: 100,
			code,
			gas_wanted,
			gas_used: gas_wanted / 2,
			raw_log: String::new(),
			body: TransactionBody {
				messages,
				memo: String::new(),
				fee: Some(FeeInfo {
					amount: vec![Coin::new("uosmo", 5000u64)],
					gas_limit: gas_wanted,
				}),
				signer_sequences: vec![17],
			},
		}
	}

	#[test]
	fn test_lookup_receipt_fields() {
		let receipt = builder()
			.build_from_lookup(
				&envelope(0, 200_000, vec![send_message("5")]),
				block_time(),
				"osmosis",
			)
			.unwrap()
			.unwrap();

		assert_eq!(receipt.amount, 5);
		assert_eq!(receipt.date, block_time());
		assert_eq!(receipt.from, address(1));
		assert_eq!(receipt.to, address(2));
		assert_eq!(receipt.gas_cost_in_crypto, 5000);
		assert_eq!(receipt.gas_cost_crypto_currency, "uosmo");
		assert_eq!(receipt.gas_limit, 200_000);
		assert_eq!(receipt.gas_price, GasPrice::new(1, 40).unwrap());
		assert_eq!(receipt.nonce, 17);
		assert_eq!(receipt.network, "osmosis");
		assert_eq!(receipt.transaction_hash, "ABCDEF12");
		assert_eq!(
			receipt.transaction_link,
			"https://www.mintscan.io/osmosis/txs/ABCDEF12"
		);
	}

	#[test]
	fn test_lookup_status_flags() {
		let ok = builder()
			.build_from_lookup(&envelope(0, 200_000, vec![send_message("5")]), block_time(), "osmosis")
			.unwrap()
			.unwrap()
			.status
			.unwrap();
		assert!(ok.is_successful && ok.is_executed);
		assert!(!ok.is_pending && !ok.is_failed && !ok.is_invalid);

		for code in [1, 5, 13] {
			let failed = builder()
				.build_from_lookup(
					&envelope(code, 200_000, vec![send_message("5")]),
					block_time(),
					"osmosis",
				)
				.unwrap()
				.unwrap()
				.status
				.unwrap();
			assert!(!failed.is_successful && failed.is_executed && !failed.is_pending);
			assert!(failed.is_failed);
			assert_eq!(failed.is_failed, failed.is_invalid);
		}
	}

	#[test]
	fn test_lookup_amino_message() {
		let amino = EncodedMessage::Amino(AminoMessage {
			msg_type: AMINO_MSG_SEND_TYPE.to_string(),
			value: json!({
				"from_address": address(1),
				"to_address": address(2),
				"amount": [{ "denom": "uosmo", "amount": "5" }]
			}),
		});
		let from_amino = builder()
			.build_from_lookup(&envelope(0, 200_000, vec![amino]), block_time(), "osmosis")
			.unwrap()
			.unwrap();
		let from_proto = builder()
			.build_from_lookup(&envelope(0, 200_000, vec![send_message("5")]), block_time(), "osmosis")
			.unwrap()
			.unwrap();
		assert_eq!(from_amino, from_proto);
	}

	#[test]
	fn test_lookup_without_transfer_is_none() {
		let delegate = EncodedMessage::from(Any {
			type_url: "/cosmos.staking.v1beta1.MsgDelegate".to_string(),
			value: Vec::new(),
		});
		let builder = builder();
		assert_eq!(
			builder.build_from_lookup(&envelope(0, 200_000, vec![delegate]), block_time(), "osmosis"),
			Ok(None)
		);
		assert_eq!(
			builder.build_from_lookup(&envelope(0, 200_000, vec![]), block_time(), "osmosis"),
			Ok(None)
		);
	}

	#[test]
	fn test_zero_amount_is_a_real_zero() {
		let receipt = builder()
			.build_from_lookup(&envelope(0, 200_000, vec![send_message("0")]), block_time(), "osmosis")
			.unwrap()
			.unwrap();
		assert_eq!(receipt.amount, 0);

		let unset = builder()
			.build_from_lookup(&envelope(0, 200_000, vec![send_message("")]), block_time(), "osmosis")
			.unwrap()
			.unwrap();
		assert_eq!(unset.amount, 0);
	}

	#[test]
	fn test_lookup_zero_gas_is_error() {
		let result =
			builder().build_from_lookup(&envelope(0, 0, vec![send_message("5")]), block_time(), "osmosis");
		assert_eq!(
			result,
			Err(ReceiptError::InvalidGasLimit {
				hash: "ABCDEF12".to_string()
			})
		);
	}

	#[test]
	fn test_lookup_fee_defaults() {
		let mut env = envelope(0, 4, vec![send_message("5")]);
		env.body.fee = None;
		let receipt = builder()
			.build_from_lookup(&env, block_time(), "osmosis")
			.unwrap()
			.unwrap();
		assert_eq!(receipt.gas_cost_in_crypto, 0);
		assert_eq!(receipt.gas_cost_crypto_currency, "uosmo");
		assert_eq!(receipt.gas_price, GasPrice::zero());
	}

	#[test]
	fn test_lookup_gas_price_is_exact() {
		let mut env = envelope(0, 8, vec![send_message("5")]);
		env.body.fee = Some(FeeInfo {
			amount: vec![Coin::new("uosmo", 1u64)],
			gas_limit: 8,
		});
		let receipt = builder()
			.build_from_lookup(&env, block_time(), "osmosis")
			.unwrap()
			.unwrap();
		assert_eq!(receipt.gas_price.ratio() * 8, Ratio::from_integer(1));
		assert_eq!(receipt.gas_price.to_string(), "0.125");
	}

	#[test]
	fn test_lookup_gas_price_non_terminating() {
		let mut env = envelope(0, 3, vec![send_message("5")]);
		env.body.fee = Some(FeeInfo {
			amount: vec![Coin::new("uosmo", 1u64)],
			gas_limit: 3,
		});
		let receipt = builder()
			.build_from_lookup(&env, block_time(), "osmosis")
			.unwrap()
			.unwrap();

		assert_eq!(receipt.gas_cost_in_crypto, 1);
		assert_eq!(receipt.gas_limit, 3);
		assert_eq!(receipt.gas_price.ratio() * 3, Ratio::from_integer(1));
		assert_eq!(receipt.gas_price.ratio(), Ratio::new(1, 3));

		let json = serde_json::to_value(&receipt).unwrap();
		assert_eq!(json["gasPrice"], "1/3");
	}

	#[test]
	fn test_broadcast_gas_price_is_exact() {
		let fee = StdFee {
			amount: vec![Coin::new("uosmo", 2u64)],
			gas: "7".to_string(),
		};
		let receipt = builder()
			.build_from_broadcast(&broadcast(0), &request(), block_time(), 9, "osmosis", &fee)
			.unwrap();
		assert_eq!(receipt.gas_price.ratio() * 7, Ratio::from_integer(2));
	}

	#[test]
	fn test_lookup_missing_signer_info() {
		let mut env = envelope(0, 200_000, vec![send_message("5")]);
		env.body.signer_sequences.clear();
		assert!(matches!(
			builder().build_from_lookup(&env, block_time(), "osmosis"),
			Err(ReceiptError::MissingSignerInfo { .. })
		));
	}

	#[test]
	fn test_unknown_network() {
		let result = builder().build_from_lookup(
			&envelope(0, 200_000, vec![send_message("5")]),
			block_time(),
			"terra",
		);
		assert_eq!(result, Err(ReceiptError::UnknownNetwork("terra".to_string())));
	}

	fn broadcast(code: u32) -> BroadcastResult {
		BroadcastResult {
			hash: TransactionHash(vec![0x01, 0x02]),
			height: 55,
			code,
			gas_wanted: 200_000,
			gas_used: 90_000,
			raw_log: if code == 0 { String::new() } else { "out of gas".to_string() },
		}
	}

	fn request() -> TransferRequest {
		TransferRequest {
			from: address(1),
			to: address(2),
			amount: 5,
		}
	}

	#[test]
	fn test_broadcast_receipt() {
		let registry = NetworkRegistry::builtin();
		let fee = registry.default_fee("osmosis").unwrap();
		let receipt = builder()
			.build_from_broadcast(&broadcast(0), &request(), block_time(), 9, "osmosis", &fee)
			.unwrap();

		assert_eq!(receipt.amount, 5);
		assert_eq!(receipt.to, address(2));
		assert_eq!(receipt.from, address(1));
		assert_eq!(receipt.nonce, 8);
		assert_eq!(receipt.gas_limit, 200_000);
		assert_eq!(receipt.gas_cost_in_crypto, 0);
		assert_eq!(receipt.gas_price, GasPrice::zero());
		assert!(receipt.status.is_none());
		assert_eq!(
			receipt.transaction_link,
			"https://www.mintscan.io/osmosis/txs/0102"
		);
	}

	#[test]
	fn test_broadcast_nonce_saturates() {
		let fee = NetworkRegistry::builtin().default_fee("osmosis").unwrap();
		let receipt = builder()
			.build_from_broadcast(&broadcast(0), &request(), block_time(), 0, "osmosis", &fee)
			.unwrap();
		assert_eq!(receipt.nonce, 0);
	}

	#[test]
	fn test_broadcast_rejected() {
		let fee = NetworkRegistry::builtin().default_fee("osmosis").unwrap();
		let result =
			builder().build_from_broadcast(&broadcast(11), &request(), block_time(), 9, "osmosis", &fee);
		assert_eq!(
			result,
			Err(ReceiptError::BroadcastRejected {
				hash: "0102".to_string(),
				code: 11,
				log: "out of gas".to_string(),
			})
		);
	}

	#[test]
	fn test_broadcast_zero_gas() {
		let fee = StdFee {
			amount: vec![Coin::new("uosmo", 0u64)],
			gas: "0".to_string(),
		};
		let result =
			builder().build_from_broadcast(&broadcast(0), &request(), block_time(), 9, "osmosis", &fee);
		assert!(matches!(result, Err(ReceiptError::InvalidGasLimit { .. })));
	}
}
