//! Tendermint/CometBFT JSON-RPC node client.
//!
//! Talks to a node's RPC endpoint over HTTP: `tx` and `block` for lookups,
//! `abci_query` for bank and auth queries, and `broadcast_tx_commit` for
//! submission. Response parsing is kept in plain functions over the typed
//! response structs so it can be tested without a node.

use crate::{DeliveryError, NodeFactory, NodeInterface, NodeSettings};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use osmo_types::proto::{
	BaseAccount, QueryAccountRequest, QueryAccountResponse, QueryBalanceRequest,
	QueryBalanceResponse, BASE_ACCOUNT_TYPE_URL, QUERY_ACCOUNT_PATH, QUERY_BALANCE_PATH,
};
use osmo_types::{
	truncate_id, AccountInfo, BlockHeader, BroadcastResult, Coin, NetworkConfig,
	RawTransactionEnvelope, TransactionBody, TransactionHash,
};
use prost::Message;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

/// JSON-RPC node client.
pub struct TendermintNode {
	client: reqwest::Client,
	url: String,
	next_id: AtomicU64,
}

impl TendermintNode {
	/// Creates a client for the given RPC endpoint.
	pub fn new(url: &str, settings: &NodeSettings) -> Result<Self, DeliveryError> {
		let client = reqwest::Client::builder()
			.timeout(settings.timeout)
			.build()
			.map_err(|e| DeliveryError::Network(format!("Failed to build HTTP client: {}", e)))?;
		Ok(Self {
			client,
			url: url.to_string(),
			next_id: AtomicU64::new(1),
		})
	}

	async fn call<T: DeserializeOwned>(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<T, DeliveryError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});

		tracing::trace!(method = method, id = id, "Sending RPC request");

		let response = self
			.client
			.post(&self.url)
			.json(&request)
			.send()
			.await
			.map_err(|e| DeliveryError::Network(format!("{} request failed: {}", method, e)))?;

		let body: RpcResponse<T> = response
			.json()
			.await
			.map_err(|e| DeliveryError::Decode(format!("{} response: {}", method, e)))?;

		body.into_result(method)
	}

	async fn abci_query(&self, path: &str, data: Vec<u8>) -> Result<AbciQueryResult, DeliveryError> {
		self.call(
			"abci_query",
			json!({
				"path": path,
				"data": hex::encode(data),
				"prove": false,
			}),
		)
		.await
	}
}

#[async_trait]
impl NodeInterface for TendermintNode {
	async fn get_tx(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<RawTransactionEnvelope>, DeliveryError> {
		let result = self
			.call::<TxResult>(
				"tx",
				json!({
					"hash": STANDARD.encode(&hash.0),
					"prove": false,
				}),
			)
			.await;

		match result {
			Ok(tx) => parse_tx(tx).map(Some),
			Err(DeliveryError::NotFound(message)) => {
				tracing::debug!(
					tx_hash = %truncate_id(&hash.to_hex()),
					"Transaction not found: {}",
					message
				);
				Ok(None)
			},
			Err(e) => Err(e),
		}
	}

	async fn get_block(&self, height: u64) -> Result<BlockHeader, DeliveryError> {
		let result: BlockResult = self
			.call("block", json!({ "height": height.to_string() }))
			.await?;
		parse_block(result)
	}

	async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin, DeliveryError> {
		let request = QueryBalanceRequest {
			address: address.to_string(),
			denom: denom.to_string(),
		};
		let result = self
			.abci_query(QUERY_BALANCE_PATH, request.encode_to_vec())
			.await?;
		parse_balance(result, denom)
	}

	async fn get_account(&self, address: &str) -> Result<Option<AccountInfo>, DeliveryError> {
		let request = QueryAccountRequest {
			address: address.to_string(),
		};
		let result = self
			.abci_query(QUERY_ACCOUNT_PATH, request.encode_to_vec())
			.await?;
		parse_account(result)
	}

	async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> Result<BroadcastResult, DeliveryError> {
		let result: BroadcastCommitResult = self
			.call(
				"broadcast_tx_commit",
				json!({ "tx": STANDARD.encode(&tx_bytes) }),
			)
			.await?;
		parse_broadcast(result)
	}
}

/// Factory function to create a Tendermint node client for a network.
pub fn create_node(
	network: &NetworkConfig,
	settings: &NodeSettings,
) -> Result<Box<dyn NodeInterface>, DeliveryError> {
	Ok(Box::new(TendermintNode::new(&network.rpc_url, settings)?))
}

/// Factory registered as the default node implementation.
pub fn factory() -> NodeFactory {
	create_node
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
	result: Option<T>,
	error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
	code: i64,
	message: String,
	#[serde(default)]
	data: Option<String>,
}

impl<T> RpcResponse<T> {
	fn into_result(self, method: &str) -> Result<T, DeliveryError> {
		if let Some(error) = self.error {
			let detail = error.data.unwrap_or_default();
			if detail.contains("not found") || error.message.contains("not found") {
				return Err(DeliveryError::NotFound(detail));
			}
			return Err(DeliveryError::Network(format!(
				"{} RPC error {}: {} {}",
				method, error.code, error.message, detail
			)));
		}
		self.result
			.ok_or_else(|| DeliveryError::Decode(format!("{} response has no result", method)))
	}
}

#[derive(Debug, Default, Deserialize)]
struct ExecResult {
	#[serde(default)]
	code: u32,
	#[serde(default)]
	log: String,
	#[serde(default, deserialize_with = "u64_from_string")]
	gas_wanted: u64,
	#[serde(default, deserialize_with = "u64_from_string")]
	gas_used: u64,
}

#[derive(Debug, Deserialize)]
struct TxResult {
	hash: String,
	#[serde(deserialize_with = "u64_from_string")]
	height: u64,
	tx_result: ExecResult,
	tx: String,
}

#[derive(Debug, Deserialize)]
struct BlockResult {
	block: Block,
}

#[derive(Debug, Deserialize)]
struct Block {
	header: Header,
}

#[derive(Debug, Deserialize)]
struct Header {
	chain_id: String,
	#[serde(deserialize_with = "u64_from_string")]
	height: u64,
	time: String,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
	response: AbciResponse,
}

#[derive(Debug, Default, Deserialize)]
struct AbciResponse {
	#[serde(default)]
	code: u32,
	#[serde(default)]
	log: String,
	#[serde(default)]
	value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastCommitResult {
	#[serde(default)]
	check_tx: ExecResult,
	#[serde(default, alias = "deliver_tx")]
	tx_result: ExecResult,
	hash: String,
	#[serde(default, deserialize_with = "u64_from_string")]
	height: u64,
}

/// Accepts integers encoded either as JSON numbers or as decimal strings.
fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum StringOrNumber {
		String(String),
		Number(u64),
	}

	match StringOrNumber::deserialize(deserializer)? {
		StringOrNumber::Number(n) => Ok(n),
		StringOrNumber::String(s) if s.is_empty() => Ok(0),
		StringOrNumber::String(s) => s
			.parse()
			.map_err(|e| serde::de::Error::custom(format!("Invalid integer {}: {}", s, e))),
	}
}

fn parse_hash(hash: &str) -> Result<TransactionHash, DeliveryError> {
	TransactionHash::from_hex(hash)
		.map_err(|e| DeliveryError::Decode(format!("Invalid transaction hash {}: {}", hash, e)))
}

fn parse_tx(result: TxResult) -> Result<RawTransactionEnvelope, DeliveryError> {
	let tx_bytes = STANDARD
		.decode(result.tx.as_bytes())
		.map_err(|e| DeliveryError::Decode(format!("Invalid transaction encoding: {}", e)))?;
	let body = TransactionBody::from_tx_bytes(&tx_bytes)
		.map_err(|e| DeliveryError::Decode(format!("Invalid transaction: {}", e)))?;

	Ok(RawTransactionEnvelope {
		hash: parse_hash(&result.hash)?,
		height: result.height,
		code: result.tx_result.code,
		gas_wanted: result.tx_result.gas_wanted,
		gas_used: result.tx_result.gas_used,
		raw_log: result.tx_result.log,
		body,
	})
}

fn parse_block(result: BlockResult) -> Result<BlockHeader, DeliveryError> {
	let header = result.block.header;
	let time = DateTime::parse_from_rfc3339(&header.time)
		.map_err(|e| DeliveryError::Decode(format!("Invalid block time {}: {}", header.time, e)))?
		.with_timezone(&Utc);
	Ok(BlockHeader {
		chain_id: header.chain_id,
		height: header.height,
		time,
	})
}

fn query_value(response: &AbciResponse) -> Result<Vec<u8>, DeliveryError> {
	match &response.value {
		Some(value) => STANDARD
			.decode(value.as_bytes())
			.map_err(|e| DeliveryError::Decode(format!("Invalid query value: {}", e))),
		None => Ok(Vec::new()),
	}
}

fn parse_balance(result: AbciQueryResult, denom: &str) -> Result<Coin, DeliveryError> {
	let response = result.response;
	if response.code != 0 {
		return Err(DeliveryError::Node {
			code: response.code,
			log: response.log,
		});
	}
	let value = query_value(&response)?;
	let decoded = QueryBalanceResponse::decode(value.as_slice())
		.map_err(|e| DeliveryError::Decode(format!("Invalid balance response: {}", e)))?;
	Ok(decoded.balance.unwrap_or_else(|| Coin::new(denom, 0u64)))
}

fn parse_account(result: AbciQueryResult) -> Result<Option<AccountInfo>, DeliveryError> {
	let response = result.response;
	if response.code != 0 {
		if response.log.contains("not found") {
			return Ok(None);
		}
		return Err(DeliveryError::Node {
			code: response.code,
			log: response.log,
		});
	}

	let value = query_value(&response)?;
	let decoded = QueryAccountResponse::decode(value.as_slice())
		.map_err(|e| DeliveryError::Decode(format!("Invalid account response: {}", e)))?;
	let Some(any) = decoded.account else {
		return Ok(None);
	};
	if any.type_url != BASE_ACCOUNT_TYPE_URL {
		return Err(DeliveryError::Decode(format!(
			"Unsupported account type {}",
			any.type_url
		)));
	}
	let account = BaseAccount::decode(any.value.as_slice())
		.map_err(|e| DeliveryError::Decode(format!("Invalid account: {}", e)))?;

	Ok(Some(AccountInfo {
		address: account.address,
		account_number: account.account_number,
		sequence: account.sequence,
	}))
}

fn parse_broadcast(result: BroadcastCommitResult) -> Result<BroadcastResult, DeliveryError> {
	let hash = parse_hash(&result.hash)?;

	// Rejected by CheckTx: never included in a block.
	if result.check_tx.code != 0 {
		return Ok(BroadcastResult {
			hash,
			height: 0,
			code: result.check_tx.code,
			gas_wanted: result.check_tx.gas_wanted,
			gas_used: result.check_tx.gas_used,
			raw_log: result.check_tx.log,
		});
	}

	Ok(BroadcastResult {
		hash,
		height: result.height,
		code: result.tx_result.code,
		gas_wanted: result.tx_result.gas_wanted,
		gas_used: result.tx_result.gas_used,
		raw_log: result.tx_result.log,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use osmo_types::proto::{Any, AuthInfo, Fee, MsgSend, SignerInfo, TxBody, TxRaw};
	use osmo_types::EncodedMessage;
	use serde_json::Value;

	const HASH: &str = "5F3B0A3C1E2D4F6A8B9C0D1E2F3A4B5C6D7E8F9A0B1C2D3E4F5A6B7C8D9E0F1A";

	fn from_json<T: DeserializeOwned>(value: Value) -> T {
		serde_json::from_value(value).unwrap()
	}

	fn encoded_tx() -> String {
		let msg = MsgSend {
			from_address: "osmo1from".to_string(),
			to_address: "osmo1to".to_string(),
			amount: vec![Coin::new("uosmo", 5u64)],
		};
		let raw = TxRaw {
			body_bytes: TxBody {
				messages: vec![Any {
					type_url: "/cosmos.bank.v1beta1.MsgSend".to_string(),
					value: msg.encode_to_vec(),
				}],
				memo: "hello".to_string(),
				timeout_height: 0,
			}
			.encode_to_vec(),
			auth_info_bytes: AuthInfo {
				signer_infos: vec![SignerInfo {
					public_key: None,
					mode_info: None,
					sequence: 12,
				}],
				fee: Some(Fee {
					amount: vec![Coin::new("uosmo", 5000u64)],
					gas_limit: 200_000,
					payer: String::new(),
					granter: String::new(),
				}),
			}
			.encode_to_vec(),
			signatures: vec![vec![0u8; 64]],
		};
		STANDARD.encode(raw.encode_to_vec())
	}

	#[test]
	fn test_parse_tx() {
		let result: RpcResponse<TxResult> = from_json(json!({
			"jsonrpc": "2.0",
			"id": 1,
			"result": {
				"hash": HASH,
				"height": "7013542",
				"index": 0,
				"tx_result": {
					"code": 0,
					"log": "[]",
					"gas_wanted": "200000",
					"gas_used": "81234"
				},
				"tx": encoded_tx()
			}
		}));

		let envelope = parse_tx(result.into_result("tx").unwrap()).unwrap();
		assert_eq!(envelope.hash.to_hex(), HASH);
		assert_eq!(envelope.height, 7_013_542);
		assert_eq!(envelope.code, 0);
		assert_eq!(envelope.gas_wanted, 200_000);
		assert_eq!(envelope.gas_used, 81_234);
		assert_eq!(envelope.body.memo, "hello");
		assert_eq!(envelope.body.signer_sequences, vec![12]);
		assert_eq!(envelope.body.fee.unwrap().gas_limit, 200_000);
		assert!(matches!(
			&envelope.body.messages[0],
			EncodedMessage::Proto(msg) if msg.type_url == "/cosmos.bank.v1beta1.MsgSend"
		));
	}

	#[test]
	fn test_tx_not_found_error() {
		let result: RpcResponse<TxResult> = from_json(json!({
			"jsonrpc": "2.0",
			"id": 1,
			"error": {
				"code": -32603,
				"message": "Internal error",
				"data": format!("tx ({}) not found", HASH)
			}
		}));
		assert!(matches!(
			result.into_result("tx"),
			Err(DeliveryError::NotFound(_))
		));
	}

	#[test]
	fn test_other_rpc_error() {
		let result: RpcResponse<TxResult> = from_json(json!({
			"jsonrpc": "2.0",
			"id": 1,
			"error": { "code": -32602, "message": "Invalid params", "data": "bad hash" }
		}));
		let err = result.into_result("tx").unwrap_err();
		assert!(matches!(err, DeliveryError::Network(_)));
		assert!(err.to_string().contains("-32602"));
	}

	#[test]
	fn test_parse_block() {
		let result: BlockResult = from_json(json!({
			"block_id": { "hash": "ABCD" },
			"block": {
				"header": {
					"chain_id": "osmosis-1",
					"height": "7013542",
					"time": "2023-01-10T12:34:56.789012345Z"
				}
			}
		}));

		let header = parse_block(result).unwrap();
		assert_eq!(header.chain_id, "osmosis-1");
		assert_eq!(header.height, 7_013_542);
		assert_eq!(header.time.to_rfc3339(), "2023-01-10T12:34:56.789012345+00:00");
	}

	#[test]
	fn test_parse_block_invalid_time() {
		let result: BlockResult = from_json(json!({
			"block": { "header": { "chain_id": "osmosis-1", "height": "1", "time": "yesterday" } }
		}));
		assert!(matches!(parse_block(result), Err(DeliveryError::Decode(_))));
	}

	#[test]
	fn test_parse_balance() {
		let value = QueryBalanceResponse {
			balance: Some(Coin::new("uosmo", 1_234_567u64)),
		}
		.encode_to_vec();
		let result: AbciQueryResult = from_json(json!({
			"response": { "code": 0, "log": "", "value": STANDARD.encode(value), "height": "10" }
		}));
		assert_eq!(
			parse_balance(result, "uosmo").unwrap(),
			Coin::new("uosmo", 1_234_567u64)
		);

		let empty: AbciQueryResult = from_json(json!({
			"response": { "code": 0, "log": "", "value": null }
		}));
		assert_eq!(parse_balance(empty, "uosmo").unwrap().amount, "0");
	}

	#[test]
	fn test_parse_account() {
		let account = BaseAccount {
			address: "osmo1holder".to_string(),
			pub_key: None,
			account_number: 42,
			sequence: 9,
		};
		let value = QueryAccountResponse {
			account: Some(Any {
				type_url: BASE_ACCOUNT_TYPE_URL.to_string(),
				value: account.encode_to_vec(),
			}),
		}
		.encode_to_vec();
		let result: AbciQueryResult = from_json(json!({
			"response": { "code": 0, "value": STANDARD.encode(value) }
		}));

		let info = parse_account(result).unwrap().unwrap();
		assert_eq!(info.account_number, 42);
		assert_eq!(info.sequence, 9);
	}

	#[test]
	fn test_parse_missing_account() {
		let result: AbciQueryResult = from_json(json!({
			"response": {
				"code": 22,
				"codespace": "sdk",
				"log": "rpc error: code = NotFound desc = account osmo1nobody not found: key not found"
			}
		}));
		assert!(parse_account(result).unwrap().is_none());

		let failure: AbciQueryResult = from_json(json!({
			"response": { "code": 5, "log": "internal" }
		}));
		assert!(matches!(
			parse_account(failure),
			Err(DeliveryError::Node { code: 5, .. })
		));
	}

	#[test]
	fn test_parse_broadcast_committed() {
		let result: BroadcastCommitResult = from_json(json!({
			"check_tx": { "code": 0, "gas_wanted": "200000", "gas_used": "50000" },
			"tx_result": { "code": 0, "log": "", "gas_wanted": "200000", "gas_used": "81234" },
			"hash": HASH,
			"height": "7013543"
		}));

		let broadcast = parse_broadcast(result).unwrap();
		assert!(broadcast.is_success());
		assert_eq!(broadcast.height, 7_013_543);
		assert_eq!(broadcast.gas_used, 81_234);
	}

	#[test]
	fn test_parse_broadcast_deliver_tx_alias() {
		let result: BroadcastCommitResult = from_json(json!({
			"check_tx": { "code": 0 },
			"deliver_tx": { "code": 5, "log": "insufficient funds", "gas_wanted": 200000, "gas_used": 60000 },
			"hash": HASH,
			"height": 15
		}));

		let broadcast = parse_broadcast(result).unwrap();
		assert_eq!(broadcast.code, 5);
		assert_eq!(broadcast.raw_log, "insufficient funds");
		assert_eq!(broadcast.height, 15);
	}

	#[test]
	fn test_parse_broadcast_check_tx_rejected() {
		let result: BroadcastCommitResult = from_json(json!({
			"check_tx": { "code": 32, "log": "account sequence mismatch" },
			"tx_result": { "code": 0 },
			"hash": HASH,
			"height": "0"
		}));

		let broadcast = parse_broadcast(result).unwrap();
		assert!(!broadcast.is_success());
		assert_eq!(broadcast.code, 32);
		assert_eq!(broadcast.height, 0);
		assert_eq!(broadcast.raw_log, "account sequence mismatch");
	}

	#[test]
	fn test_create_node() {
		let node = create_node(&NetworkConfig::osmosis(), &NodeSettings::default());
		assert!(node.is_ok());
	}
}
