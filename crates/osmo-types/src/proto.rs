//! Cosmos SDK protobuf messages used by the client.
//!
//! Only the handful of messages needed to decode a transfer, build and sign a
//! `TxRaw`, and answer balance and account queries are defined here. Field tags
//! follow the upstream `.proto` definitions so the encodings are wire compatible
//! with any Cosmos SDK node.

use serde::{Deserialize, Serialize};

/// Type URL of the bank transfer message.
pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
/// Type URL of a secp256k1 public key.
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
/// Type URL of the default account implementation.
pub const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

/// ABCI query path for a single-denomination balance.
pub const QUERY_BALANCE_PATH: &str = "/cosmos.bank.v1beta1.Query/Balance";
/// ABCI query path for an account record.
pub const QUERY_ACCOUNT_PATH: &str = "/cosmos.auth.v1beta1.Query/Account";

/// `google.protobuf.Any`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Any {
	#[prost(string, tag = "1")]
	pub type_url: String,
	#[prost(bytes = "vec", tag = "2")]
	pub value: Vec<u8>,
}

/// A `(denom, amount)` pair. Amounts are decimal strings on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, prost::Message)]
pub struct Coin {
	#[prost(string, tag = "1")]
	pub denom: String,
	#[prost(string, tag = "2")]
	pub amount: String,
}

impl Coin {
	pub fn new(denom: impl Into<String>, amount: impl ToString) -> Self {
		Self {
			denom: denom.into(),
			amount: amount.to_string(),
		}
	}
}

/// `cosmos.bank.v1beta1.MsgSend`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgSend {
	#[prost(string, tag = "1")]
	pub from_address: String,
	#[prost(string, tag = "2")]
	pub to_address: String,
	#[prost(message, repeated, tag = "3")]
	pub amount: Vec<Coin>,
}

/// `cosmos.tx.v1beta1.TxRaw`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TxRaw {
	#[prost(bytes = "vec", tag = "1")]
	pub body_bytes: Vec<u8>,
	#[prost(bytes = "vec", tag = "2")]
	pub auth_info_bytes: Vec<u8>,
	#[prost(bytes = "vec", repeated, tag = "3")]
	pub signatures: Vec<Vec<u8>>,
}

/// `cosmos.tx.v1beta1.TxBody`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TxBody {
	#[prost(message, repeated, tag = "1")]
	pub messages: Vec<Any>,
	#[prost(string, tag = "2")]
	pub memo: String,
	#[prost(uint64, tag = "3")]
	pub timeout_height: u64,
}

/// `cosmos.tx.v1beta1.AuthInfo`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthInfo {
	#[prost(message, repeated, tag = "1")]
	pub signer_infos: Vec<SignerInfo>,
	#[prost(message, optional, tag = "2")]
	pub fee: Option<Fee>,
}

/// `cosmos.tx.v1beta1.SignerInfo`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SignerInfo {
	#[prost(message, optional, tag = "1")]
	pub public_key: Option<Any>,
	#[prost(message, optional, tag = "2")]
	pub mode_info: Option<ModeInfo>,
	#[prost(uint64, tag = "3")]
	pub sequence: u64,
}

/// `cosmos.tx.v1beta1.ModeInfo`, restricted to the single-signer arm of its oneof.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ModeInfo {
	#[prost(message, optional, tag = "1")]
	pub single: Option<ModeInfoSingle>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModeInfoSingle {
	#[prost(enumeration = "SignMode", tag = "1")]
	pub mode: i32,
}

/// `cosmos.tx.signing.v1beta1.SignMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum SignMode {
	Unspecified = 0,
	Direct = 1,
	Textual = 2,
	LegacyAminoJson = 127,
}

/// `cosmos.tx.v1beta1.Fee`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Fee {
	#[prost(message, repeated, tag = "1")]
	pub amount: Vec<Coin>,
	#[prost(uint64, tag = "2")]
	pub gas_limit: u64,
	#[prost(string, tag = "3")]
	pub payer: String,
	#[prost(string, tag = "4")]
	pub granter: String,
}

/// `cosmos.tx.v1beta1.SignDoc`, the payload signed in `SIGN_MODE_DIRECT`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SignDoc {
	#[prost(bytes = "vec", tag = "1")]
	pub body_bytes: Vec<u8>,
	#[prost(bytes = "vec", tag = "2")]
	pub auth_info_bytes: Vec<u8>,
	#[prost(string, tag = "3")]
	pub chain_id: String,
	#[prost(uint64, tag = "4")]
	pub account_number: u64,
}

/// `cosmos.crypto.secp256k1.PubKey`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PubKey {
	#[prost(bytes = "vec", tag = "1")]
	pub key: Vec<u8>,
}

/// `cosmos.auth.v1beta1.BaseAccount`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BaseAccount {
	#[prost(string, tag = "1")]
	pub address: String,
	#[prost(message, optional, tag = "2")]
	pub pub_key: Option<Any>,
	#[prost(uint64, tag = "3")]
	pub account_number: u64,
	#[prost(uint64, tag = "4")]
	pub sequence: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryBalanceRequest {
	#[prost(string, tag = "1")]
	pub address: String,
	#[prost(string, tag = "2")]
	pub denom: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryBalanceResponse {
	#[prost(message, optional, tag = "1")]
	pub balance: Option<Coin>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryAccountRequest {
	#[prost(string, tag = "1")]
	pub address: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryAccountResponse {
	#[prost(message, optional, tag = "1")]
	pub account: Option<Any>,
}
