//! Transaction message types.
//!
//! A message taken from a transaction body arrives in one of two wire shapes:
//! a protobuf `Any` (type URL plus opaque bytes) or a legacy amino JSON object
//! (type string plus a plain key/value payload). [`EncodedMessage`] keeps the
//! two apart so that only the resolver has to deal with the ambiguity.

use crate::proto::{Any, Coin};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amino type string of the bank transfer message.
pub const AMINO_MSG_SEND_TYPE: &str = "cosmos-sdk/MsgSend";

/// A protobuf-encoded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoMessage {
	pub type_url: String,
	#[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
	pub value: Vec<u8>,
}

/// A legacy amino JSON message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AminoMessage {
	#[serde(rename = "type")]
	pub msg_type: String,
	pub value: serde_json::Value,
}

/// One message extracted from a transaction body, in either wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum EncodedMessage {
	Proto(ProtoMessage),
	Amino(AminoMessage),
}

impl EncodedMessage {
	/// The declared type of the message, whichever its encoding.
	pub fn type_name(&self) -> &str {
		match self {
			EncodedMessage::Proto(msg) => &msg.type_url,
			EncodedMessage::Amino(msg) => &msg.msg_type,
		}
	}
}

impl From<Any> for ProtoMessage {
	fn from(any: Any) -> Self {
		Self {
			type_url: any.type_url,
			value: any.value,
		}
	}
}

impl From<ProtoMessage> for Any {
	fn from(msg: ProtoMessage) -> Self {
		Self {
			type_url: msg.type_url,
			value: msg.value,
		}
	}
}

impl From<Any> for EncodedMessage {
	fn from(any: Any) -> Self {
		EncodedMessage::Proto(any.into())
	}
}

/// Canonical transfer fields shared by both encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTransferMessage {
	pub from_address: String,
	pub to_address: String,
	pub amount: Vec<Coin>,
}

fn serialize_base64<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&STANDARD.encode(bytes))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	let encoded = String::deserialize(deserializer)?;
	STANDARD
		.decode(encoded.as_bytes())
		.map_err(|e| serde::de::Error::custom(format!("Invalid base64 value: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_encoded_message_json_shapes() {
		let proto: EncodedMessage = serde_json::from_value(json!({
			"encoding": "proto",
			"type_url": "/cosmos.bank.v1beta1.MsgSend",
			"value": "CgFh"
		}))
		.unwrap();
		assert_eq!(proto.type_name(), "/cosmos.bank.v1beta1.MsgSend");
		match proto {
			EncodedMessage::Proto(msg) => assert_eq!(msg.value, vec![0x0a, 0x01, b'a']),
			other => panic!("expected proto message, got {:?}", other),
		}

		let amino: EncodedMessage = serde_json::from_value(json!({
			"encoding": "amino",
			"type": "cosmos-sdk/MsgSend",
			"value": { "from_address": "a", "to_address": "b", "amount": [] }
		}))
		.unwrap();
		assert_eq!(amino.type_name(), AMINO_MSG_SEND_TYPE);
	}
}
