//! Resolution of transaction messages into transfers.
//!
//! A message arrives either as a protobuf `Any` or as legacy amino JSON. Both
//! are funnelled through the protobuf path: amino transfers are first converted
//! into an `Any` and then decoded exactly like a native protobuf message.

use osmo_types::message::AMINO_MSG_SEND_TYPE;
use osmo_types::proto::{MsgSend, MSG_SEND_TYPE_URL};
use osmo_types::{AminoMessage, Coin, EncodedMessage, NormalizedTransferMessage, ProtoMessage};
use prost::Message;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Reasons a message does not resolve to a transfer.
#[derive(Debug, Error)]
enum ResolveError {
	#[error("not a transfer message: {0}")]
	NotATransfer(String),
	#[error("invalid protobuf payload: {0}")]
	Decode(#[from] prost::DecodeError),
	#[error("invalid amino payload: {0}")]
	Amino(String),
	#[error("transfer carries no coins")]
	EmptyAmount,
}

/// `value` of an amino `cosmos-sdk/MsgSend`.
#[derive(Debug, Deserialize)]
struct AminoMsgSend {
	from_address: String,
	to_address: String,
	#[serde(default)]
	amount: Vec<AminoCoin>,
}

#[derive(Debug, Deserialize)]
struct AminoCoin {
	denom: String,
	#[serde(default, deserialize_with = "amount_from_string_or_number")]
	amount: String,
}

/// Amino encoders differ on whether coin amounts are JSON strings or numbers.
fn amount_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
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
		StringOrNumber::String(s) => Ok(s),
		StringOrNumber::Number(n) => Ok(n.to_string()),
	}
}

/// Decodes transfer messages in either wire format.
pub struct MessageResolver;

impl MessageResolver {
	/// Resolves a message into a transfer.
	///
	/// Returns `None` for anything that is not a well-formed bank transfer; the
	/// reason is logged at debug level. Amino addresses must be bech32 with the
	/// given prefix.
	pub fn resolve(
		message: &EncodedMessage,
		bech32_prefix: &str,
	) -> Option<NormalizedTransferMessage> {
		let result = match message {
			EncodedMessage::Proto(msg) => decode_proto(msg),
			EncodedMessage::Amino(msg) => {
				amino_to_proto(msg, bech32_prefix).and_then(|any| decode_proto(&any))
			},
		};

		match result {
			Ok(transfer) => Some(transfer),
			Err(e) => {
				tracing::debug!(
					message_type = %message.type_name(),
					error = %e,
					"Message did not resolve to a transfer"
				);
				None
			},
		}
	}
}

fn decode_proto(msg: &ProtoMessage) -> Result<NormalizedTransferMessage, ResolveError> {
	if msg.type_url != MSG_SEND_TYPE_URL {
		return Err(ResolveError::NotATransfer(msg.type_url.clone()));
	}
	let send = MsgSend::decode(msg.value.as_slice())?;
	if send.amount.is_empty() {
		return Err(ResolveError::EmptyAmount);
	}

	Ok(NormalizedTransferMessage {
		from_address: send.from_address,
		to_address: send.to_address,
		amount: send.amount,
	})
}

fn amino_to_proto(msg: &AminoMessage, bech32_prefix: &str) -> Result<ProtoMessage, ResolveError> {
	if msg.msg_type != AMINO_MSG_SEND_TYPE {
		return Err(ResolveError::NotATransfer(msg.msg_type.clone()));
	}
	let value: AminoMsgSend = serde_json::from_value(msg.value.clone())
		.map_err(|e| ResolveError::Amino(e.to_string()))?;

	check_address(&value.from_address, bech32_prefix)?;
	check_address(&value.to_address, bech32_prefix)?;

	let send = MsgSend {
		from_address: value.from_address,
		to_address: value.to_address,
		amount: value
			.amount
			.into_iter()
			.map(|coin| Coin {
				denom: coin.denom,
				amount: coin.amount,
			})
			.collect(),
	};

	Ok(ProtoMessage {
		type_url: MSG_SEND_TYPE_URL.to_string(),
		value: send.encode_to_vec(),
	})
}

fn check_address(address: &str, bech32_prefix: &str) -> Result<(), ResolveError> {
	let (hrp, _) = bech32::decode(address)
		.map_err(|e| ResolveError::Amino(format!("invalid address {}: {}", address, e)))?;
	if !hrp.as_str().eq_ignore_ascii_case(bech32_prefix) {
		return Err(ResolveError::Amino(format!(
			"address {} does not use prefix {}",
			address, bech32_prefix
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use osmo_account::implementations::mnemonic::encode_address;
	use osmo_types::proto::Any;
	use serde_json::json;

	fn address(prefix: &str, seed: u8) -> String {
		let mut key = vec![0x02];
		key.extend_from_slice(&[seed; 32]);
		encode_address(prefix, &key).unwrap()
	}

	fn proto_send(from: &str, to: &str, amount: Vec<Coin>) -> EncodedMessage {
		let msg = MsgSend {
			from_address: from.to_string(),
			to_address: to.to_string(),
			amount,
		};
		EncodedMessage::from(Any {
			type_url: MSG_SEND_TYPE_URL.to_string(),
			value: msg.encode_to_vec(),
		})
	}

	fn amino_send(from: &str, to: &str, amount: serde_json::Value) -> EncodedMessage {
		EncodedMessage::Amino(AminoMessage {
			msg_type: AMINO_MSG_SEND_TYPE.to_string(),
			value: json!({
				"from_address": from,
				"to_address": to,
				"amount": amount,
			}),
		})
	}

	#[test]
	fn test_resolve_proto_transfer() {
		let (from, to) = (address("osmo", 1), address("osmo", 2));
		let message = proto_send(&from, &to, vec![Coin::new("uosmo", 5u64)]);

		let transfer = MessageResolver::resolve(&message, "osmo").unwrap();
		assert_eq!(transfer.from_address, from);
		assert_eq!(transfer.to_address, to);
		assert_eq!(transfer.amount, vec![Coin::new("uosmo", 5u64)]);
	}

	#[test]
	fn test_cross_format_equivalence() {
		let (from, to) = (address("osmo", 1), address("osmo", 2));
		let coins = vec![Coin::new("uosmo", 1_000u64), Coin::new("uion", 7u64)];

		let proto = proto_send(&from, &to, coins);
		let amino = amino_send(
			&from,
			&to,
			json!([
				{ "denom": "uosmo", "amount": "1000" },
				{ "denom": "uion", "amount": "7" }
			]),
		);

		let from_proto = MessageResolver::resolve(&proto, "osmo").unwrap();
		let from_amino = MessageResolver::resolve(&amino, "osmo").unwrap();
		assert_eq!(from_proto, from_amino);
	}

	#[test]
	fn test_non_transfer_messages_resolve_to_none() {
		let delegate = EncodedMessage::from(Any {
			type_url: "/cosmos.staking.v1beta1.MsgDelegate".to_string(),
			value: vec![0x0a, 0x01, b'a'],
		});
		assert!(MessageResolver::resolve(&delegate, "osmo").is_none());

		let amino_delegate = EncodedMessage::Amino(AminoMessage {
			msg_type: "cosmos-sdk/MsgDelegate".to_string(),
			value: json!({ "delegator_address": address("osmo", 1) }),
		});
		assert!(MessageResolver::resolve(&amino_delegate, "osmo").is_none());
	}

	#[test]
	fn test_malformed_payloads_resolve_to_none() {
		let garbage = EncodedMessage::from(Any {
			type_url: MSG_SEND_TYPE_URL.to_string(),
			value: vec![0xff, 0xff, 0xff],
		});
		assert!(MessageResolver::resolve(&garbage, "osmo").is_none());

		let missing_fields = EncodedMessage::Amino(AminoMessage {
			msg_type: AMINO_MSG_SEND_TYPE.to_string(),
			value: json!({ "amount": [] }),
		});
		assert!(MessageResolver::resolve(&missing_fields, "osmo").is_none());
	}

	#[test]
	fn test_amino_requires_network_prefix() {
		let message = amino_send(
			&address("cosmos", 1),
			&address("osmo", 2),
			json!([{ "denom": "uosmo", "amount": "1" }]),
		);
		assert!(MessageResolver::resolve(&message, "osmo").is_none());
		assert!(MessageResolver::resolve(&message, "cosmos").is_none());

		let not_bech32 = amino_send(
			"osmo1notbech32",
			&address("osmo", 2),
			json!([{ "denom": "uosmo", "amount": "1" }]),
		);
		assert!(MessageResolver::resolve(&not_bech32, "osmo").is_none());
	}

	#[test]
	fn test_empty_coin_list_resolves_to_none() {
		let (from, to) = (address("osmo", 1), address("osmo", 2));
		assert!(MessageResolver::resolve(&proto_send(&from, &to, vec![]), "osmo").is_none());
		assert!(MessageResolver::resolve(&amino_send(&from, &to, json!([])), "osmo").is_none());
	}

	#[test]
	fn test_amino_numeric_amount() {
		let (from, to) = (address("osmo", 1), address("osmo", 2));
		let numeric = amino_send(&from, &to, json!([{ "denom": "uosmo", "amount": 5 }]));
		let string = amino_send(&from, &to, json!([{ "denom": "uosmo", "amount": "5" }]));

		let transfer = MessageResolver::resolve(&numeric, "osmo").unwrap();
		assert_eq!(transfer.amount, vec![Coin::new("uosmo", 5u64)]);
		assert_eq!(Some(transfer), MessageResolver::resolve(&string, "osmo"));

		let fractional = amino_send(&from, &to, json!([{ "denom": "uosmo", "amount": 1.5 }]));
		assert!(MessageResolver::resolve(&fractional, "osmo").is_none());
	}

	#[test]
	fn test_amino_coin_without_amount_keeps_denom() {
		let (from, to) = (address("osmo", 1), address("osmo", 2));
		let message = amino_send(&from, &to, json!([{ "denom": "uosmo" }]));

		let transfer = MessageResolver::resolve(&message, "osmo").unwrap();
		assert_eq!(transfer.amount[0].denom, "uosmo");
		assert_eq!(transfer.amount[0].amount, "");
	}
}
