//! Common types for the Osmosis wallet client.
//!
//! This crate defines the data model shared by every other crate in the
//! workspace: network configuration, the wire shapes of transaction messages,
//! what the node returns, and the receipts handed back to callers.

/// Wallet address validation.
pub mod address;
/// Types returned by the node: envelopes, broadcast results, blocks, accounts.
pub mod delivery;
/// Transaction message encodings and the normalized transfer message.
pub mod message;
/// Network configuration and the network registry.
pub mod networks;
/// Cosmos SDK protobuf messages.
pub mod proto;
/// Receipts returned to callers.
pub mod receipt;
/// Zeroizing, redacted string for mnemonics.
pub mod secret_string;
/// Utility functions for amounts and formatting.
pub mod utils;

pub use address::AddressValidator;
pub use delivery::*;
pub use message::{
	AminoMessage, EncodedMessage, NormalizedTransferMessage, ProtoMessage, AMINO_MSG_SEND_TYPE,
};
pub use networks::{
	NetworkConfig, NetworkError, NetworkRegistry, NetworksConfig, StdFee, OSMOSIS,
};
pub use proto::Coin;
pub use receipt::{Receipt, TransactionStatus, TransferRequest};
pub use secret_string::SecretString;
pub use utils::{
	parse_amount, truncate_id, without_0x_prefix, AmountError, GasPrice, GasPriceError,
};
