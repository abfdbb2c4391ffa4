//! Account management module for the Osmosis wallet client.
//!
//! This module provides abstractions for the signing account behind a transfer:
//! the bech32 address, the compressed public key placed in the transaction's
//! signer info, and SIGN_MODE_DIRECT signatures over serialized sign documents.

use async_trait::async_trait;
use osmo_types::{NetworkConfig, SecretString};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod mnemonic;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The mnemonic phrase could not be parsed.
	#[error("Invalid mnemonic: {0}")]
	InvalidMnemonic(String),
	/// Key derivation or address encoding failed.
	#[error("Derivation failed: {0}")]
	Derivation(String),
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
}

/// Trait defining the interface for account implementations.
///
/// An account is bound to one network: its address carries that network's
/// bech32 prefix.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the bech32 address of this account.
	async fn address(&self) -> Result<String, AccountError>;

	/// Returns the 33-byte compressed secp256k1 public key.
	async fn public_key(&self) -> Result<Vec<u8>, AccountError>;

	/// Signs the serialized bytes of a `SignDoc`.
	///
	/// The bytes are hashed with SHA-256 and signed; the result is the 64-byte
	/// `r || s` encoding with a low `s`.
	async fn sign_direct(&self, sign_doc: &[u8]) -> Result<Vec<u8>, AccountError>;
}

/// Type alias for account factory functions.
///
/// Builds an account for the given network from a mnemonic.
pub type AccountFactory =
	fn(&SecretString, &NetworkConfig) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Service that manages account operations.
///
/// This struct provides a high-level interface for account management,
/// wrapping an underlying account implementation.
pub struct AccountService {
	/// The underlying account implementation.
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Builds the service from a mnemonic using the given factory.
	pub fn from_mnemonic(
		factory: AccountFactory,
		mnemonic: &SecretString,
		network: &NetworkConfig,
	) -> Result<Self, AccountError> {
		Ok(Self::new(factory(mnemonic, network)?))
	}

	/// Retrieves the address associated with the managed account.
	pub async fn get_address(&self) -> Result<String, AccountError> {
		self.implementation.address().await
	}

	/// Retrieves the compressed public key of the managed account.
	pub async fn get_public_key(&self) -> Result<Vec<u8>, AccountError> {
		self.implementation.public_key().await
	}

	/// Signs serialized sign document bytes using the managed account.
	pub async fn sign(&self, sign_doc: &[u8]) -> Result<Vec<u8>, AccountError> {
		self.implementation.sign_direct(sign_doc).await
	}
}
