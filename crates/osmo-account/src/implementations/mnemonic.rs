//! Mnemonic-backed account implementation.
//!
//! Keys are derived from a BIP-39 English mnemonic (empty passphrase) along the
//! Cosmos HD path, and the address is `bech32(prefix, ripemd160(sha256(pubkey)))`
//! over the compressed public key.

use crate::{AccountError, AccountFactory, AccountInterface};
use async_trait::async_trait;
use bip39::{Language, Mnemonic};
use bitcoin_hashes::{hash160, Hash};
use coins_bip32::path::DerivationPath;
use coins_bip32::prelude::*;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use osmo_types::{NetworkConfig, SecretString};

/// HD path of the first account under coin type 118.
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";

const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Account derived from a mnemonic phrase.
pub struct MnemonicAccount {
	signing_key: SigningKey,
	public_key: Vec<u8>,
	address: String,
}

impl MnemonicAccount {
	/// Derives the account for the given address prefix.
	pub fn new(mnemonic: &SecretString, bech32_prefix: &str) -> Result<Self, AccountError> {
		if mnemonic.is_empty() {
			return Err(AccountError::InvalidMnemonic("empty mnemonic".to_string()));
		}
		let words = mnemonic.word_count();
		if !VALID_WORD_COUNTS.contains(&words) {
			return Err(AccountError::InvalidMnemonic(format!(
				"expected 12, 15, 18, 21 or 24 words, got {}",
				words
			)));
		}

		let seed = mnemonic.with_exposed(|phrase| {
			Mnemonic::parse_in(Language::English, phrase.trim())
				.map(|m| m.to_seed(""))
				.map_err(|e| AccountError::InvalidMnemonic(e.to_string()))
		})?;

		let path = COSMOS_HD_PATH
			.parse::<DerivationPath>()
			.map_err(|e| AccountError::Derivation(format!("Invalid derivation path: {}", e)))?;
		let master = XPriv::root_from_seed(&seed, None)
			.map_err(|e| AccountError::Derivation(format!("Master key: {}", e)))?;
		let derived = master
			.derive_path(&path)
			.map_err(|e| AccountError::Derivation(format!("Child key: {}", e)))?;

		let signing_key: &SigningKey = derived.as_ref();
		let signing_key = signing_key.clone();
		let public_key = signing_key
			.verifying_key()
			.to_encoded_point(true)
			.as_bytes()
			.to_vec();
		let address = encode_address(bech32_prefix, &public_key)?;

		tracing::debug!(address = %address, "Derived account from mnemonic");

		Ok(Self {
			signing_key,
			public_key,
			address,
		})
	}
}

/// Encodes the account address of a compressed public key.
pub fn encode_address(bech32_prefix: &str, public_key: &[u8]) -> Result<String, AccountError> {
	let hrp = bech32::Hrp::parse(bech32_prefix)
		.map_err(|e| AccountError::Derivation(format!("Invalid prefix: {}", e)))?;
	let digest = hash160::Hash::hash(public_key).to_byte_array();
	bech32::encode::<bech32::Bech32>(hrp, &digest)
		.map_err(|e| AccountError::Derivation(format!("Address encoding: {}", e)))
}

/// Checks a 64-byte DIRECT signature against a compressed public key.
pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
	let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
		return false;
	};
	let Ok(signature) = Signature::from_slice(signature) else {
		return false;
	};
	key.verify(message, &signature).is_ok()
}

#[async_trait]
impl AccountInterface for MnemonicAccount {
	async fn address(&self) -> Result<String, AccountError> {
		Ok(self.address.clone())
	}

	async fn public_key(&self) -> Result<Vec<u8>, AccountError> {
		Ok(self.public_key.clone())
	}

	async fn sign_direct(&self, sign_doc: &[u8]) -> Result<Vec<u8>, AccountError> {
		let signature: Signature = self
			.signing_key
			.try_sign(sign_doc)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		let signature = signature.normalize_s().unwrap_or(signature);
		Ok(signature.to_bytes().to_vec())
	}
}

/// Factory function to create a mnemonic account for a network.
pub fn create_account(
	mnemonic: &SecretString,
	network: &NetworkConfig,
) -> Result<Box<dyn AccountInterface>, AccountError> {
	Ok(Box::new(MnemonicAccount::new(
		mnemonic,
		&network.bech32_prefix,
	)?))
}

/// Factory registered as the default account implementation.
pub fn factory() -> AccountFactory {
	create_account
}
