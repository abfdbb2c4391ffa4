//! Wallet address validation.
//!
//! An account address is the network's bech32 prefix, the separator `1`, and
//! 38 characters of data and checksum (20 address bytes encode to 32 data
//! characters plus a 6 character checksum).

use regex::Regex;

/// Number of characters after the `1` separator in an account address.
pub const ADDRESS_DATA_LEN: usize = 38;

/// Pattern check for wallet addresses of one network.
///
/// Matching is a substring search, not a full-string match: a string that
/// merely contains a well-formed address is accepted. The checksum is not
/// verified.
#[derive(Debug, Clone)]
pub struct AddressValidator {
	pattern: Regex,
}

impl AddressValidator {
	/// Builds a validator for the given bech32 prefix.
	pub fn new(bech32_prefix: &str) -> Self {
		let pattern = format!(
			"{}1[a-z0-9]{{{}}}",
			regex::escape(bech32_prefix),
			ADDRESS_DATA_LEN
		);
		// The prefix is escaped and the rest of the pattern is fixed.
		let pattern = Regex::new(&pattern).expect("address pattern is a valid regex");
		Self { pattern }
	}

	pub fn is_valid(&self, address: &str) -> bool {
		self.pattern.is_match(address)
	}
}
