//! Conversion utilities for on-chain amounts.
//!
//! Cosmos SDK amounts travel as decimal strings of arbitrary size; these helpers
//! turn them into integers and derive exact gas prices from them.

use num_rational::Ratio;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest number of fractional digits a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Error raised when an on-chain amount string is not a base-unit integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid amount '{0}'")]
pub struct AmountError(pub String);

/// Error raised when a gas price string is neither a decimal nor a fraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid gas price '{0}'")]
pub struct GasPriceError(pub String);

/// Parses a base-unit amount string.
///
/// An empty string is the protobuf default for an unset amount and parses
/// as zero.
pub fn parse_amount(amount: &str) -> Result<u128, AmountError> {
	let trimmed = amount.trim();
	if trimmed.is_empty() {
		return Ok(0);
	}
	trimmed
		.parse::<u128>()
		.map_err(|_| AmountError(amount.to_string()))
}

/// Fee paid per unit of gas, kept as a reduced fraction so that
/// `price * gas_limit` gives back the fee exactly.
///
/// Renders as a plain decimal ("0.025") when the fraction terminates and as
/// `numerator/denominator` ("1/3") otherwise. Both forms parse back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GasPrice(Ratio<u128>);

impl GasPrice {
	/// `fee / gas_limit`, `None` for a zero gas limit.
	pub fn new(fee: u128, gas_limit: u64) -> Option<Self> {
		if gas_limit == 0 {
			return None;
		}
		Some(Self(Ratio::new(fee, u128::from(gas_limit))))
	}

	pub fn zero() -> Self {
		Self(Ratio::from_integer(0))
	}

	/// The reduced fraction.
	pub fn ratio(&self) -> Ratio<u128> {
		self.0
	}

	/// Exact decimal value, `None` when the fraction does not terminate
	/// within `Decimal` precision.
	pub fn to_decimal(&self) -> Option<Decimal> {
		let mut denom = *self.0.denom();
		let (mut twos, mut fives) = (0u32, 0u32);
		while denom % 2 == 0 {
			denom /= 2;
			twos += 1;
		}
		while denom % 5 == 0 {
			denom /= 5;
			fives += 1;
		}
		let scale = twos.max(fives);
		if denom != 1 || scale > MAX_DECIMAL_SCALE {
			return None;
		}

		let factor = 10u128.pow(scale) / *self.0.denom();
		let mantissa = self.0.numer().checked_mul(factor)?;
		let mantissa = i128::try_from(mantissa).ok()?;
		Decimal::try_from_i128_with_scale(mantissa, scale)
			.ok()
			.map(|value| value.normalize())
	}
}

impl fmt::Display for GasPrice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.to_decimal() {
			Some(value) => write!(f, "{}", value),
			None => write!(f, "{}/{}", self.0.numer(), self.0.denom()),
		}
	}
}

impl FromStr for GasPrice {
	type Err = GasPriceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || GasPriceError(s.to_string());
		let trimmed = s.trim();

		if let Some((numer, denom)) = trimmed.split_once('/') {
			let numer = numer.trim().parse::<u128>().map_err(|_| invalid())?;
			let denom = denom.trim().parse::<u128>().map_err(|_| invalid())?;
			if denom == 0 {
				return Err(invalid());
			}
			return Ok(Self(Ratio::new(numer, denom)));
		}

		let value = Decimal::from_str(trimmed).map_err(|_| invalid())?;
		let numer = u128::try_from(value.mantissa()).map_err(|_| invalid())?;
		Ok(Self(Ratio::new(numer, 10u128.pow(value.scale()))))
	}
}

impl Serialize for GasPrice {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for GasPrice {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}
