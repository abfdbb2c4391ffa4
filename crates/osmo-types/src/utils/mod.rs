//! Utility functions for common conversions and formatting.
//!
//! This module provides helpers for amount parsing, exact gas prices, and
//! string formatting used throughout the client.

pub mod conversion;
pub mod formatting;

pub use conversion::{parse_amount, AmountError, GasPrice, GasPriceError};
pub use formatting::{truncate_id, without_0x_prefix};
