//! String formatting utilities.
//!
//! Shortens hashes and addresses for log fields, and accepts hex input with or
//! without a "0x" prefix.

const TRUNCATED_LEN: usize = 8;

/// Shortens an identifier for log output to its first eight characters
/// followed by "..". Counts characters, not bytes.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(TRUNCATED_LEN) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Strips a leading "0x" or "0X".
///
/// Cosmos explorers print transaction hashes without a prefix, but pasted
/// hashes often carry one.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
