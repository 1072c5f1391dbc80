//! Amount parsing for values stored as strings.

use alloy_primitives::U256;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("Empty amount")]
	Empty,
	#[error("Invalid amount {0:?}")]
	Invalid(String),
}

/// Parses a decimal or `0x`-prefixed hex amount.
pub fn parse_amount(value: &str) -> Result<U256, AmountError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(AmountError::Empty);
	}
	U256::from_str(trimmed).map_err(|_| AmountError::Invalid(value.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_amount() {
		assert_eq!(parse_amount("100").unwrap(), U256::from(100u64));
		assert_eq!(parse_amount(" 0x64 ").unwrap(), U256::from(100u64));
		assert_eq!(
			parse_amount("1000000000000000000000000").unwrap(),
			U256::from(10u64).pow(U256::from(24u64))
		);

		assert_eq!(parse_amount(""), Err(AmountError::Empty));
		assert!(matches!(parse_amount("-5"), Err(AmountError::Invalid(_))));
		assert!(matches!(parse_amount("12abc"), Err(AmountError::Invalid(_))));
	}
}
