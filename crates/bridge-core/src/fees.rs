//! Swap fee calculation.

use bridge_types::U256;

pub use bridge_config::{FeeSchedule, SwapFeeConfig};

/// Fee settings applied by a bridge settling on the given end.
pub fn fee_for_endpoint(schedule: &FeeSchedule, is_source_endpoint: bool) -> &SwapFeeConfig {
	if is_source_endpoint {
		&schedule.source
	} else {
		&schedule.destination
	}
}

/// Amount delivered once the swap fee is deducted.
///
/// The fee is `floor(value * rate)` clamped to the configured minimum and, when
/// non-zero, maximum. A fee at least as large as the value leaves nothing.
pub fn calc_swapped_value(value: U256, fee: &SwapFeeConfig) -> U256 {
	if fee.rate.is_zero() {
		return value;
	}

	let mantissa = U256::from(fee.rate.mantissa().unsigned_abs());
	let denominator = U256::from(10u64).pow(U256::from(fee.rate.scale()));

	// value = q * d + r, so floor(value * m / d) = q * m + floor(r * m / d)
	let quotient = value / denominator;
	let remainder = value % denominator;
	let mut charged = quotient * mantissa + remainder * mantissa / denominator;

	if charged < fee.minimum {
		charged = fee.minimum;
	}
	if !fee.maximum.is_zero() && charged > fee.maximum {
		charged = fee.maximum;
	}

	value.saturating_sub(charged)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use std::str::FromStr;

	fn fee(rate: &str, minimum: u64, maximum: u64) -> SwapFeeConfig {
		SwapFeeConfig {
			rate: Decimal::from_str(rate).unwrap(),
			minimum: U256::from(minimum),
			maximum: U256::from(maximum),
		}
	}

	#[test]
	fn test_zero_rate_keeps_value() {
		assert_eq!(
			calc_swapped_value(U256::from(100u64), &fee("0", 50, 60)),
			U256::from(100u64)
		);
	}

	#[test]
	fn test_fee_is_floored_and_clamped() {
		// 0.1% of 123456 = 123.456
		assert_eq!(
			calc_swapped_value(U256::from(123_456u64), &fee("0.001", 0, 0)),
			U256::from(123_333u64)
		);
		// Raised to the minimum
		assert_eq!(
			calc_swapped_value(U256::from(1000u64), &fee("0.001", 10, 0)),
			U256::from(990u64)
		);
		// Capped at the maximum
		assert_eq!(
			calc_swapped_value(U256::from(1_000_000u64), &fee("0.01", 0, 500)),
			U256::from(999_500u64)
		);
	}

	#[test]
	fn test_fee_exceeding_value_leaves_nothing() {
		assert_eq!(
			calc_swapped_value(U256::from(5u64), &fee("0.5", 5, 0)),
			U256::ZERO
		);
		assert_eq!(
			calc_swapped_value(U256::from(3u64), &fee("0.1", 10, 0)),
			U256::ZERO
		);
	}

	#[test]
	fn test_large_values_do_not_overflow() {
		let value = U256::MAX;
		let swapped = calc_swapped_value(value, &fee("0.25", 0, 0));
		assert_eq!(swapped, value - value / U256::from(4u64));
	}

	#[test]
	fn test_fee_for_endpoint() {
		let schedule = FeeSchedule {
			source: fee("0.1", 0, 0),
			destination: fee("0.2", 0, 0),
		};
		assert_eq!(fee_for_endpoint(&schedule, true), &schedule.source);
		assert_eq!(fee_for_endpoint(&schedule, false), &schedule.destination);
	}
}
