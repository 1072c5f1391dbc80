//! Serde helpers for configuration deserialization

use bridge_types::{parse_amount, U256};
use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
	Text(String),
	Number(u64),
}

/// Serializes a U256 as a decimal string and accepts decimal strings,
/// `0x`-prefixed hex strings or plain integers when deserializing.
pub mod u256_string {
	use super::*;

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		match RawAmount::deserialize(deserializer)? {
			RawAmount::Text(text) => parse_amount(&text).map_err(de::Error::custom),
			RawAmount::Number(n) => Ok(U256::from(n)),
		}
	}
}
