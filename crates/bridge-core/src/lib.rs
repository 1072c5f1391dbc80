//! Settlement engine for the bridge settler.
//!
//! For each swap direction a [`SettlementLoop`] polls the store for pending
//! intents and hands them to a [`SwapProcessor`], which builds, signs, records
//! and broadcasts the settlement transaction. A bounded [`SwapHistory`] shared
//! by both directions remembers recently signed settlements so that an intent
//! whose durable record lags behind is not broadcast twice.

use chrono::Utc;

pub mod engine;
pub mod error;
pub mod fees;
pub mod history;
pub mod processor;
pub mod worker;

pub use engine::{SettlementEngine, SettlementEngineBuilder};
pub use error::{CoreError, SettleError};
pub use history::{HistoryEntry, SwapHistory};
pub use processor::SwapProcessor;
pub use worker::{CycleReport, SettlementLoop};

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
	Utc::now().timestamp().max(0) as u64
}
