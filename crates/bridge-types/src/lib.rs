//! Shared types for the bridge settlement system.
//!
//! This crate defines the swap records persisted by the store, the transaction
//! types exchanged with chain bridges, and amount parsing helpers used across
//! the workspace.

pub mod amount;
pub mod chain;
pub mod swap;

pub use alloy_primitives::U256;
pub use amount::*;
pub use chain::*;
pub use swap::*;
