//! Types library for the trading venue
//!
//! This library provides the core type definitions shared by the matching
//! engine and the gateway, keeping arithmetic exact and identifiers
//! time-sortable.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, WalletId, UserId, PairId)
//! - `numeric`: Decimal-exact price and quantity types
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution types
//! - `wallet`: Per-user, per-currency holdings
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod wallet;
pub mod errors;
