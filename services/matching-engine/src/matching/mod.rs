//! Matching logic module
//!
//! Crossing rules and trade-term computation

pub mod crossing;
pub mod executor;

pub use crossing::can_match;
pub use executor::{Execution, MatchExecutor, OrderFill};
