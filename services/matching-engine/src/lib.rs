//! Matching Engine Service
//!
//! Order book and matching core for the trading venue. Orders live in an
//! injected Order Store; the engine selects the best bid and ask of a
//! pair under lock-or-skip exclusivity, prices the cross at the ask, and
//! commits the trade plus both order updates as one unit.
//!
//! **Key Invariants:**
//! - Price-time priority for candidate selection
//! - At most one trade per `attempt_match` call
//! - Contended candidates are skipped, never waited on
//! - A trade and its two order updates commit together or not at all
//! - Decimal-exact arithmetic, no floating point

pub mod book;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod matching;
pub mod outcome;
pub mod store;

pub use book::{BookSnapshot, OrderBook, PriceLevelView, DEFAULT_BOOK_DEPTH};
pub use engine::MatchEngine;
pub use error::EngineError;
pub use ledger::Ledger;
pub use outcome::{MatchOutcome, MatchResult};
pub use store::{MatchTransaction, MemoryStore, OrderStore, Selection, StoreError, WalletStore};
#[cfg(feature = "postgres")]
pub use store::PgStore;
