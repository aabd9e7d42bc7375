//! Order book module
//!
//! Per-side price indexes (bid book, ask book, FIFO price levels), the
//! aggregated snapshot types, and the read-only `OrderBook` view.

pub mod price_level;
pub mod bid_book;
pub mod ask_book;
pub mod snapshot;
pub mod order_book;

pub use price_level::PriceLevel;
pub use bid_book::BidBook;
pub use ask_book::AskBook;
pub use snapshot::{aggregate_levels, BookSnapshot, PriceLevelView, DEFAULT_BOOK_DEPTH};
pub use order_book::OrderBook;
