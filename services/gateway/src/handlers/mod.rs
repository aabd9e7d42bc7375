pub mod balance;
pub mod book;
pub mod health;
pub mod matching;
pub mod order;
