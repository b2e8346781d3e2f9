//! Cross-Exchange Arbitrage Bot
//!
//! Polls spot prices across several exchanges, detects buy-low/sell-high
//! spreads, optionally places the matching order pair, and records results
//! to a local SQLite ledger. A pooled-capital bookkeeping layer (member
//! shares, insurance reserve, trade approvals, strategy registry) sits on
//! top of the trading core.

pub mod config;
pub mod types;
pub mod errors;
pub mod exchange;
pub mod arbitrage;
pub mod storage;
pub mod pool;
pub mod bot;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{BotError, BotResult};
pub use types::*;
