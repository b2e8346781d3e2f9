//! Core data types and structures

pub mod market;
pub mod arbitrage;
pub mod execution;
pub mod status;

pub use market::*;
pub use arbitrage::*;
pub use execution::*;
pub use status::*;
