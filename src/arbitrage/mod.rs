//! Opportunity scanning and trade execution

pub mod engine;

pub use engine::*;
