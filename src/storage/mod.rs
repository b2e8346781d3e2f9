//! Persistent trade ledger

pub mod migrations;
pub mod ledger;

pub use ledger::*;
