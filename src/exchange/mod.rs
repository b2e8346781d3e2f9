//! Exchange connectivity: per-venue clients and the aggregator

pub mod client;
pub mod rest;
pub mod paper;
pub mod manager;

pub use client::*;
pub use rest::*;
pub use paper::*;
pub use manager::*;
