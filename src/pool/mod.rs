//! Pooled-capital bookkeeping: shares, insurance, approvals, strategies

pub mod contract;
pub mod insurance;
pub mod validators;
pub mod registry;
pub mod orchestrator;

pub use contract::*;
pub use insurance::*;
pub use validators::*;
pub use registry::*;
pub use orchestrator::*;
