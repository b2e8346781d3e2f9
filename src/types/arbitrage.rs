//! Arbitrage opportunity types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A detected but not-yet-acted-upon price discrepancy between two venues.
/// Immutable once created; each scan pass supersedes the previous list
/// wholesale rather than mutating records in place.
#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageOpportunity {
    pub id: String,
    pub symbol: String,
    pub buy_exchange: String,
    pub buy_price: Decimal,
    pub sell_exchange: String,
    pub sell_price: Decimal,
    /// Raw pre-fee spread: (sell - buy) / buy * 100.
    pub profit_percentage: Decimal,
    pub detected_at: DateTime<Utc>,
}
