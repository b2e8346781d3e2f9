//! Market data primitives

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One observation of a venue's last-traded price. Ephemeral: quotes are
/// only ever used to derive an opportunity, never persisted on their own.
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub exchange_id: String,
    pub symbol: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}
