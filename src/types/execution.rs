//! Executed trade types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Both legs of a completed order placement. Always references exactly one
/// buy and one sell order on two distinct exchanges.
///
/// Trades are created `Pending` and are only advanced by an explicit
/// operator call; there is no automatic fill-confirmation step.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedTrade {
    pub id: String,
    pub opportunity_id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub symbol: String,
    pub buy_exchange: String,
    pub sell_exchange: String,
    pub amount: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub fees_paid: Decimal,
    pub final_profit: Decimal,
    pub status: TradeStatus,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeStatus {
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "pending"),
            TradeStatus::Completed => write!(f, "completed"),
            TradeStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TradeStatus::Pending),
            "completed" => Ok(TradeStatus::Completed),
            "failed" => Ok(TradeStatus::Failed),
            other => Err(format!("unknown trade status '{other}'")),
        }
    }
}

/// Fee-adjusted profit numbers for one opportunity at a given size.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitBreakdown {
    pub gross_profit: Decimal,
    pub total_fees: Decimal,
    pub net_profit: Decimal,
    pub roi_pct: Decimal,
}
