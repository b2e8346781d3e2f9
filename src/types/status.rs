//! Operator status and reporting types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Running totals from the engine's in-memory trade list.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub completed_trades: usize,
    pub pending_trades: usize,
    pub total_profit: Decimal,
    pub daily_profit: Decimal,
    pub daily_loss: Decimal,
    pub average_profit_per_trade: Decimal,
    pub win_rate_pct: Decimal,
}

/// Per-day aggregate computed from the ledger (completed trades only).
#[derive(Debug, Clone, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub win_rate_pct: Decimal,
    pub total_profit: Decimal,
    pub average_profit: Decimal,
    pub worst_trade: Decimal,
    pub best_trade: Decimal,
}

impl DailyStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_trades: 0,
            winning_trades: 0,
            win_rate_pct: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            average_profit: Decimal::ZERO,
            worst_trade: Decimal::ZERO,
            best_trade: Decimal::ZERO,
        }
    }
}

/// Snapshot returned by the operator status query.
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub running: bool,
    pub scan_count: u64,
    pub last_scan: Option<DateTime<Utc>>,
    pub last_opportunity: Option<DateTime<Utc>>,
    pub active_opportunities: usize,
    pub performance: PerformanceSummary,
    pub daily: DailyStats,
}
