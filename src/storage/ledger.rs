//! Append-only trade ledger on SQLite
//!
//! Records detected opportunities, executed trades, daily aggregates and
//! error events. Amounts are stored as decimal strings so nothing is lost
//! to float round-tripping.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::info;

use crate::errors::{BotError, BotResult};
use crate::types::{ArbitrageOpportunity, DailyStats, ExecutedTrade, TradeStatus};

use super::migrations::run_migrations;

pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn open(path: impl AsRef<Path>) -> BotResult<Self> {
        let conn = Connection::open(path).map_err(|e| BotError::Ledger {
            context: "opening ledger".into(),
            source: e,
        })?;
        run_migrations(&conn).map_err(|e| BotError::Ledger {
            context: "running migrations".into(),
            source: e,
        })?;
        info!("Ledger tables initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        context: &str,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> BotResult<T> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn).map_err(|e| BotError::Ledger {
            context: context.to_string(),
            source: e,
        })
    }

    pub fn log_opportunity(&self, opp: &ArbitrageOpportunity) -> BotResult<i64> {
        self.with_conn("logging opportunity", |conn| {
            conn.execute(
                "INSERT INTO opportunities
                 (opportunity_id, symbol, buy_exchange, buy_price, sell_exchange, sell_price, profit_percentage, detected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    opp.id,
                    opp.symbol,
                    opp.buy_exchange,
                    opp.buy_price.to_string(),
                    opp.sell_exchange,
                    opp.sell_price.to_string(),
                    opp.profit_percentage.to_string(),
                    opp.detected_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn log_trade(&self, trade: &ExecutedTrade) -> BotResult<i64> {
        self.with_conn("logging trade", |conn| {
            conn.execute(
                "INSERT INTO trades
                 (trade_id, opportunity_id, buy_order_id, sell_order_id, symbol, buy_exchange, sell_exchange,
                  amount, buy_price, sell_price, fees_paid, final_profit, status, executed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    trade.id,
                    trade.opportunity_id,
                    trade.buy_order_id,
                    trade.sell_order_id,
                    trade.symbol,
                    trade.buy_exchange,
                    trade.sell_exchange,
                    trade.amount.to_string(),
                    trade.buy_price.to_string(),
                    trade.sell_price.to_string(),
                    trade.fees_paid.to_string(),
                    trade.final_profit.to_string(),
                    trade.status.to_string(),
                    trade.executed_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn update_trade_status(&self, trade_id: &str, status: TradeStatus) -> BotResult<bool> {
        self.with_conn("updating trade status", |conn| {
            let rows = conn.execute(
                "UPDATE trades SET status = ?1 WHERE trade_id = ?2",
                params![status.to_string(), trade_id],
            )?;
            Ok(rows > 0)
        })
    }

    /// Most-recent-first trade history, bounded by `limit`.
    pub fn trade_history(&self, limit: usize) -> BotResult<Vec<ExecutedTrade>> {
        self.with_conn("fetching trade history", |conn| {
            let mut stmt = conn.prepare(
                "SELECT trade_id, opportunity_id, buy_order_id, sell_order_id, symbol,
                        buy_exchange, sell_exchange, amount, buy_price, sell_price,
                        fees_paid, final_profit, status, executed_at
                 FROM trades ORDER BY executed_at DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], row_to_trade)?;
            rows.collect()
        })
    }

    /// Aggregate statistics for one calendar day, completed trades only.
    pub fn daily_stats(&self, date: Option<NaiveDate>) -> BotResult<DailyStats> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let start = format!("{date}T00:00:00");
        let end = format!("{date}T23:59:59.999999999");

        self.with_conn("fetching daily stats", |conn| {
            let row = conn
                .query_row(
                    "SELECT COUNT(*),
                            COALESCE(SUM(CASE WHEN CAST(final_profit AS REAL) > 0 THEN 1 ELSE 0 END), 0),
                            COALESCE(SUM(CAST(final_profit AS REAL)), 0),
                            COALESCE(MIN(CAST(final_profit AS REAL)), 0),
                            COALESCE(MAX(CAST(final_profit AS REAL)), 0)
                     FROM trades
                     WHERE executed_at >= ?1 AND executed_at <= ?2 AND status = 'completed'",
                    params![start, end],
                    |row| {
                        Ok((
                            row.get::<_, u32>(0)?,
                            row.get::<_, u32>(1)?,
                            row.get::<_, f64>(2)?,
                            row.get::<_, f64>(3)?,
                            row.get::<_, f64>(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((total, winning, profit, worst, best)) = row else {
                return Ok(DailyStats::empty(date));
            };
            if total == 0 {
                return Ok(DailyStats::empty(date));
            }

            let total_profit = Decimal::from_f64_retain(profit).unwrap_or_default();
            Ok(DailyStats {
                date,
                total_trades: total,
                winning_trades: winning,
                win_rate_pct: Decimal::from(winning) / Decimal::from(total) * dec!(100),
                total_profit,
                average_profit: total_profit / Decimal::from(total),
                worst_trade: Decimal::from_f64_retain(worst).unwrap_or_default(),
                best_trade: Decimal::from_f64_retain(best).unwrap_or_default(),
            })
        })
    }

    /// Upsert one day's aggregate row, written at shutdown.
    pub fn record_daily_summary(&self, stats: &DailyStats) -> BotResult<()> {
        self.with_conn("recording daily summary", |conn| {
            conn.execute(
                "INSERT INTO daily_summary (date, total_trades, total_profit, win_rate)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(date) DO UPDATE SET
                     total_trades = excluded.total_trades,
                     total_profit = excluded.total_profit,
                     win_rate = excluded.win_rate",
                params![
                    stats.date.to_string(),
                    stats.total_trades,
                    stats.total_profit.to_string(),
                    stats.win_rate_pct.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn log_error(&self, error_type: &str, message: &str) -> BotResult<()> {
        self.with_conn("logging error event", |conn| {
            conn.execute(
                "INSERT INTO error_log (error_type, message, timestamp)
                 VALUES (?1, ?2, ?3)",
                params![error_type, message, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn error_count(&self) -> BotResult<u64> {
        self.with_conn("counting error events", |conn| {
            conn.query_row("SELECT COUNT(*) FROM error_log", [], |row| row.get(0))
        })
    }
}

fn row_to_trade(row: &rusqlite::Row) -> Result<ExecutedTrade, rusqlite::Error> {
    let status: String = row.get(12)?;
    let executed_at: String = row.get(13)?;
    Ok(ExecutedTrade {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        buy_order_id: row.get(2)?,
        sell_order_id: row.get(3)?,
        symbol: row.get(4)?,
        buy_exchange: row.get(5)?,
        sell_exchange: row.get(6)?,
        amount: decimal_column(row, 7)?,
        buy_price: decimal_column(row, 8)?,
        sell_price: decimal_column(row, 9)?,
        fees_paid: decimal_column(row, 10)?,
        final_profit: decimal_column(row, 11)?,
        status: status
            .parse()
            .unwrap_or(TradeStatus::Pending),
        executed_at: DateTime::parse_from_rfc3339(&executed_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn decimal_column(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("bad decimal '{text}'").into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn temp_ledger() -> (TempDir, Ledger) {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(dir.path().join("test.db")).unwrap();
        (dir, ledger)
    }

    fn trade(id: &str, profit: Decimal, executed_at: DateTime<Utc>) -> ExecutedTrade {
        ExecutedTrade {
            id: id.to_string(),
            opportunity_id: "opp-1".into(),
            buy_order_id: "b-1".into(),
            sell_order_id: "s-1".into(),
            symbol: "BTC/USD".into(),
            buy_exchange: "kraken".into(),
            sell_exchange: "binance".into(),
            amount: dec!(0.5),
            buy_price: dec!(100),
            sell_price: dec!(102),
            fees_paid: dec!(0.202),
            final_profit: profit,
            status: TradeStatus::Pending,
            executed_at,
        }
    }

    #[test]
    fn opportunity_and_trade_rows_round_trip() {
        let (_dir, ledger) = temp_ledger();

        let opp = ArbitrageOpportunity {
            id: "opp-1".into(),
            symbol: "BTC/USD".into(),
            buy_exchange: "kraken".into(),
            buy_price: dec!(98),
            sell_exchange: "binance".into(),
            sell_price: dec!(102),
            profit_percentage: dec!(4.08),
            detected_at: Utc::now(),
        };
        assert!(ledger.log_opportunity(&opp).unwrap() > 0);

        ledger.log_trade(&trade("t-1", dec!(1.798), Utc::now())).unwrap();
        let history = ledger.trade_history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "t-1");
        assert_eq!(history[0].final_profit, dec!(1.798));
        assert_eq!(history[0].amount, dec!(0.5));
        assert_eq!(history[0].status, TradeStatus::Pending);
    }

    #[test]
    fn history_is_most_recent_first_and_bounded() {
        let (_dir, ledger) = temp_ledger();
        let base = Utc.with_ymd_and_hms(2026, 8, 30, 10, 0, 0).unwrap();
        for i in 0..5i64 {
            let at = base + chrono::Duration::minutes(i);
            ledger.log_trade(&trade(&format!("t-{i}"), dec!(1), at)).unwrap();
        }

        let history = ledger.trade_history(3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, "t-4");
        assert_eq!(history[2].id, "t-2");
    }

    #[test]
    fn daily_stats_only_counts_completed_trades_in_window() {
        let (_dir, ledger) = temp_ledger();
        let day = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();

        ledger.log_trade(&trade("t-win", dec!(2), day)).unwrap();
        ledger.log_trade(&trade("t-loss", dec!(-1), day)).unwrap();
        ledger.log_trade(&trade("t-pending", dec!(9), day)).unwrap();
        ledger
            .log_trade(&trade("t-other-day", dec!(9), day - chrono::Duration::days(1)))
            .unwrap();

        assert!(ledger.update_trade_status("t-win", TradeStatus::Completed).unwrap());
        assert!(ledger.update_trade_status("t-loss", TradeStatus::Completed).unwrap());
        assert!(!ledger.update_trade_status("missing", TradeStatus::Completed).unwrap());

        let stats = ledger.daily_stats(Some(day.date_naive())).unwrap();
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.win_rate_pct, dec!(50));
        assert_eq!(stats.total_profit, dec!(1));
        assert_eq!(stats.best_trade, dec!(2));
        assert_eq!(stats.worst_trade, dec!(-1));
    }

    #[test]
    fn empty_day_reports_zeroed_stats() {
        let (_dir, ledger) = temp_ledger();
        let stats = ledger.daily_stats(None).unwrap();
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate_pct, Decimal::ZERO);
    }

    #[test]
    fn daily_summary_upserts_on_same_date() {
        let (_dir, ledger) = temp_ledger();
        let mut stats = DailyStats::empty(Utc::now().date_naive());
        stats.total_trades = 3;
        stats.total_profit = dec!(4.5);
        ledger.record_daily_summary(&stats).unwrap();
        stats.total_trades = 4;
        ledger.record_daily_summary(&stats).unwrap();
    }

    #[test]
    fn error_events_append() {
        let (_dir, ledger) = temp_ledger();
        ledger.log_error("ScanError", "venue timeout").unwrap();
        ledger.log_error("ExecutionError", "sell leg failed").unwrap();
        assert_eq!(ledger.error_count().unwrap(), 2);
    }
}
