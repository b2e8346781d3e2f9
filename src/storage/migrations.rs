//! Ledger schema

use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS opportunities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            opportunity_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            buy_exchange TEXT NOT NULL,
            buy_price TEXT NOT NULL,
            sell_exchange TEXT NOT NULL,
            sell_price TEXT NOT NULL,
            profit_percentage TEXT NOT NULL,
            detected_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trade_id TEXT NOT NULL UNIQUE,
            opportunity_id TEXT NOT NULL,
            buy_order_id TEXT NOT NULL,
            sell_order_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            buy_exchange TEXT NOT NULL,
            sell_exchange TEXT NOT NULL,
            amount TEXT NOT NULL,
            buy_price TEXT NOT NULL,
            sell_price TEXT NOT NULL,
            fees_paid TEXT NOT NULL,
            final_profit TEXT NOT NULL,
            status TEXT NOT NULL,
            executed_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS daily_summary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,
            total_trades INTEGER NOT NULL,
            total_profit TEXT NOT NULL,
            win_rate TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS error_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            error_type TEXT NOT NULL,
            message TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_opportunities_detected ON opportunities(detected_at);
        CREATE INDEX IF NOT EXISTS idx_trades_executed ON trades(executed_at);
        CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status);
        ",
    )
}
