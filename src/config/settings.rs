//! Bot configuration settings and environment variable handling

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

// Configuration constants
pub const MIN_PROFIT_FLOOR_PCT: Decimal = dec!(0.05);
pub const MIN_POSITION_SIZE_USD: Decimal = dec!(10);
pub const MAX_POSITION_SIZE_USD: Decimal = dec!(100000);
pub const DEFAULT_TAKER_FEE_PCT: Decimal = dec!(0.1);
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 5;
pub const MAX_CONCURRENT_TRADES_CAP: usize = 20;

/// Per-venue connection settings. Credentials come from
/// `{NAME}_API_KEY`, `{NAME}_API_SECRET` and `{NAME}_API_PASSPHRASE`.
#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_passphrase: Option<String>,
    pub taker_fee_pct: Decimal,
}

impl VenueConfig {
    fn from_env(name: &str) -> Self {
        let prefix = name.to_uppercase().replace('-', "_");
        Self {
            name: name.to_string(),
            base_url: env::var(format!("{prefix}_BASE_URL"))
                .unwrap_or_else(|_| format!("https://api.{name}.example")),
            api_key: env::var(format!("{prefix}_API_KEY")).ok(),
            api_secret: env::var(format!("{prefix}_API_SECRET")).ok(),
            api_passphrase: env::var(format!("{prefix}_API_PASSPHRASE")).ok(),
            taker_fee_pct: env::var(format!("{prefix}_TAKER_FEE_PCT"))
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(DEFAULT_TAKER_FEE_PCT),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Trading parameters
    pub trading_pairs: Vec<String>,
    pub min_profit_pct: Decimal,
    pub max_position_size_usd: Decimal,
    pub max_concurrent_trades: usize,
    pub scan_interval_secs: u64,
    pub max_runtime_secs: Option<u64>,
    // Risk parameters
    pub max_daily_loss_usd: Decimal,
    // Declared for operators but not consumed by the engine; see DESIGN.md.
    pub max_drawdown_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    // Venues and fee schedule
    pub venues: Vec<VenueConfig>,
    // Runtime surface
    pub paper_trading: bool,
    pub db_path: String,
}

impl Config {
    pub fn load() -> Self {
        let venue_names = env::var("EXCHANGES")
            .unwrap_or_else(|_| "binance,kraken,coinbase".to_string());
        let venues = venue_names
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(VenueConfig::from_env)
            .collect();

        Self {
            trading_pairs: env::var("TRADING_PAIRS")
                .unwrap_or_else(|_| "BTC/USD,ETH/USD".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            min_profit_pct: env::var("MIN_PROFIT_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(0.5))
                .max(MIN_PROFIT_FLOOR_PCT),
            max_position_size_usd: env::var("MAX_POSITION_SIZE_USD")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(1000))
                .max(MIN_POSITION_SIZE_USD)
                .min(MAX_POSITION_SIZE_USD),
            max_concurrent_trades: env::var("MAX_CONCURRENT_TRADES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3)
                .min(MAX_CONCURRENT_TRADES_CAP),
            scan_interval_secs: env::var("SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS)
                .max(1),
            max_runtime_secs: env::var("MAX_RUNTIME_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_daily_loss_usd: env::var("MAX_DAILY_LOSS_USD")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(100)),
            max_drawdown_pct: env::var("MAX_DRAWDOWN_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(10)),
            stop_loss_pct: env::var("STOP_LOSS_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(2)),
            take_profit_pct: env::var("TAKE_PROFIT_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(5)),
            venues,
            paper_trading: env::var("PAPER_TRADING")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            db_path: env::var("DB_PATH")
                .unwrap_or_else(|_| "arbitrage_bot.db".to_string()),
        }
    }

    /// Taker fee in percent for a venue, falling back to the default rate
    /// for venues missing from the schedule.
    pub fn taker_fee_pct(&self, exchange: &str) -> Decimal {
        self.venues
            .iter()
            .find(|v| v.name == exchange)
            .map(|v| v.taker_fee_pct)
            .unwrap_or(DEFAULT_TAKER_FEE_PCT)
    }
}

#[cfg(test)]
impl Config {
    /// Baseline config for unit tests; fields are overridden per test.
    pub fn test_default() -> Self {
        Self {
            trading_pairs: vec!["BTC/USD".into()],
            min_profit_pct: dec!(0.5),
            max_position_size_usd: dec!(1000),
            max_concurrent_trades: 3,
            scan_interval_secs: 5,
            max_runtime_secs: None,
            max_daily_loss_usd: dec!(100),
            max_drawdown_pct: dec!(10),
            stop_loss_pct: dec!(2),
            take_profit_pct: dec!(5),
            venues: Vec::new(),
            paper_trading: true,
            db_path: ":memory:".into(),
        }
    }
}
