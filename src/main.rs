//! Cross-Exchange Arbitrage Bot - Main Entry Point

use cex_arb_bot::*;
use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, warn};

use crate::bot::ArbitrageBot;
use crate::exchange::{MultiExchangeManager, PaperExchange, RestExchange};
use crate::storage::Ledger;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let _logging_guard = utils::setup_logging()?;
    utils::setup_output_directories()?;

    // Load configuration
    let config = CONFIG.clone();

    info!("💱 Cross-Exchange Arbitrage Bot v0.3.0");
    info!("📋 Configuration:");
    info!("   Venues: {:?}", config.venues.iter().map(|v| v.name.as_str()).collect::<Vec<_>>());
    info!("   Trading pairs: {:?}", config.trading_pairs);
    info!("   Min profit: {}%", config.min_profit_pct);
    info!("   Max position size: ${}", config.max_position_size_usd);
    info!("   Max concurrent trades: {}", config.max_concurrent_trades);
    info!("   Daily loss cap: ${}", config.max_daily_loss_usd);
    info!("   Scan interval: {}s", config.scan_interval_secs);
    info!("   Paper trading: {}", config.paper_trading);
    if config.paper_trading {
        info!("   ⚠️  PAPER MODE - No real funds at risk");
    }
    // Reserved knobs, shown for operators but not enforced by the engine.
    info!("   Max drawdown: {}% (reserved)", config.max_drawdown_pct);
    info!("   Stop loss: {}% / Take profit: {}% (reserved)", config.stop_loss_pct, config.take_profit_pct);

    if config.venues.len() < 2 {
        return Err(anyhow::anyhow!(
            "Need at least 2 venues to arbitrage, got {}",
            config.venues.len()
        ));
    }

    // Build the venue set
    let mut manager = MultiExchangeManager::new();
    if config.paper_trading {
        for (i, venue) in config.venues.iter().enumerate() {
            let seeds = seed_prices(&config.trading_pairs, i);
            manager.add(Box::new(PaperExchange::new(venue.name.clone(), seeds)));
        }
    } else {
        for venue in &config.venues {
            if venue.api_key.is_none() {
                warn!("Venue {} has no API key configured", venue.name);
            }
            manager.add(Box::new(RestExchange::new(venue)?));
        }
    }
    info!("✅ Initialized {} venues", manager.len());

    // Open the ledger
    let ledger = Ledger::open(&config.db_path)?;

    // Run the bot until shutdown or max runtime
    let mut bot = ArbitrageBot::new(Arc::new(manager), ledger, config);
    info!("\n🚀 Starting scan loop...\n");
    bot.run().await?;

    Ok(())
}

/// Seed per-venue paper prices. Venues get a small deterministic offset so
/// dry runs actually produce spreads.
fn seed_prices(pairs: &[String], venue_index: usize) -> Vec<(String, Decimal)> {
    let offset = dec!(1) + Decimal::new(venue_index as i64 * 20, 4); // +0.2% per venue
    pairs
        .iter()
        .map(|pair| {
            let base = match pair.split('/').next().unwrap_or_default() {
                "BTC" => dec!(65000),
                "ETH" => dec!(3200),
                "SOL" => dec!(150),
                _ => dec!(100),
            };
            (pair.clone(), base * offset)
        })
        .collect()
}
