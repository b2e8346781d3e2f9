//! Bot orchestration: the scan/execute loop and the operator surface

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;
use tracing::{error, info, warn};

use crate::arbitrage::ArbitrageEngine;
use crate::config::Config;
use crate::exchange::MultiExchangeManager;
use crate::storage::Ledger;
use crate::types::{ArbitrageOpportunity, BotStatus};

pub struct ArbitrageBot {
    engine: ArbitrageEngine,
    ledger: Ledger,
    config: Config,
    is_running: bool,
    scan_count: u64,
    last_scan_time: Option<DateTime<Utc>>,
    last_opportunity_time: Option<DateTime<Utc>>,
}

impl ArbitrageBot {
    pub fn new(manager: Arc<MultiExchangeManager>, ledger: Ledger, config: Config) -> Self {
        info!("Initializing arbitrage bot...");
        Self {
            engine: ArbitrageEngine::new(manager, config.clone()),
            ledger,
            config,
            is_running: false,
            scan_count: 0,
            last_scan_time: None,
            last_opportunity_time: None,
        }
    }

    /// Poll-driven main loop: scan, persist, execute the best opportunity,
    /// sleep. Per-iteration errors are logged to the ledger and the loop
    /// keeps going with the same fixed delay.
    pub async fn run(&mut self) -> Result<()> {
        self.is_running = true;
        let start_time = Instant::now();
        let scan_interval = Duration::from_secs(self.config.scan_interval_secs);

        info!(
            "Starting bot loop (scan interval: {}s)",
            self.config.scan_interval_secs
        );

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C)...");
                let _ = shutdown_tx.send(());
            }
        });

        let mut interval = time::interval(scan_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(max_runtime) = self.config.max_runtime_secs {
                        if start_time.elapsed().as_secs() > max_runtime {
                            info!("Max runtime reached");
                            break;
                        }
                    }
                    if let Err(e) = self.scan_cycle().await {
                        error!("Error in bot loop: {}", e);
                        if let Err(e) = self.ledger.log_error("BotLoopError", &e.to_string()) {
                            error!("Failed to record loop error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received, exiting main loop...");
                    break;
                }
            }
        }

        self.stop();
        Ok(())
    }

    /// One scan pass: detect, persist every opportunity, execute the best.
    pub async fn scan_cycle(&mut self) -> Result<()> {
        self.last_scan_time = Some(Utc::now());
        self.scan_count += 1;

        let symbols = self.config.trading_pairs.clone();
        let opportunities = self
            .engine
            .scan_for_opportunities(&symbols, Some(self.config.min_profit_pct))
            .await;

        info!(
            "Scan #{}: Found {} opportunities",
            self.scan_count,
            opportunities.len()
        );

        for opp in &opportunities {
            crate::utils::print_opportunity(opp);
            if let Err(e) = self.ledger.log_opportunity(opp) {
                error!("Failed to persist opportunity {}: {}", opp.id, e);
                self.ledger
                    .log_error("LedgerError", &e.to_string())
                    .ok();
            }
            self.last_opportunity_time = Some(Utc::now());
        }

        if !opportunities.is_empty() {
            self.execute_best_opportunity(&opportunities).await;
        }

        Ok(())
    }

    /// Execute the highest-spread opportunity of the batch.
    async fn execute_best_opportunity(&mut self, opportunities: &[ArbitrageOpportunity]) -> bool {
        let Some(best) = opportunities
            .iter()
            .max_by(|a, b| a.profit_percentage.cmp(&b.profit_percentage))
        else {
            return false;
        };

        info!(
            "Executing best opportunity: {} ({:.2}% profit)",
            best.symbol, best.profit_percentage
        );

        match self.engine.execute(best, None).await {
            Some(trade) => {
                if let Err(e) = self.ledger.log_trade(&trade) {
                    error!("Failed to persist trade {}: {}", trade.id, e);
                    self.ledger
                        .log_error("LedgerError", &e.to_string())
                        .ok();
                }
                crate::utils::print_trade(&trade);
                true
            }
            None => {
                warn!("Trade execution failed");
                if let Err(e) = self
                    .ledger
                    .log_error("ExecutionError", &format!("no trade for {}", best.id))
                {
                    error!("Failed to record execution error: {}", e);
                }
                false
            }
        }
    }

    pub fn status(&self) -> BotStatus {
        let daily = self
            .ledger
            .daily_stats(None)
            .unwrap_or_else(|e| {
                error!("Failed to read daily stats: {}", e);
                crate::types::DailyStats::empty(Utc::now().date_naive())
            });

        BotStatus {
            running: self.is_running,
            scan_count: self.scan_count,
            last_scan: self.last_scan_time,
            last_opportunity: self.last_opportunity_time,
            active_opportunities: self.engine.active_opportunities().len(),
            performance: self.engine.performance_summary(),
            daily,
        }
    }

    pub fn engine(&self) -> &ArbitrageEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ArbitrageEngine {
        &mut self.engine
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stop(&mut self) {
        info!("Stopping bot...");
        self.is_running = false;

        match self.ledger.daily_stats(None) {
            Ok(stats) => {
                if let Err(e) = self.ledger.record_daily_summary(&stats) {
                    error!("Failed to record daily summary: {}", e);
                }
            }
            Err(e) => error!("Failed to compute daily stats: {}", e),
        }

        crate::utils::print_bot_status(&self.status());
        info!("Bot stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ExchangeClient;
    use crate::types::{OrderSide, TradeStatus};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    struct FixedExchange {
        name: String,
        price: Decimal,
    }

    #[async_trait]
    impl ExchangeClient for FixedExchange {
        fn name(&self) -> &str {
            &self.name
        }

        async fn last_price(&self, _symbol: &str) -> Option<Decimal> {
            Some(self.price)
        }

        async fn place_order(
            &self,
            _symbol: &str,
            side: OrderSide,
            _amount: Decimal,
            _limit_price: Option<Decimal>,
        ) -> Option<String> {
            Some(format!("{}-{}", self.name, side))
        }

        async fn cancel_order(&self, _order_id: &str, _symbol: &str) -> bool {
            true
        }
    }

    fn bot_with_spread() -> (TempDir, ArbitrageBot) {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(dir.path().join("bot.db")).unwrap();

        let mut manager = MultiExchangeManager::new();
        for (name, price) in [("a", dec!(100)), ("b", dec!(102)), ("c", dec!(98))] {
            manager.add(Box::new(FixedExchange {
                name: name.into(),
                price,
            }));
        }

        let mut config = Config::test_default();
        config.min_profit_pct = dec!(1.0);
        (dir, ArbitrageBot::new(Arc::new(manager), ledger, config))
    }

    #[tokio::test]
    async fn scan_cycle_persists_opportunity_and_trade() {
        let (_dir, mut bot) = bot_with_spread();

        bot.scan_cycle().await.unwrap();

        let history = bot.ledger().trade_history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].buy_exchange, "c");
        assert_eq!(history[0].sell_exchange, "b");
        assert_eq!(history[0].status, TradeStatus::Pending);

        let status = bot.status();
        assert_eq!(status.scan_count, 1);
        assert_eq!(status.active_opportunities, 1);
        assert_eq!(status.performance.total_trades, 1);
        assert_eq!(status.performance.pending_trades, 1);
        assert!(status.last_scan.is_some());
        assert!(status.last_opportunity.is_some());
    }

    #[tokio::test]
    async fn high_threshold_scans_cleanly_with_no_action() {
        let (_dir, mut bot) = bot_with_spread();
        bot.config.min_profit_pct = dec!(5.0);

        bot.scan_cycle().await.unwrap();

        assert!(bot.ledger().trade_history(10).unwrap().is_empty());
        let status = bot.status();
        assert_eq!(status.active_opportunities, 0);
        assert!(status.last_opportunity.is_none());
    }

    #[tokio::test]
    async fn stop_records_daily_summary_and_clears_running() {
        let (_dir, mut bot) = bot_with_spread();
        bot.is_running = true;
        bot.stop();
        assert!(!bot.status().running);
    }
}
