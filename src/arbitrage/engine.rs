//! Arbitrage detection and execution engine

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::exchange::MultiExchangeManager;
use crate::types::{
    ArbitrageOpportunity, ExecutedTrade, OrderSide, PerformanceSummary, ProfitBreakdown,
    TradeStatus,
};

/// Owns all mutable trading state: the last scan's opportunities, the
/// trade list, and the daily profit/loss accumulators. The accumulators
/// reset only through [`ArbitrageEngine::start_new_trading_day`]; there is
/// no implicit wall-clock rollover.
pub struct ArbitrageEngine {
    manager: Arc<MultiExchangeManager>,
    config: Config,
    active_opportunities: Vec<ArbitrageOpportunity>,
    trades: Vec<ExecutedTrade>,
    daily_profit: Decimal,
    daily_loss: Decimal,
}

impl ArbitrageEngine {
    pub fn new(manager: Arc<MultiExchangeManager>, config: Config) -> Self {
        Self {
            manager,
            config,
            active_opportunities: Vec::new(),
            trades: Vec::new(),
            daily_profit: Decimal::ZERO,
            daily_loss: Decimal::ZERO,
        }
    }

    /// Scan every symbol through the aggregator. Result order follows the
    /// input symbol order; the previous opportunity list is replaced
    /// wholesale.
    pub async fn scan_for_opportunities(
        &mut self,
        symbols: &[String],
        min_profit_pct: Option<Decimal>,
    ) -> Vec<ArbitrageOpportunity> {
        let min_profit = min_profit_pct.unwrap_or(self.config.min_profit_pct);
        let mut opportunities = Vec::new();

        for symbol in symbols {
            if let Some(opp) = self.manager.find_best_spread(symbol, min_profit).await {
                info!(
                    "Opportunity found: Buy {} on {} at ${}, Sell on {} at ${} ({:.2}% profit)",
                    opp.symbol,
                    opp.buy_exchange,
                    opp.buy_price,
                    opp.sell_exchange,
                    opp.sell_price,
                    opp.profit_percentage
                );
                opportunities.push(opp);
            }
        }

        self.active_opportunities = opportunities.clone();
        opportunities
    }

    /// Fee-adjusted profit for trading `amount` units of the opportunity:
    /// `net = A*sell*(1-sf) - A*buy*(1+bf)` with per-venue taker rates.
    pub fn profit_breakdown(
        &self,
        opportunity: &ArbitrageOpportunity,
        amount: Decimal,
    ) -> ProfitBreakdown {
        let buy_fee = self.config.taker_fee_pct(&opportunity.buy_exchange) / dec!(100);
        let sell_fee = self.config.taker_fee_pct(&opportunity.sell_exchange) / dec!(100);

        let buy_notional = amount * opportunity.buy_price;
        let sell_notional = amount * opportunity.sell_price;

        let buy_cost = buy_notional * (dec!(1) + buy_fee);
        let sell_revenue = sell_notional * (dec!(1) - sell_fee);

        let net_profit = sell_revenue - buy_cost;
        let total_fees = buy_notional * buy_fee + sell_notional * sell_fee;
        let gross_profit = sell_notional - buy_notional;
        let roi_pct = if buy_cost > Decimal::ZERO {
            net_profit / buy_cost * dec!(100)
        } else {
            Decimal::ZERO
        };

        ProfitBreakdown {
            gross_profit,
            total_fees,
            net_profit,
            roi_pct,
        }
    }

    /// Execute both legs of an opportunity. Risk-gate rejections and leg
    /// failures all surface as `None`; the gates place no orders at all.
    pub async fn execute(
        &mut self,
        opportunity: &ArbitrageOpportunity,
        amount: Option<Decimal>,
    ) -> Option<ExecutedTrade> {
        let amount =
            amount.unwrap_or(self.config.max_position_size_usd / opportunity.buy_price);

        if self.daily_loss >= self.config.max_daily_loss_usd {
            warn!(
                "Daily loss limit reached (${} >= ${}). Not executing trade.",
                self.daily_loss, self.config.max_daily_loss_usd
            );
            return None;
        }

        if self.pending_trade_count() >= self.config.max_concurrent_trades {
            warn!(
                "Max concurrent trades reached ({}).",
                self.config.max_concurrent_trades
            );
            return None;
        }

        info!(
            "Executing arbitrage: Buy {} on {}, Sell on {}",
            opportunity.symbol, opportunity.buy_exchange, opportunity.sell_exchange
        );

        let Some(buy_client) = self.manager.get(&opportunity.buy_exchange) else {
            error!("Buy venue {} is not registered", opportunity.buy_exchange);
            return None;
        };
        let Some(sell_client) = self.manager.get(&opportunity.sell_exchange) else {
            error!("Sell venue {} is not registered", opportunity.sell_exchange);
            return None;
        };

        let Some(buy_order_id) = buy_client
            .place_order(
                &opportunity.symbol,
                OrderSide::Buy,
                amount,
                Some(opportunity.buy_price),
            )
            .await
        else {
            error!("Buy order failed on {}", opportunity.buy_exchange);
            return None;
        };

        let Some(sell_order_id) = sell_client
            .place_order(
                &opportunity.symbol,
                OrderSide::Sell,
                amount,
                Some(opportunity.sell_price),
            )
            .await
        else {
            // Compensate the filled buy leg with a single best-effort cancel.
            if !buy_client
                .cancel_order(&buy_order_id, &opportunity.symbol)
                .await
            {
                error!(
                    "Failed to cancel buy order {} on {} after sell leg failure",
                    buy_order_id, opportunity.buy_exchange
                );
            }
            error!("Sell order failed, cancelled buy order");
            return None;
        };

        let breakdown = self.profit_breakdown(opportunity, amount);

        let trade = ExecutedTrade {
            id: uuid::Uuid::new_v4().to_string(),
            opportunity_id: opportunity.id.clone(),
            buy_order_id,
            sell_order_id,
            symbol: opportunity.symbol.clone(),
            buy_exchange: opportunity.buy_exchange.clone(),
            sell_exchange: opportunity.sell_exchange.clone(),
            amount,
            buy_price: opportunity.buy_price,
            sell_price: opportunity.sell_price,
            fees_paid: breakdown.total_fees,
            final_profit: breakdown.net_profit,
            status: TradeStatus::Pending,
            executed_at: Utc::now(),
        };

        if trade.final_profit > Decimal::ZERO {
            self.daily_profit += trade.final_profit;
        } else {
            self.daily_loss += trade.final_profit.abs();
        }

        info!(
            "Trade executed. Net profit: ${:.2}, ROI: {:.2}%",
            trade.final_profit, breakdown.roi_pct
        );

        self.trades.push(trade.clone());
        Some(trade)
    }

    /// Advance a trade out of `Pending`. Fill confirmation is not polled
    /// anywhere, so this is the only path that moves a status.
    pub fn mark_trade(&mut self, trade_id: &str, status: TradeStatus) -> bool {
        match self.trades.iter_mut().find(|t| t.id == trade_id) {
            Some(trade) => {
                trade.status = status;
                true
            }
            None => {
                warn!("Trade {} not found", trade_id);
                false
            }
        }
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        let completed: Vec<&ExecutedTrade> = self
            .trades
            .iter()
            .filter(|t| t.status == TradeStatus::Completed)
            .collect();
        let total_profit: Decimal = completed.iter().map(|t| t.final_profit).sum();
        let winners = completed
            .iter()
            .filter(|t| t.final_profit > Decimal::ZERO)
            .count();

        let (average, win_rate) = if completed.is_empty() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let n = Decimal::from(completed.len());
            (total_profit / n, Decimal::from(winners) / n * dec!(100))
        };

        PerformanceSummary {
            total_trades: self.trades.len(),
            completed_trades: completed.len(),
            pending_trades: self.pending_trade_count(),
            total_profit,
            daily_profit: self.daily_profit,
            daily_loss: self.daily_loss,
            average_profit_per_trade: average,
            win_rate_pct: win_rate,
        }
    }

    /// Explicit new-day reset for the running accumulators.
    pub fn start_new_trading_day(&mut self) {
        info!(
            "Starting new trading day (previous: +${} / -${})",
            self.daily_profit, self.daily_loss
        );
        self.daily_profit = Decimal::ZERO;
        self.daily_loss = Decimal::ZERO;
    }

    pub fn active_opportunities(&self) -> &[ArbitrageOpportunity] {
        &self.active_opportunities
    }

    pub fn trades(&self) -> &[ExecutedTrade] {
        &self.trades
    }

    pub fn daily_profit(&self) -> Decimal {
        self.daily_profit
    }

    pub fn daily_loss(&self) -> Decimal {
        self.daily_loss
    }

    fn pending_trade_count(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| t.status == TradeStatus::Pending)
            .count()
    }

    #[cfg(test)]
    pub(crate) fn force_daily_loss(&mut self, loss: Decimal) {
        self.daily_loss = loss;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueConfig;
    use crate::exchange::ExchangeClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable venue that counts remote calls.
    struct ScriptedExchange {
        name: String,
        price: Option<Decimal>,
        fill_orders: bool,
        price_calls: AtomicUsize,
        order_calls: AtomicUsize,
        cancel_calls: AtomicUsize,
    }

    impl ScriptedExchange {
        fn new(name: &str, price: Decimal) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                price: Some(price),
                fill_orders: true,
                price_calls: AtomicUsize::new(0),
                order_calls: AtomicUsize::new(0),
                cancel_calls: AtomicUsize::new(0),
            })
        }

        fn failing_orders(name: &str, price: Decimal) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                price: Some(price),
                fill_orders: false,
                price_calls: AtomicUsize::new(0),
                order_calls: AtomicUsize::new(0),
                cancel_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExchangeClient for Arc<ScriptedExchange> {
        fn name(&self) -> &str {
            &self.name
        }

        async fn last_price(&self, _symbol: &str) -> Option<Decimal> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            self.price
        }

        async fn place_order(
            &self,
            _symbol: &str,
            side: OrderSide,
            _amount: Decimal,
            _limit_price: Option<Decimal>,
        ) -> Option<String> {
            self.order_calls.fetch_add(1, Ordering::SeqCst);
            if self.fill_orders {
                Some(format!("{}-{}", self.name, side))
            } else {
                None
            }
        }

        async fn cancel_order(&self, _order_id: &str, _symbol: &str) -> bool {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn test_config() -> Config {
        let mut config = Config::test_default();
        for name in ["cheap", "dear"] {
            config.venues.push(VenueConfig {
                name: name.into(),
                base_url: "http://localhost".into(),
                api_key: None,
                api_secret: None,
                api_passphrase: None,
                taker_fee_pct: dec!(0.1),
            });
        }
        config
    }

    fn two_venue_setup(
        buy: Arc<ScriptedExchange>,
        sell: Arc<ScriptedExchange>,
        config: Config,
    ) -> ArbitrageEngine {
        let mut manager = MultiExchangeManager::new();
        manager.add(Box::new(buy));
        manager.add(Box::new(sell));
        ArbitrageEngine::new(Arc::new(manager), config)
    }

    fn opportunity() -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            id: "opp-1".into(),
            symbol: "BTC/USD".into(),
            buy_exchange: "cheap".into(),
            buy_price: dec!(100),
            sell_exchange: "dear".into(),
            sell_price: dec!(102),
            profit_percentage: dec!(2),
            detected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn scan_orders_results_by_input_symbol_order() {
        let cheap = ScriptedExchange::new("cheap", dec!(98));
        let dear = ScriptedExchange::new("dear", dec!(102));
        let mut engine = two_venue_setup(cheap, dear, test_config());

        let symbols = vec!["BTC/USD".to_string(), "ETH/USD".to_string()];
        let opps = engine.scan_for_opportunities(&symbols, Some(dec!(1.0))).await;

        assert_eq!(opps.len(), 2);
        assert_eq!(opps[0].symbol, "BTC/USD");
        assert_eq!(opps[1].symbol, "ETH/USD");
        assert_eq!(engine.active_opportunities().len(), 2);

        // Next scan replaces the list wholesale.
        let opps = engine.scan_for_opportunities(&symbols[..1], Some(dec!(1.0))).await;
        assert_eq!(opps.len(), 1);
        assert_eq!(engine.active_opportunities().len(), 1);
    }

    #[tokio::test]
    async fn net_profit_matches_fee_formula_exactly() {
        let engine = two_venue_setup(
            ScriptedExchange::new("cheap", dec!(100)),
            ScriptedExchange::new("dear", dec!(102)),
            test_config(),
        );

        // amount=1, buy=100 @ 0.1%, sell=102 @ 0.1%
        let breakdown = engine.profit_breakdown(&opportunity(), dec!(1));
        assert_eq!(breakdown.net_profit, dec!(1.798));
        assert_eq!(breakdown.total_fees, dec!(0.202));
        assert_eq!(breakdown.gross_profit, dec!(2));
    }

    #[tokio::test]
    async fn zero_fees_reduce_net_profit_to_naive_spread() {
        let mut config = test_config();
        for venue in &mut config.venues {
            venue.taker_fee_pct = Decimal::ZERO;
        }
        let engine = two_venue_setup(
            ScriptedExchange::new("cheap", dec!(100)),
            ScriptedExchange::new("dear", dec!(102)),
            config,
        );

        let breakdown = engine.profit_breakdown(&opportunity(), dec!(3));
        assert_eq!(breakdown.net_profit, dec!(6));
        assert_eq!(breakdown.net_profit, breakdown.gross_profit);
        assert_eq!(breakdown.total_fees, Decimal::ZERO);
    }

    #[tokio::test]
    async fn daily_loss_cap_refuses_without_remote_calls() {
        let cheap = ScriptedExchange::new("cheap", dec!(100));
        let dear = ScriptedExchange::new("dear", dec!(102));
        let mut engine = two_venue_setup(cheap.clone(), dear.clone(), test_config());
        engine.force_daily_loss(dec!(100));

        assert!(engine.execute(&opportunity(), None).await.is_none());
        assert_eq!(cheap.order_calls.load(Ordering::SeqCst), 0);
        assert_eq!(dear.order_calls.load(Ordering::SeqCst), 0);
        assert!(engine.trades().is_empty());
    }

    #[tokio::test]
    async fn concurrent_trade_cap_refuses_without_remote_calls() {
        let cheap = ScriptedExchange::new("cheap", dec!(100));
        let dear = ScriptedExchange::new("dear", dec!(102));
        let mut config = test_config();
        config.max_concurrent_trades = 2;
        let mut engine = two_venue_setup(cheap.clone(), dear.clone(), config);

        for _ in 0..2 {
            assert!(engine.execute(&opportunity(), Some(dec!(1))).await.is_some());
        }
        let calls_before = cheap.order_calls.load(Ordering::SeqCst);

        assert!(engine.execute(&opportunity(), Some(dec!(1))).await.is_none());
        assert_eq!(cheap.order_calls.load(Ordering::SeqCst), calls_before);
        assert_eq!(engine.trades().len(), 2);
    }

    #[tokio::test]
    async fn buy_leg_failure_aborts_with_no_trade() {
        let cheap = ScriptedExchange::failing_orders("cheap", dec!(100));
        let dear = ScriptedExchange::new("dear", dec!(102));
        let mut engine = two_venue_setup(cheap.clone(), dear.clone(), test_config());

        assert!(engine.execute(&opportunity(), Some(dec!(1))).await.is_none());
        assert_eq!(dear.order_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cheap.cancel_calls.load(Ordering::SeqCst), 0);
        assert!(engine.trades().is_empty());
    }

    #[tokio::test]
    async fn sell_leg_failure_cancels_buy_exactly_once() {
        let cheap = ScriptedExchange::new("cheap", dec!(100));
        let dear = ScriptedExchange::failing_orders("dear", dec!(102));
        let mut engine = two_venue_setup(cheap.clone(), dear.clone(), test_config());

        assert!(engine.execute(&opportunity(), Some(dec!(1))).await.is_none());
        assert_eq!(cheap.order_calls.load(Ordering::SeqCst), 1);
        assert_eq!(dear.order_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cheap.cancel_calls.load(Ordering::SeqCst), 1);
        assert_eq!(dear.cancel_calls.load(Ordering::SeqCst), 0);
        assert!(engine.trades().is_empty());
    }

    #[tokio::test]
    async fn successful_trade_is_pending_and_updates_accumulators() {
        let mut engine = two_venue_setup(
            ScriptedExchange::new("cheap", dec!(100)),
            ScriptedExchange::new("dear", dec!(102)),
            test_config(),
        );

        let trade = engine
            .execute(&opportunity(), Some(dec!(1)))
            .await
            .expect("both legs fill");

        assert_eq!(trade.status, TradeStatus::Pending);
        assert_eq!(trade.final_profit, dec!(1.798));
        assert_eq!(trade.fees_paid, dec!(0.202));
        assert_ne!(trade.buy_exchange, trade.sell_exchange);
        assert_eq!(engine.daily_profit(), dec!(1.798));
        assert_eq!(engine.daily_loss(), Decimal::ZERO);

        engine.start_new_trading_day();
        assert_eq!(engine.daily_profit(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn default_amount_is_position_size_over_buy_price() {
        let mut config = test_config();
        config.max_position_size_usd = dec!(500);
        let mut engine = two_venue_setup(
            ScriptedExchange::new("cheap", dec!(100)),
            ScriptedExchange::new("dear", dec!(102)),
            config,
        );

        let trade = engine.execute(&opportunity(), None).await.unwrap();
        assert_eq!(trade.amount, dec!(5));
    }

    #[tokio::test]
    async fn losing_trade_feeds_the_loss_accumulator() {
        let mut config = test_config();
        for venue in &mut config.venues {
            venue.taker_fee_pct = dec!(2); // fees swamp the 2% spread
        }
        let mut engine = two_venue_setup(
            ScriptedExchange::new("cheap", dec!(100)),
            ScriptedExchange::new("dear", dec!(102)),
            config,
        );

        let trade = engine.execute(&opportunity(), Some(dec!(1))).await.unwrap();
        assert!(trade.final_profit < Decimal::ZERO);
        assert_eq!(engine.daily_loss(), trade.final_profit.abs());
        assert_eq!(engine.daily_profit(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn performance_summary_counts_by_status() {
        let mut engine = two_venue_setup(
            ScriptedExchange::new("cheap", dec!(100)),
            ScriptedExchange::new("dear", dec!(102)),
            test_config(),
        );

        let first = engine.execute(&opportunity(), Some(dec!(1))).await.unwrap();
        engine.execute(&opportunity(), Some(dec!(1))).await.unwrap();
        assert!(engine.mark_trade(&first.id, TradeStatus::Completed));

        let summary = engine.performance_summary();
        assert_eq!(summary.total_trades, 2);
        assert_eq!(summary.completed_trades, 1);
        assert_eq!(summary.pending_trades, 1);
        assert_eq!(summary.total_profit, dec!(1.798));
        assert_eq!(summary.win_rate_pct, dec!(100));
        assert!(!engine.mark_trade("nope", TradeStatus::Failed));
    }
}
