//! Multi-exchange aggregation and spread detection

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::types::{ArbitrageOpportunity, PriceQuote};

use super::ExchangeClient;

/// Holds one client per venue in registration order. Registration order is
/// the iteration order everywhere, which makes min/max tie-breaking
/// deterministic: the first venue seen at an extreme price wins.
pub struct MultiExchangeManager {
    exchanges: Vec<Box<dyn ExchangeClient>>,
}

impl MultiExchangeManager {
    pub fn new() -> Self {
        Self { exchanges: Vec::new() }
    }

    pub fn add(&mut self, exchange: Box<dyn ExchangeClient>) {
        self.exchanges.push(exchange);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ExchangeClient> {
        self.exchanges
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    pub fn venue_names(&self) -> Vec<&str> {
        self.exchanges.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Query every venue sequentially; a failed fetch shows up as `None`
    /// rather than aborting the batch.
    pub async fn get_prices(&self, symbol: &str) -> Vec<(String, Option<Decimal>)> {
        let mut prices = Vec::with_capacity(self.exchanges.len());
        for exchange in &self.exchanges {
            let price = exchange.last_price(symbol).await;
            prices.push((exchange.name().to_string(), price));
        }
        prices
    }

    /// Like `get_prices` but keeps only the venues that answered with a
    /// usable (positive) price, as timestamped quotes.
    pub async fn get_quotes(&self, symbol: &str) -> Vec<PriceQuote> {
        let mut quotes = Vec::with_capacity(self.exchanges.len());
        for exchange in &self.exchanges {
            if let Some(price) = exchange.last_price(symbol).await {
                if price <= Decimal::ZERO {
                    warn!(
                        "Ignoring non-positive quote {} for {} from {}",
                        price,
                        symbol,
                        exchange.name()
                    );
                    continue;
                }
                quotes.push(PriceQuote {
                    exchange_id: exchange.name().to_string(),
                    symbol: symbol.to_string(),
                    price,
                    observed_at: Utc::now(),
                });
            }
        }
        quotes
    }

    /// Two-venue spread: buy at the cheapest venue, sell at the dearest.
    /// Needs at least two live quotes; spread below `min_profit_pct` or a
    /// degenerate single-venue extreme reports no opportunity.
    pub async fn find_best_spread(
        &self,
        symbol: &str,
        min_profit_pct: Decimal,
    ) -> Option<ArbitrageOpportunity> {
        let quotes = self.get_quotes(symbol).await;
        if quotes.len() < 2 {
            debug!(
                "Skipping {}: only {} venue(s) returned a price",
                symbol,
                quotes.len()
            );
            return None;
        }

        let mut buy = &quotes[0];
        let mut sell = &quotes[0];
        for quote in &quotes[1..] {
            if quote.price < buy.price {
                buy = quote;
            }
            if quote.price > sell.price {
                sell = quote;
            }
        }
        let (buy_exchange, buy_price) = (buy.exchange_id.as_str(), buy.price);
        let (sell_exchange, sell_price) = (sell.exchange_id.as_str(), sell.price);

        if buy_exchange == sell_exchange {
            return None;
        }

        let profit_pct = (sell_price - buy_price) / buy_price * dec!(100);
        if profit_pct < min_profit_pct {
            return None;
        }

        Some(ArbitrageOpportunity {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            buy_exchange: buy_exchange.to_string(),
            buy_price,
            sell_exchange: sell_exchange.to_string(),
            sell_price,
            profit_percentage: profit_pct,
            detected_at: Utc::now(),
        })
    }
}

impl Default for MultiExchangeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use async_trait::async_trait;
    use proptest::prelude::*;

    struct FixedExchange {
        name: String,
        price: Option<Decimal>,
    }

    impl FixedExchange {
        fn boxed(name: &str, price: Option<Decimal>) -> Box<dyn ExchangeClient> {
            Box::new(Self {
                name: name.to_string(),
                price,
            })
        }
    }

    #[async_trait]
    impl ExchangeClient for FixedExchange {
        fn name(&self) -> &str {
            &self.name
        }

        async fn last_price(&self, _symbol: &str) -> Option<Decimal> {
            self.price
        }

        async fn place_order(
            &self,
            _symbol: &str,
            _side: OrderSide,
            _amount: Decimal,
            _limit_price: Option<Decimal>,
        ) -> Option<String> {
            Some("order".to_string())
        }

        async fn cancel_order(&self, _order_id: &str, _symbol: &str) -> bool {
            true
        }
    }

    fn manager(prices: &[(&str, Option<Decimal>)]) -> MultiExchangeManager {
        let mut manager = MultiExchangeManager::new();
        for (name, price) in prices {
            manager.add(FixedExchange::boxed(name, *price));
        }
        manager
    }

    #[tokio::test]
    async fn picks_min_buy_and_max_sell_across_three_venues() {
        let manager = manager(&[
            ("a", Some(dec!(100))),
            ("b", Some(dec!(102))),
            ("c", Some(dec!(98))),
        ]);

        let opp = manager
            .find_best_spread("BTC/USD", dec!(1.0))
            .await
            .expect("spread above threshold");

        assert_eq!(opp.buy_exchange, "c");
        assert_eq!(opp.buy_price, dec!(98));
        assert_eq!(opp.sell_exchange, "b");
        assert_eq!(opp.sell_price, dec!(102));
        assert_eq!(opp.profit_percentage, dec!(4) / dec!(98) * dec!(100));
        // ~4.08%
        assert!(opp.profit_percentage > dec!(4.08) && opp.profit_percentage < dec!(4.09));
    }

    #[tokio::test]
    async fn threshold_above_spread_yields_nothing() {
        let manager = manager(&[
            ("a", Some(dec!(100))),
            ("b", Some(dec!(102))),
            ("c", Some(dec!(98))),
        ]);

        assert!(manager.find_best_spread("BTC/USD", dec!(5.0)).await.is_none());
    }

    #[tokio::test]
    async fn fewer_than_two_quotes_yields_nothing() {
        let manager = manager(&[
            ("a", Some(dec!(100))),
            ("b", None),
            ("c", None),
        ]);

        assert!(manager.find_best_spread("BTC/USD", dec!(0.1)).await.is_none());

        let prices = manager.get_prices("BTC/USD").await;
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0], ("a".to_string(), Some(dec!(100))));
        assert_eq!(prices[1], ("b".to_string(), None));
    }

    #[tokio::test]
    async fn equal_extremes_break_ties_toward_first_registered() {
        let manager = manager(&[
            ("a", Some(dec!(98))),
            ("b", Some(dec!(98))),
            ("c", Some(dec!(102))),
        ]);

        let opp = manager
            .find_best_spread("BTC/USD", dec!(1.0))
            .await
            .unwrap();
        assert_eq!(opp.buy_exchange, "a");
        assert_eq!(opp.sell_exchange, "c");
    }

    #[tokio::test]
    async fn non_positive_quotes_are_dropped_not_divided_by() {
        // A zero quote plus one live venue leaves fewer than two usable
        // quotes, so the scan reports nothing instead of dividing by zero.
        let degenerate = manager(&[("a", Some(dec!(0))), ("b", Some(dec!(100)))]);
        assert!(degenerate.find_best_spread("BTC/USD", dec!(0.1)).await.is_none());
        assert_eq!(degenerate.get_quotes("BTC/USD").await.len(), 1);

        // With two healthy venues the bad quote is simply ignored.
        let mixed = manager(&[
            ("a", Some(dec!(0))),
            ("b", Some(dec!(100))),
            ("c", Some(dec!(-5))),
            ("d", Some(dec!(102))),
        ]);
        let opp = mixed.find_best_spread("BTC/USD", dec!(0.1)).await.unwrap();
        assert_eq!(opp.buy_exchange, "b");
        assert_eq!(opp.sell_exchange, "d");
    }

    #[tokio::test]
    async fn identical_prices_everywhere_is_no_opportunity() {
        let manager = manager(&[("a", Some(dec!(100))), ("b", Some(dec!(100)))]);
        assert!(manager.find_best_spread("BTC/USD", dec!(0.05)).await.is_none());
    }

    proptest! {
        #[test]
        fn spread_selects_true_min_and_max(raw in proptest::collection::vec(1u32..1_000_000, 2..8)) {
            let prices: Vec<Decimal> = raw.iter().map(|&p| Decimal::from(p)).collect();
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();

            let named: Vec<(String, Decimal)> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| (format!("venue{i}"), *p))
                .collect();
            let mut manager = MultiExchangeManager::new();
            for (name, price) in &named {
                manager.add(FixedExchange::boxed(name, Some(*price)));
            }

            let min = *prices.iter().min().unwrap();
            let max = *prices.iter().max().unwrap();
            let opp = rt.block_on(manager.find_best_spread("X/Y", Decimal::ZERO));

            match opp {
                Some(opp) => {
                    prop_assert_eq!(opp.buy_price, min);
                    prop_assert_eq!(opp.sell_price, max);
                    prop_assert_eq!(
                        opp.profit_percentage,
                        (max - min) / min * dec!(100)
                    );
                }
                None => {
                    // Only possible when every venue quotes the same price.
                    prop_assert_eq!(min, max);
                }
            }
        }
    }
}
