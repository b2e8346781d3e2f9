//! Simulated venue for paper trading
//!
//! Serves jittered prices around a seeded base per symbol and fills every
//! order. Used for dry runs so the full scan/execute path can be exercised
//! without credentials.

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::types::OrderSide;

use super::ExchangeClient;

const JITTER_BPS: i64 = 30;

pub struct PaperExchange {
    name: String,
    base_prices: Mutex<HashMap<String, Decimal>>,
    order_seq: AtomicU64,
}

impl PaperExchange {
    pub fn new(name: impl Into<String>, seed_prices: Vec<(String, Decimal)>) -> Self {
        Self {
            name: name.into(),
            base_prices: Mutex::new(seed_prices.into_iter().collect()),
            order_seq: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    fn name(&self) -> &str {
        &self.name
    }

    async fn last_price(&self, symbol: &str) -> Option<Decimal> {
        let base = {
            let prices = self.base_prices.lock().unwrap_or_else(|e| e.into_inner());
            *prices.get(symbol)?
        };
        let bps = rand::rng().random_range(-JITTER_BPS..=JITTER_BPS);
        let jitter = Decimal::new(bps, 4);
        Some(base * (dec!(1) + jitter))
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: Decimal,
        limit_price: Option<Decimal>,
    ) -> Option<String> {
        let id = format!("paper-{}-{}", self.name, self.order_seq.fetch_add(1, Ordering::Relaxed));
        info!(
            "Paper {} order on {}: {} {} @ {:?} -> {}",
            side, self.name, amount, symbol, limit_price, id
        );
        Some(id)
    }

    async fn cancel_order(&self, order_id: &str, _symbol: &str) -> bool {
        info!("Paper order {} cancelled on {}", order_id, self.name);
        true
    }
}
