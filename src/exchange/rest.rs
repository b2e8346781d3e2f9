//! REST connector for live venues
//!
//! Talks to a ccxt-style REST gateway: one base URL per venue with
//! `/ticker`, `/orders` and `/orders/{id}` routes. Credentials ride in
//! headers; venues that need a passphrase (e.g. Coinbase) get one too.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{error, info};

use crate::config::VenueConfig;
use crate::errors::{BotError, BotResult};
use crate::types::OrderSide;

use super::ExchangeClient;

pub struct RestExchange {
    name: String,
    base_url: String,
    client: reqwest::Client,
    last_update: Mutex<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    last: Decimal,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    side: &'a str,
    amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

impl RestExchange {
    pub fn new(venue: &VenueConfig) -> BotResult<Self> {
        let mut headers = HeaderMap::new();
        for (header, value) in [
            ("X-API-KEY", &venue.api_key),
            ("X-API-SECRET", &venue.api_secret),
            ("X-API-PASSPHRASE", &venue.api_passphrase),
        ] {
            if let Some(value) = value {
                let value = HeaderValue::from_str(value)
                    .map_err(|_| BotError::Config(format!("invalid {header} for {}", venue.name)))?;
                headers.insert(header, value);
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| BotError::Config(format!("HTTP client for {}: {e}", venue.name)))?;

        info!("Connected to {}", venue.name);

        Ok(Self {
            name: venue.name.clone(),
            base_url: venue.base_url.trim_end_matches('/').to_string(),
            client,
            last_update: Mutex::new(None),
        })
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn touch(&self) {
        *self.last_update.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
    }

    async fn fetch_ticker(&self, symbol: &str) -> BotResult<Decimal> {
        let ticker: TickerResponse = self
            .client
            .get(format!("{}/ticker", self.base_url))
            .query(&[("symbol", symbol)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BotError::Http {
                context: format!("ticker {symbol} on {}", self.name),
                source: e,
            })?
            .json()
            .await
            .map_err(|e| BotError::Http {
                context: format!("ticker body {symbol} on {}", self.name),
                source: e,
            })?;
        self.touch();
        Ok(ticker.last)
    }

    async fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: Decimal,
        limit_price: Option<Decimal>,
    ) -> BotResult<String> {
        let body = OrderRequest {
            symbol,
            side: match side {
                OrderSide::Buy => "buy",
                OrderSide::Sell => "sell",
            },
            amount,
            price: limit_price,
        };

        let order: OrderResponse = self
            .client
            .post(format!("{}/orders", self.base_url))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BotError::Http {
                context: format!("{side} order {symbol} on {}", self.name),
                source: e,
            })?
            .json()
            .await
            .map_err(|e| BotError::Http {
                context: format!("order body {symbol} on {}", self.name),
                source: e,
            })?;

        info!("{} order placed on {}: {}", side, self.name, order.id);
        Ok(order.id)
    }
}

#[async_trait]
impl ExchangeClient for RestExchange {
    fn name(&self) -> &str {
        &self.name
    }

    async fn last_price(&self, symbol: &str) -> Option<Decimal> {
        match self.fetch_ticker(symbol).await {
            Ok(price) => Some(price),
            Err(e) => {
                error!("Error fetching price for {} on {}: {}", symbol, self.name, e);
                None
            }
        }
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: Decimal,
        limit_price: Option<Decimal>,
    ) -> Option<String> {
        match self.submit_order(symbol, side, amount, limit_price).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Error executing {} order on {}: {}", side, self.name, e);
                None
            }
        }
    }

    async fn cancel_order(&self, order_id: &str, symbol: &str) -> bool {
        let result = self
            .client
            .delete(format!("{}/orders/{}", self.base_url, order_id))
            .query(&[("symbol", symbol)])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match result {
            Ok(_) => {
                info!("Order {} cancelled on {}", order_id, self.name);
                true
            }
            Err(e) => {
                error!("Error cancelling order {} on {}: {}", order_id, self.name, e);
                false
            }
        }
    }
}
