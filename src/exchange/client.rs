//! Exchange client trait

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::OrderSide;

/// One venue connection. Remote failures never propagate past this
/// boundary: they are logged by the implementation and reported as an
/// absent value (`None` / `false`).
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn name(&self) -> &str;

    /// Last-traded price for a symbol, or `None` on any failure.
    async fn last_price(&self, symbol: &str) -> Option<Decimal>;

    /// Place an order, returning the venue's order id. A `limit_price` of
    /// `None` means a market order.
    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: Decimal,
        limit_price: Option<Decimal>,
    ) -> Option<String>;

    /// Best-effort cancellation. `false` means the venue rejected or the
    /// call failed; callers do not retry.
    async fn cancel_order(&self, order_id: &str, symbol: &str) -> bool;
}
