// src/connectors/traits.rs
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{OrderType, Side};

/// The broker session the engine talks to. Market-data subscriptions and
/// order routing live behind this seam; the engine never waits on transport
/// completion inside a decision, it only issues the calls.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Start the periodic bar stream for one instrument.
    async fn subscribe_realtime(&self, req_id: i64, symbol: &str) -> Result<()>;

    /// Ask for today's opening bar for one instrument.
    async fn request_opening_price(&self, req_id: i64, symbol: &str) -> Result<()>;

    async fn submit_order(
        &self,
        order_id: i64,
        symbol: &str,
        side: Side,
        quantity: i64,
        order_type: OrderType,
        limit_price: Option<Decimal>,
    ) -> Result<()>;

    async fn cancel_order(&self, order_id: i64) -> Result<()>;

    async fn cancel_subscription(&self, req_id: i64) -> Result<()>;

    /// Global cancel: clears every open order on the session. Used at
    /// startup against stale state and again at shutdown.
    async fn cancel_all_orders(&self) -> Result<()>;
}
