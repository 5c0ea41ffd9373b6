// src/connectors/paper.rs
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::connectors::traits::SessionClient;
use crate::types::{OrderType, Side};

/// Log-only session. Every call is acknowledged locally and written to the
/// log, so the engine can be exercised without a broker connection.
#[derive(Debug, Default)]
pub struct PaperSession;

#[async_trait]
impl SessionClient for PaperSession {
    async fn subscribe_realtime(&self, req_id: i64, symbol: &str) -> Result<()> {
        info!(req_id, symbol, "paper: subscribe realtime bars");
        Ok(())
    }

    async fn request_opening_price(&self, req_id: i64, symbol: &str) -> Result<()> {
        info!(req_id, symbol, "paper: request opening price");
        Ok(())
    }

    async fn submit_order(
        &self,
        order_id: i64,
        symbol: &str,
        side: Side,
        quantity: i64,
        order_type: OrderType,
        limit_price: Option<Decimal>,
    ) -> Result<()> {
        match limit_price {
            Some(price) => info!(
                order_id, symbol, %side, quantity, %order_type, %price,
                "paper: submit order"
            ),
            None => info!(
                order_id, symbol, %side, quantity, %order_type,
                "paper: submit order"
            ),
        }
        Ok(())
    }

    async fn cancel_order(&self, order_id: i64) -> Result<()> {
        info!(order_id, "paper: cancel order");
        Ok(())
    }

    async fn cancel_subscription(&self, req_id: i64) -> Result<()> {
        info!(req_id, "paper: cancel subscription");
        Ok(())
    }

    async fn cancel_all_orders(&self) -> Result<()> {
        info!("paper: cancel all orders");
        Ok(())
    }
}
