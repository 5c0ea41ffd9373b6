// src/core/dispatcher.rs
use std::collections::HashMap;

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::connectors::traits::SessionClient;
use crate::error::EngineError;
use crate::types::{OrderIntent, OrderType};

/// Allocates order ids and hands intents to the session. The counter is
/// seeded exactly once from the broker's next-valid-id and incremented
/// locally afterwards. It is never re-queried.
pub struct Dispatcher {
    next_order_id: Option<i64>,
    order_type: OrderType,
    /// order id -> symbol, for correlating later status events.
    submitted: HashMap<i64, String>,
}

impl Dispatcher {
    pub fn new(order_type: OrderType) -> Self {
        Self {
            next_order_id: None,
            order_type,
            submitted: HashMap::new(),
        }
    }

    /// First seed wins; a repeated announcement is ignored.
    pub fn seed(&mut self, next_valid_id: i64) {
        match self.next_order_id {
            Some(current) => warn!(
                next_valid_id,
                current, "order id sequence already seeded; ignoring"
            ),
            None => {
                info!(next_valid_id, "order id sequence seeded");
                self.next_order_id = Some(next_valid_id);
            }
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.next_order_id.is_some()
    }

    fn allocate(&mut self) -> Result<i64, EngineError> {
        let id = self.next_order_id.ok_or(EngineError::SequenceNotSeeded)?;
        self.next_order_id = Some(id + 1);
        Ok(id)
    }

    /// Allocates the next order id and submits the intent. Submission does
    /// not wait for a fill; the only state change here is the allocation and
    /// the correlation entry.
    pub async fn submit(
        &mut self,
        session: &dyn SessionClient,
        intent: &OrderIntent,
    ) -> Result<i64> {
        if intent.quantity <= 0 {
            return Err(EngineError::Invariant(format!(
                "non-positive quantity {} for {}",
                intent.quantity, intent.symbol
            ))
            .into());
        }
        let order_id = self.allocate()?;
        let limit_price: Option<Decimal> = match self.order_type {
            OrderType::Limit => Some(intent.limit_price),
            OrderType::Market => None,
        };
        session
            .submit_order(
                order_id,
                &intent.symbol,
                intent.side,
                intent.quantity,
                self.order_type,
                limit_price,
            )
            .await?;
        self.submitted.insert(order_id, intent.symbol.clone());
        Ok(order_id)
    }

    pub fn symbol_for(&self, order_id: i64) -> Option<&str> {
        self.submitted.get(&order_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use async_trait::async_trait;

    use crate::types::Side;

    use super::*;

    struct NullSession;

    #[async_trait]
    impl SessionClient for NullSession {
        async fn subscribe_realtime(&self, _req_id: i64, _symbol: &str) -> Result<()> {
            Ok(())
        }
        async fn request_opening_price(&self, _req_id: i64, _symbol: &str) -> Result<()> {
            Ok(())
        }
        async fn submit_order(
            &self,
            _order_id: i64,
            _symbol: &str,
            _side: Side,
            _quantity: i64,
            _order_type: OrderType,
            _limit_price: Option<Decimal>,
        ) -> Result<()> {
            Ok(())
        }
        async fn cancel_order(&self, _order_id: i64) -> Result<()> {
            Ok(())
        }
        async fn cancel_subscription(&self, _req_id: i64) -> Result<()> {
            Ok(())
        }
        async fn cancel_all_orders(&self) -> Result<()> {
            Ok(())
        }
    }

    fn intent(symbol: &str) -> OrderIntent {
        OrderIntent {
            symbol: symbol.to_string(),
            side: Side::Buy,
            quantity: 100,
            limit_price: Decimal::from_str("152.00").unwrap(),
        }
    }

    #[tokio::test]
    async fn submit_before_seed_is_a_sequence_error() {
        let mut dispatcher = Dispatcher::new(OrderType::Limit);
        let err = dispatcher
            .submit(&NullSession, &intent("FB"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::SequenceNotSeeded)
        ));
    }

    #[tokio::test]
    async fn order_ids_are_strictly_increasing() {
        let mut dispatcher = Dispatcher::new(OrderType::Limit);
        dispatcher.seed(100);

        let mut ids = Vec::new();
        for symbol in ["FB", "NVDA", "QCOM"] {
            ids.push(dispatcher.submit(&NullSession, &intent(symbol)).await.unwrap());
        }
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(dispatcher.symbol_for(101), Some("NVDA"));
    }

    #[tokio::test]
    async fn non_positive_quantity_never_reaches_the_session() {
        let mut dispatcher = Dispatcher::new(OrderType::Limit);
        dispatcher.seed(100);

        let mut bad = intent("FB");
        bad.quantity = 0;
        let err = dispatcher.submit(&NullSession, &bad).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Invariant(_))
        ));

        // The id was not burned.
        let id = dispatcher.submit(&NullSession, &intent("FB")).await.unwrap();
        assert_eq!(id, 100);
    }

    #[tokio::test]
    async fn reseed_is_ignored() {
        let mut dispatcher = Dispatcher::new(OrderType::Limit);
        dispatcher.seed(100);
        dispatcher.seed(500);
        let id = dispatcher.submit(&NullSession, &intent("FB")).await.unwrap();
        assert_eq!(id, 100);
    }
}
