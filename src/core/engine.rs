// src/core/engine.rs
use anyhow::Result;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, PlanRecord};
use crate::connectors::traits::SessionClient;
use crate::core::dispatcher::Dispatcher;
use crate::core::{evaluator, reconciler};
use crate::plan::store::TradingPlan;
use crate::types::{EngineEvent, OrderIntent};

/// The event loop. One consumer task owns the plan and the dispatcher, and
/// every mutation (evaluation, reconciliation, reload) happens inside it, in
/// arrival order. A bad event is logged and dropped; the loop never dies
/// because of one.
pub struct Engine {
    plan: TradingPlan,
    dispatcher: Dispatcher,
    session: Box<dyn SessionClient>,
    events: mpsc::Receiver<EngineEvent>,
    reset_attempts_on_progress: bool,
}

impl Engine {
    pub fn new(
        config: &AppConfig,
        plan: TradingPlan,
        session: Box<dyn SessionClient>,
        events: mpsc::Receiver<EngineEvent>,
    ) -> Self {
        Self {
            plan,
            dispatcher: Dispatcher::new(config.order_type),
            session,
            events,
            reset_attempts_on_progress: config.reset_attempts_on_progress,
        }
    }

    pub fn plan(&self) -> &TradingPlan {
        &self.plan
    }

    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;

        while let Some(event) = self.events.recv().await {
            if matches!(event, EngineEvent::Shutdown) {
                info!("shutdown requested");
                break;
            }
            self.handle_event(event).await;
        }

        self.drain().await
    }

    /// Clears stale broker state, then subscribes every plan item in
    /// insertion order.
    async fn start(&mut self) -> Result<()> {
        self.plan.log_plan();
        self.session.cancel_all_orders().await?;
        for item in self.plan.iter() {
            self.session
                .subscribe_realtime(item.req_id, &item.symbol)
                .await?;
            self.session
                .request_opening_price(item.req_id, &item.symbol)
                .await?;
        }
        info!(instruments = self.plan.len(), "engine started");
        Ok(())
    }

    /// Second phase of shutdown: the loop has stopped consuming, so no
    /// decision can race these cancels. Subscriptions go first, in insertion
    /// order, then the global order cancel.
    async fn drain(&mut self) -> Result<()> {
        info!("draining subscriptions");
        for item in self.plan.iter() {
            if let Err(err) = self.session.cancel_subscription(item.req_id).await {
                error!(%err, req_id = item.req_id, "failed to cancel subscription");
            }
        }
        self.session.cancel_all_orders().await?;
        info!("engine stopped");
        Ok(())
    }

    async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::NextOrderIdAssigned(id) => self.dispatcher.seed(id),
            EngineEvent::PriceObserved {
                req_id,
                price,
                timestamp,
            } => {
                debug!(req_id, %price, %timestamp, "price observed");
                self.on_price(req_id, price).await;
            }
            EngineEvent::PositionReported {
                account,
                symbol,
                position,
            } => self.on_position(&account, &symbol, position),
            EngineEvent::OpeningPriceObserved { req_id, price } => {
                self.on_opening_price(req_id, price)
            }
            EngineEvent::OrderStatusChanged {
                order_id,
                status,
                filled,
            } => {
                let symbol = self.dispatcher.symbol_for(order_id).unwrap_or("?");
                info!(order_id, symbol, %status, filled, "order status");
            }
            EngineEvent::Reload(records) => self.on_reload(&records).await,
            EngineEvent::Shutdown => {}
        }
    }

    async fn on_price(&mut self, req_id: i64, price: Decimal) {
        let intents = match self.plan.get_mut(req_id) {
            Ok(item) => evaluator::evaluate(item, price),
            Err(err) => {
                warn!(%err, req_id, "price for unknown instrument");
                return;
            }
        };

        for intent in intents {
            self.place(&intent).await;
        }
    }

    /// Cancels the still-pending order for the instrument (it may already
    /// have filled), then submits the replacement and remembers its id.
    async fn place(&mut self, intent: &OrderIntent) {
        let pending = match self.plan.get_by_symbol_mut(&intent.symbol) {
            Ok(item) => item.pending_order_id.take(),
            Err(err) => {
                warn!(%err, symbol = %intent.symbol, "intent for unknown instrument");
                return;
            }
        };
        if let Some(order_id) = pending {
            if let Err(err) = self.session.cancel_order(order_id).await {
                error!(%err, order_id, "failed to cancel pending order");
            }
        }

        match self.dispatcher.submit(self.session.as_ref(), intent).await {
            Ok(order_id) => {
                if let Ok(item) = self.plan.get_by_symbol_mut(&intent.symbol) {
                    item.pending_order_id = Some(order_id);
                }
            }
            Err(err) => {
                // Kills this submission only; the loop and the counters of
                // other instruments are unaffected.
                error!(%err, symbol = %intent.symbol, "order submission failed");
            }
        }
    }

    fn on_position(&mut self, account: &str, symbol: &str, position: i64) {
        match self.plan.get_by_symbol_mut(symbol) {
            Ok(item) => {
                debug!(account, symbol, position, "position report");
                reconciler::reconcile(item, position, self.reset_attempts_on_progress);
            }
            // The broker reports every position on the account, so symbols
            // outside the plan are expected here.
            Err(_) => debug!(account, symbol, position, "position for untracked symbol"),
        }
    }

    fn on_opening_price(&mut self, req_id: i64, price: Decimal) {
        match self.plan.get_mut(req_id) {
            Ok(item) => {
                if item.latch_opening_price(price) {
                    info!(symbol = %item.symbol, %price, "opening price set");
                }
            }
            Err(err) => warn!(%err, req_id, "opening price for unknown instrument"),
        }
    }

    async fn on_reload(&mut self, records: &[PlanRecord]) {
        let summary = match self.plan.reload(records) {
            Ok(summary) => summary,
            Err(err) => {
                error!(%err, "reload rejected; previous plan kept");
                return;
            }
        };

        // Instruments added by the reload need the same subscriptions the
        // startup pass issued.
        for symbol in &summary.added {
            let (req_id, symbol) = match self.plan.get_by_symbol(symbol) {
                Ok(item) => (item.req_id, item.symbol.clone()),
                Err(_) => continue,
            };
            if let Err(err) = self.session.subscribe_realtime(req_id, &symbol).await {
                error!(%err, req_id, symbol, "failed to subscribe reloaded instrument");
            }
            if let Err(err) = self.session.request_opening_price(req_id, &symbol).await {
                error!(%err, req_id, symbol, "failed to request opening price");
            }
        }
    }
}
