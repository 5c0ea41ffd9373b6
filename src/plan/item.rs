// src/plan/item.rs
use std::fmt;

use rust_decimal::Decimal;

use crate::config::PlanRecord;

/// Per-instrument state: the configured targets plus everything the engine
/// learns at runtime. Configured fields are replaceable by a reload; runtime
/// fields survive every reload untouched.
#[derive(Debug, Clone)]
pub struct PlanItem {
    // Identity, fixed at creation.
    pub symbol: String,
    pub req_id: i64,

    // Configured fields.
    pub enabled: bool,
    pub target_buy_price: Decimal,
    pub target_sell_price: Decimal,
    pub target_long_pos: i64,
    pub target_short_pos: i64,
    pub buy_attempt_limit: i64,
    pub sell_attempt_limit: i64,

    // Runtime fields.
    pub buy_attempted: i64,
    pub sell_attempted: i64,
    /// Price one sampling interval ago; None until the first bar arrives.
    pub previous_price: Option<Decimal>,
    pub latest_pos: i64,
    pub previous_pos: i64,
    pub position_initialized: bool,
    pub opening_price: Option<Decimal>,
    pub pending_order_id: Option<i64>,
}

impl PlanItem {
    pub fn new(record: &PlanRecord, req_id: i64, discount_factor: Decimal) -> Self {
        Self {
            symbol: record.symbol.clone(),
            req_id,
            enabled: record.enabled,
            target_buy_price: record.target_buy_price,
            target_sell_price: record.sell_price(discount_factor),
            target_long_pos: record.target_long_pos,
            target_short_pos: record.target_short_pos,
            buy_attempt_limit: record.buy_attempt_limit,
            sell_attempt_limit: record.sell_attempt_limit,
            buy_attempted: 0,
            sell_attempted: 0,
            previous_price: None,
            latest_pos: 0,
            previous_pos: 0,
            position_initialized: false,
            opening_price: None,
            pending_order_id: None,
        }
    }

    /// Overwrites the configured fields from a reload record. Runtime fields
    /// (counters, prices, positions, pending order) are deliberately not
    /// touched here.
    pub fn apply_config(&mut self, record: &PlanRecord, discount_factor: Decimal) {
        self.enabled = record.enabled;
        self.target_buy_price = record.target_buy_price;
        self.target_sell_price = record.sell_price(discount_factor);
        self.target_long_pos = record.target_long_pos;
        self.target_short_pos = record.target_short_pos;
        self.buy_attempt_limit = record.buy_attempt_limit;
        self.sell_attempt_limit = record.sell_attempt_limit;
    }

    /// One-shot latch for today's opening price. Returns true only on the
    /// observation that actually set it.
    pub fn latch_opening_price(&mut self, price: Decimal) -> bool {
        if self.opening_price.is_none() {
            self.opening_price = Some(price);
            true
        } else {
            false
        }
    }
}

impl fmt::Display for PlanItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "symbol={}; enabled={}; reqId={}; targetBuyPrice={:.2}; targetSellPrice={:.2}; \
             targetLongPos={}; targetShortPos={}; buyAttemptLimit={}; sellAttemptLimit={}",
            self.symbol,
            self.enabled,
            self.req_id,
            self.target_buy_price,
            self.target_sell_price,
            self.target_long_pos,
            self.target_short_pos,
            self.buy_attempt_limit,
            self.sell_attempt_limit
        )
    }
}
