// src/types.rs
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PlanRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LMT"),
            OrderType::Market => write!(f, "MKT"),
        }
    }
}

/// What the evaluator wants done. The dispatcher turns this into a concrete
/// order submission; until then no order id exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    /// Target price the trigger fired against; used as the limit price.
    pub limit_price: Decimal,
}

/// Everything the engine's single consumer task reacts to. Feed callbacks,
/// the operator reload path and shutdown all arrive through the same queue,
/// so instrument state is never touched from two tasks at once.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Broker-assigned starting order id, delivered once at session start.
    NextOrderIdAssigned(i64),
    PriceObserved {
        req_id: i64,
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
    PositionReported {
        account: String,
        symbol: String,
        position: i64,
    },
    /// First bar of the day for the instrument behind `req_id`.
    OpeningPriceObserved { req_id: i64, price: Decimal },
    OrderStatusChanged {
        order_id: i64,
        status: String,
        filled: i64,
    },
    Reload(Vec<PlanRecord>),
    Shutdown,
}
