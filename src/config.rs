// src/config.rs

use config::{Config, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::EngineError;
use crate::types::OrderType;

/// One configured instrument, as it appears in the `[[plan]]` array of the
/// Settings file. `target_sell_price` may be omitted, in which case it is
/// derived from the buy target and the discount factor.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRecord {
    pub symbol: String,
    pub enabled: bool,
    pub target_buy_price: Decimal,
    #[serde(default)]
    pub target_sell_price: Option<Decimal>,
    pub target_long_pos: i64,
    pub target_short_pos: i64,
    pub buy_attempt_limit: i64,
    pub sell_attempt_limit: i64,
}

impl PlanRecord {
    /// Supplied sell target, or `round(buy * factor, 2)` when absent.
    pub fn sell_price(&self, discount_factor: Decimal) -> Decimal {
        match self.target_sell_price {
            Some(price) => price,
            None => (self.target_buy_price * discount_factor).round_dp(2),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::Config("empty symbol in plan record".into()));
        }
        if self.target_buy_price <= Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "{}: target_buy_price must be positive",
                self.symbol
            )));
        }
        if let Some(sell) = self.target_sell_price {
            if sell <= Decimal::ZERO {
                return Err(EngineError::Config(format!(
                    "{}: target_sell_price must be positive",
                    self.symbol
                )));
            }
        }
        if self.target_long_pos < 0 {
            return Err(EngineError::Config(format!(
                "{}: target_long_pos must be >= 0",
                self.symbol
            )));
        }
        if self.target_short_pos > 0 {
            return Err(EngineError::Config(format!(
                "{}: target_short_pos must be <= 0",
                self.symbol
            )));
        }
        if self.buy_attempt_limit < 0 || self.sell_attempt_limit < 0 {
            return Err(EngineError::Config(format!(
                "{}: attempt limits must be >= 0",
                self.symbol
            )));
        }
        Ok(())
    }
}

fn default_plan_name() -> String {
    "MarketWatcher".to_string()
}

fn default_base_request_id() -> i64 {
    8800
}

fn default_discount_factor() -> Decimal {
    // 0.997
    Decimal::new(997, 3)
}

fn default_order_type() -> OrderType {
    OrderType::Limit
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_plan_name")]
    pub plan_name: String,
    /// Request ids are handed out starting at base + 1.
    #[serde(default = "default_base_request_id")]
    pub base_request_id: i64,
    /// Sell target = buy target * discount_factor, rounded to 2 decimals.
    #[serde(default = "default_discount_factor")]
    pub discount_factor: Decimal,
    #[serde(default = "default_order_type")]
    pub order_type: OrderType,
    /// When true, a position move in the desired direction resets that
    /// direction's attempt counter.
    #[serde(default)]
    pub reset_attempts_on_progress: bool,
    pub plan: Vec<PlanRecord>,
}

impl AppConfig {
    pub fn new() -> Result<Self, EngineError> {
        let config = Config::builder()
            .add_source(File::with_name("Settings"))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, EngineError> {
        let app: AppConfig = config.try_deserialize()?;
        for record in &app.plan {
            record.validate()?;
        }
        Ok(app)
    }
}
