// src/plan/mod.rs
pub mod item;
pub mod store;

pub use item::PlanItem;
pub use store::{ReloadSummary, TradingPlan};
