// src/core/mod.rs
pub mod dispatcher;
pub mod engine;
pub mod evaluator;
pub mod reconciler;
