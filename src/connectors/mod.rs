// src/connectors/mod.rs
pub mod paper;
pub mod traits;
