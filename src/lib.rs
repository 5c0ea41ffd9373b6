// src/lib.rs
pub mod config;
pub mod connectors;
pub mod core;
pub mod error;
pub mod plan;
pub mod types;
