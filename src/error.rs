// src/error.rs
use thiserror::Error;

/// Engine-level failure taxonomy. None of these are fatal to the event loop:
/// config errors reject one (re)load, lookup errors drop one event, and a
/// sequence error kills only the submission that hit it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("no instrument for request id {0}")]
    UnknownRequestId(i64),

    #[error("no instrument for symbol {0}")]
    UnknownSymbol(String),

    #[error("order id sequence has not been seeded yet")]
    SequenceNotSeeded,

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}
