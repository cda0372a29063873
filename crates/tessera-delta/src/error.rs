//! Error types for tessera-delta

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeltaError {
    #[error("{op} reaches offset {requested} of a document of length {length}")]
    OutOfRange {
        op: &'static str,
        requested: usize,
        length: usize,
    },

    #[error("Core error: {0}")]
    Core(#[from] tessera_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeltaError>;
