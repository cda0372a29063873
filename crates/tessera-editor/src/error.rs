//! Error types for tessera-editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Table error: {0}")]
    Table(#[from] tessera_table::TableError),

    #[error("Delta error: {0}")]
    Delta(#[from] tessera_delta::DeltaError),

    #[error("Core error: {0}")]
    Core(#[from] tessera_core::CoreError),
}

pub type Result<T> = std::result::Result<T, EditorError>;
