//! Error types for tessera-table

use tessera_core::{CoreError, Document, NodeId, NodeType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Both rows and columns must be less than {limit}, got {rows}x{columns}")]
    TooLarge {
        rows: usize,
        columns: usize,
        limit: usize,
    },

    #[error("A table needs at least one row and one column")]
    Empty,

    #[error("Not supported nesting of a table within a {0}")]
    ForbiddenNesting(NodeType),

    #[error("Offset {0} is outside the document")]
    InvalidOffset(usize),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Delta error: {0}")]
    Delta(#[from] tessera_delta::DeltaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;

/// Error for a node that is not of the expected type
pub(crate) fn unexpected(doc: &Document, node: NodeId, expected: NodeType) -> TableError {
    match doc.node_type(node) {
        Ok(actual) => CoreError::UnexpectedType {
            node,
            expected,
            actual,
        }
        .into(),
        Err(err) => err.into(),
    }
}
