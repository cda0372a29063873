//! Error types for tessera-core

use thiserror::Error;

use crate::{NodeId, NodeType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {node} is not a child of {parent}")]
    NotAChild { node: NodeId, parent: NodeId },

    #[error("Inserting {child} under {parent} would create a cycle")]
    WouldCycle { child: NodeId, parent: NodeId },

    #[error("The root node cannot be detached or removed")]
    RootRemoval,

    #[error("Expected a {expected} node at {node}, found {actual}")]
    UnexpectedType {
        node: NodeId,
        expected: NodeType,
        actual: NodeType,
    },

    #[error("The {node_type} node {node} is not inside a {expected}")]
    MissingAncestor {
        node: NodeId,
        node_type: NodeType,
        expected: NodeType,
    },

    #[error("The parent of {node_type} node {node} must be a {expected}")]
    InvalidParent {
        node: NodeId,
        node_type: NodeType,
        expected: NodeType,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
