//! Tessera Core - Host document tree for the table engine
//!
//! This crate defines the data structures every other Tessera crate builds on:
//! - `Document`: an arena of typed nodes with parent/child links and a mutation log
//! - `NodeKind`: the closed set of block and table node kinds
//! - `TableId`, `RowId`, `ColId`: stable identities carried in attribute bags
//! - Attribute bags for columns and cells, as persisted on the wire

pub mod attrs;
pub mod error;
pub mod id;
pub mod node;
pub mod tree;

pub use attrs::*;
pub use error::*;
pub use id::*;
pub use node::*;
pub use tree::*;
