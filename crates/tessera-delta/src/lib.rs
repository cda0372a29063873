//! Tessera Delta - Edit batches over the document tree
//!
//! The document is a sequence of lines; table structure lives in the line
//! attributes. This crate provides:
//! - `Delta`: retain / insert / delete batches with a JSON wire shape
//! - The line model: flattening a `Document` and re-deriving its tree
//! - Clipboard import for pasted tables
//! - Saving and loading documents as delta JSON

pub mod clipboard;
pub mod delta;
pub mod error;
pub mod line;
pub mod persist;

pub use clipboard::*;
pub use delta::*;
pub use error::*;
pub use line::*;
pub use persist::*;
