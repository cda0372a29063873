//! Tessera Table - Layout and consistency engine for merged-cell tables
//!
//! A table is a tree: a column group of columns and a body of rows, each row
//! holding cells that anchor to a column id and may span rows and columns.
//! This crate provides:
//! - Cell, row, body, column group and table primitives
//! - The editing operations: insert/remove table, rows and columns, merge, split, style
//! - Repair passes that restore the rectangular grid after arbitrary edits
//! - The geometric selection model
//! - `TableConfig`: width policy and tuning knobs

pub mod body;
pub mod cell;
pub mod colgroup;
pub mod config;
pub mod error;
pub mod grid;
pub mod ops;
pub mod repair;
pub mod row;
pub mod selection;
pub mod table;

pub use config::*;
pub use error::*;
pub use grid::*;
pub use ops::*;
pub use repair::*;
pub use selection::*;
