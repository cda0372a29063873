//! Table accessors

use tessera_core::{ColId, Document, NodeId, NodeType, TableAttrs, TableId};
use tracing::info;

use crate::error::{unexpected, Result};

pub fn attrs(doc: &Document, table: NodeId) -> Result<&TableAttrs> {
    doc.kind(table)?
        .as_table()
        .ok_or_else(|| unexpected(doc, table, NodeType::Table))
}

pub fn table_id(doc: &Document, table: NodeId) -> Result<TableId> {
    Ok(attrs(doc, table)?.table_id.clone())
}

/// Whether the table sizes its columns in percent
pub fn is_full(doc: &Document, table: NodeId) -> Result<bool> {
    Ok(attrs(doc, table)?.full)
}

/// The table containing `node`
pub fn table_of(doc: &Document, node: NodeId) -> Result<NodeId> {
    Ok(doc.find_ancestor(node, NodeType::Table)?)
}

/// Every table of the document, in document order
pub fn all_tables(doc: &Document) -> Result<Vec<NodeId>> {
    Ok(doc.descendants_of_type(doc.root(), NodeType::Table)?)
}

pub fn colgroup(doc: &Document, table: NodeId) -> Result<Option<NodeId>> {
    Ok(doc.first_child_of_type(table, NodeType::ColGroup)?)
}

pub fn body(doc: &Document, table: NodeId) -> Result<Option<NodeId>> {
    Ok(doc.first_child_of_type(table, NodeType::Body)?)
}

pub fn rows(doc: &Document, table: NodeId) -> Result<Vec<NodeId>> {
    Ok(doc.descendants_of_type(table, NodeType::Row)?)
}

pub fn cols(doc: &Document, table: NodeId) -> Result<Vec<NodeId>> {
    Ok(doc.descendants_of_type(table, NodeType::Col)?)
}

/// Column ids in column order; a cell's column index is its position here
pub fn col_ids(doc: &Document, table: NodeId) -> Result<Vec<ColId>> {
    let mut ids = Vec::new();
    for col in cols(doc, table)? {
        if let Some(attrs) = doc.kind(col)?.as_col() {
            ids.push(attrs.col_id.clone());
        }
    }
    Ok(ids)
}

/// Every cell of the table in document order
pub fn cells(doc: &Document, table: NodeId) -> Result<Vec<NodeId>> {
    Ok(doc.descendants_of_type(table, NodeType::Cell)?)
}

/// Total pixel width of a fixed-width table; `None` for full-width tables
pub fn pixel_width(doc: &Document, table: NodeId) -> Result<Option<f64>> {
    if is_full(doc, table)? {
        return Ok(None);
    }
    let mut total = 0.0;
    for col in cols(doc, table)? {
        if let Some(attrs) = doc.kind(col)?.as_col() {
            total += attrs.width;
        }
    }
    Ok((total > 0.0).then_some(total))
}

pub fn remove(doc: &mut Document, table: NodeId) -> Result<()> {
    let id = table_id(doc, table)?;
    doc.remove(table)?;
    info!("Removed table {}", id);
    Ok(())
}
