//! Cells and their content-bearing inner nodes
//!
//! A cell's identity and span attributes live on both the cell and its inner
//! node. Every setter here writes both layers in one step.

use tessera_core::{
    CellAttrs, CellInnerAttrs, ColId, Document, NodeId, NodeKind, NodeType, Paragraph, RowId,
    StylePatch, TableId,
};
use tracing::debug;

use crate::error::{unexpected, Result};
use crate::table;

/// Build a detached cell with an inner node holding one empty paragraph
pub fn create(doc: &mut Document, value: &CellInnerAttrs) -> Result<NodeId> {
    let cell = doc.create(NodeKind::Cell(value.cell_attrs()));
    let inner = doc.create(NodeKind::CellInner(value.clone()));
    let paragraph = doc.create(NodeKind::Paragraph(Paragraph::default()));
    doc.append_child(inner, paragraph)?;
    doc.append_child(cell, inner)?;
    Ok(cell)
}

/// The cell for a cell or cell-inner handle
pub fn resolve(doc: &Document, node: NodeId) -> Result<NodeId> {
    match doc.node_type(node)? {
        NodeType::Cell => Ok(node),
        NodeType::CellInner => outer(doc, node),
        _ => Err(unexpected(doc, node, NodeType::Cell)),
    }
}

/// The parent cell of an inner node
pub fn outer(doc: &Document, inner: NodeId) -> Result<NodeId> {
    doc.expect_type(inner, NodeType::CellInner)?;
    match doc.parent(inner)? {
        Some(parent) if doc.node_type(parent)? == NodeType::Cell => Ok(parent),
        _ => Err(tessera_core::CoreError::InvalidParent {
            node: inner,
            node_type: NodeType::CellInner,
            expected: NodeType::Cell,
        }
        .into()),
    }
}

pub fn inner(doc: &Document, cell: NodeId) -> Result<Option<NodeId>> {
    Ok(doc.first_child_of_type(cell, NodeType::CellInner)?)
}

pub fn attrs(doc: &Document, cell: NodeId) -> Result<&CellAttrs> {
    doc.kind(cell)?
        .as_cell()
        .ok_or_else(|| unexpected(doc, cell, NodeType::Cell))
}

pub fn inner_attrs(doc: &Document, inner: NodeId) -> Result<&CellInnerAttrs> {
    doc.kind(inner)?
        .as_cell_inner()
        .ok_or_else(|| unexpected(doc, inner, NodeType::CellInner))
}

pub fn rowspan(doc: &Document, cell: NodeId) -> Result<usize> {
    Ok(attrs(doc, cell)?.rowspan)
}

pub fn colspan(doc: &Document, cell: NodeId) -> Result<usize> {
    Ok(attrs(doc, cell)?.colspan)
}

pub fn col_id(doc: &Document, cell: NodeId) -> Result<ColId> {
    Ok(attrs(doc, cell)?.col_id.clone())
}

pub fn row_id(doc: &Document, cell: NodeId) -> Result<RowId> {
    Ok(attrs(doc, cell)?.row_id.clone())
}

/// Column index of the cell's anchor column, if its column still exists
pub fn column_index(doc: &Document, cell: NodeId) -> Result<Option<usize>> {
    let table = table::table_of(doc, cell)?;
    let col_id = col_id(doc, cell)?;
    Ok(table::col_ids(doc, table)?
        .iter()
        .position(|id| *id == col_id))
}

fn write_through(doc: &mut Document, cell: NodeId, apply: impl FnOnce(&mut CellAttrs)) -> Result<()> {
    doc.expect_type(cell, NodeType::Cell)?;
    let inner = inner(doc, cell)?;
    let synced = {
        let Some(attrs) = doc.kind_mut(cell)?.as_cell_mut() else {
            return Ok(());
        };
        apply(attrs);
        attrs.clone()
    };
    if let Some(inner) = inner {
        if let Some(inner_attrs) = doc.kind_mut(inner)?.as_cell_inner_mut() {
            inner_attrs.row_id = synced.row_id;
            inner_attrs.col_id = synced.col_id;
            inner_attrs.rowspan = synced.rowspan;
            inner_attrs.colspan = synced.colspan;
            inner_attrs.style = synced.style;
        }
    }
    Ok(())
}

pub fn set_rowspan(doc: &mut Document, cell: NodeId, rowspan: usize) -> Result<()> {
    write_through(doc, cell, |attrs| attrs.rowspan = rowspan.max(1))
}

pub fn set_colspan(doc: &mut Document, cell: NodeId, colspan: usize) -> Result<()> {
    write_through(doc, cell, |attrs| attrs.colspan = colspan.max(1))
}

pub fn set_col_id(doc: &mut Document, cell: NodeId, col_id: ColId) -> Result<()> {
    write_through(doc, cell, |attrs| attrs.col_id = col_id)
}

pub fn set_row_id(doc: &mut Document, cell: NodeId, row_id: RowId) -> Result<()> {
    write_through(doc, cell, |attrs| attrs.row_id = row_id)
}

pub fn apply_style(doc: &mut Document, cell: NodeId, patch: &StylePatch) -> Result<()> {
    write_through(doc, cell, |attrs| attrs.style.apply(patch))
}

/// Make sure the cell holds exactly one inner node and nothing else
///
/// Returns whether anything changed.
pub fn normalize(doc: &mut Document, cell: NodeId, table_id: &TableId) -> Result<bool> {
    let children = doc.children(cell)?.to_vec();
    let mut inners = Vec::new();
    let mut strays = Vec::new();
    for child in children {
        if doc.node_type(child)? == NodeType::CellInner {
            inners.push(child);
        } else {
            strays.push(child);
        }
    }
    if inners.len() == 1 && strays.is_empty() {
        return Ok(false);
    }

    let keep = match inners.first() {
        Some(first) => *first,
        None => {
            let value = attrs(doc, cell)?.inner_attrs(table_id.clone());
            let inner = doc.create(NodeKind::CellInner(value));
            let paragraph = doc.create(NodeKind::Paragraph(Paragraph::default()));
            doc.append_child(inner, paragraph)?;
            doc.append_child(cell, inner)?;
            inner
        }
    };
    for extra in inners.iter().skip(1) {
        doc.move_children(*extra, keep)?;
        doc.remove(*extra)?;
    }
    for stray in strays {
        doc.remove(stray)?;
    }
    if doc.children(keep)?.is_empty() {
        let paragraph = doc.create(NodeKind::Paragraph(Paragraph::default()));
        doc.append_child(keep, paragraph)?;
    }
    // The inner node may predate the last attribute write on the cell
    write_through(doc, cell, |_| {})?;
    debug!("Normalized cell {}", cell);
    Ok(true)
}

/// Remove a whole cell, widening its next (else previous) sibling cell to fill the gap
pub fn remove_absorbing(doc: &mut Document, cell: NodeId) -> Result<()> {
    let removed = colspan(doc, cell)?;
    let neighbour = match doc.next_sibling(cell)? {
        Some(next) => Some(next),
        None => doc.prev_sibling(cell)?,
    };
    if let Some(neighbour) = neighbour {
        if doc.node_type(neighbour)? == NodeType::Cell {
            let width = colspan(doc, neighbour)? + removed;
            set_colspan(doc, neighbour, width)?;
        }
    }
    doc.remove(cell)?;
    Ok(())
}
