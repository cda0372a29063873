//! Table body

use tessera_core::{CellInnerAttrs, Document, NodeId, NodeKind, NodeType, RowAttrs, RowId};
use tracing::debug;

use crate::error::Result;
use crate::{cell, row, table};

/// Insert a new row before the row at `target` (or last when past the end)
///
/// Cells of earlier rows whose span reaches the target grow by one row and
/// cover their columns in the new row; every other column gets a fresh
/// unit cell.
pub fn insert_row_at_index(doc: &mut Document, body: NodeId, target: usize) -> Result<NodeId> {
    doc.expect_type(body, NodeType::Body)?;
    let table = table::table_of(doc, body)?;
    let table_id = table::table_id(doc, table)?;
    let col_ids = table::col_ids(doc, table)?;
    let rows = table::rows(doc, table)?;

    let mut needed = vec![true; col_ids.len()];
    for (index, &existing) in rows.iter().enumerate().take(target) {
        for current in row::cells(doc, existing)? {
            let attrs = cell::attrs(doc, current)?.clone();
            if index + attrs.rowspan <= target {
                continue;
            }
            cell::set_rowspan(doc, current, attrs.rowspan + 1)?;
            if let Some(start) = col_ids.iter().position(|id| *id == attrs.col_id) {
                let end = (start + attrs.colspan).min(col_ids.len());
                for slot in &mut needed[start..end] {
                    *slot = false;
                }
            }
        }
    }

    let row_id = RowId::new();
    let new_row = doc.create(NodeKind::Row(RowAttrs {
        row_id: row_id.clone(),
    }));
    for (col_id, _) in col_ids.iter().zip(&needed).filter(|(_, needed)| **needed) {
        let value = CellInnerAttrs::unit(table_id.clone(), row_id.clone(), col_id.clone());
        let created = cell::create(doc, &value)?;
        doc.append_child(new_row, created)?;
    }
    doc.insert_before(body, new_row, rows.get(target).copied())?;
    debug!("Inserted row {} at index {}", row_id, target);
    Ok(new_row)
}
