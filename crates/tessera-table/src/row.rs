//! Rows and the column-walk protocol
//!
//! Cells of a row are addressed by a row-local column index: the sum of the
//! colspans of the cells before them. Grid columns covered by cells from
//! earlier rows do not count. Callers that walk one grid column down every
//! row convert with the [`SkipInfo`] returned by each row operation.

use std::collections::VecDeque;

use tessera_core::{CellInnerAttrs, Document, NodeId, NodeType, RowId};

use crate::cell;
use crate::error::{unexpected, Result};
use crate::table;

/// How a row operation affects the rows after it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipInfo {
    /// `per_row[i]`: grid columns before the target that are covered, in the
    /// i-th following row, by spanning cells of this row
    pub per_row: Vec<usize>,
    /// Following rows to leave alone because the located cell spans them
    pub skip_row_num: usize,
}

impl SkipInfo {
    fn record_span(&mut self, rowspan: usize, colspan: usize) {
        if rowspan <= 1 {
            return;
        }
        let following = rowspan - 1;
        if self.per_row.len() < following {
            self.per_row.resize(following, 0);
        }
        for covered in &mut self.per_row[..following] {
            *covered += colspan;
        }
    }
}

/// Result of locating the cell at a row-local column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellLookup {
    /// First cell whose end index exceeds the target, if any
    pub cell: Option<NodeId>,
    /// Row-local index just past the located cell, or the row width when none
    pub end_index: usize,
    /// Spans of the cells scanned before the located one
    pub skip: SkipInfo,
}

pub fn row_id(doc: &Document, row: NodeId) -> Result<RowId> {
    doc.kind(row)?
        .as_row()
        .map(|attrs| attrs.row_id.clone())
        .ok_or_else(|| unexpected(doc, row, NodeType::Row))
}

pub fn cells(doc: &Document, row: NodeId) -> Result<Vec<NodeId>> {
    Ok(doc.children_of_type(row, NodeType::Cell)?)
}

pub fn cell_at_column_index(doc: &Document, row: NodeId, target: isize) -> Result<CellLookup> {
    let mut lookup = CellLookup::default();
    if target < 0 {
        return Ok(lookup);
    }
    for cell in cells(doc, row)? {
        let attrs = cell::attrs(doc, cell)?;
        lookup.end_index += attrs.colspan;
        if lookup.end_index as isize > target {
            lookup.cell = Some(cell);
            break;
        }
        lookup.skip.record_span(attrs.rowspan, attrs.colspan);
    }
    Ok(lookup)
}

/// Insert a cell at a row-local index
///
/// When the index falls strictly inside an existing cell that cell grows by
/// one column instead, and the rows it spans are flagged to be skipped.
pub fn insert_cell_at_index(
    doc: &mut Document,
    row: NodeId,
    target: isize,
    template: &CellInnerAttrs,
) -> Result<SkipInfo> {
    let lookup = cell_at_column_index(doc, row, target.max(0))?;
    let mut skip = lookup.skip;
    let reference = match lookup.cell {
        Some(current) => {
            let attrs = cell::attrs(doc, current)?.clone();
            let start = lookup.end_index - attrs.colspan;
            if (start as isize) < target {
                cell::set_colspan(doc, current, attrs.colspan + 1)?;
                if attrs.rowspan > 1 {
                    skip.skip_row_num = attrs.rowspan - 1;
                }
                return Ok(skip);
            }
            Some(current)
        }
        None => None,
    };
    let created = cell::create(doc, template)?;
    doc.insert_before(row, created, reference)?;
    Ok(skip)
}

/// Remove one column's worth of cell at a row-local index
///
/// A cell wider than one column shrinks by one; when its anchor column is
/// the one removed it re-anchors to the following column id. Negative
/// targets are a no-op.
pub fn remove_cell_at_index(doc: &mut Document, row: NodeId, target: isize) -> Result<SkipInfo> {
    let lookup = cell_at_column_index(doc, row, target)?;
    let mut skip = lookup.skip;
    let Some(current) = lookup.cell else {
        return Ok(skip);
    };
    let attrs = cell::attrs(doc, current)?.clone();
    if attrs.rowspan > 1 {
        skip.skip_row_num = attrs.rowspan - 1;
    }
    if attrs.colspan == 1 {
        doc.remove(current)?;
        return Ok(skip);
    }

    let start = lookup.end_index - attrs.colspan;
    if start as isize == target {
        let table = table::table_of(doc, row)?;
        let col_ids = table::col_ids(doc, table)?;
        let next = col_ids
            .iter()
            .position(|id| *id == attrs.col_id)
            .and_then(|index| col_ids.get(index + 1));
        if let Some(next) = next {
            cell::set_col_id(doc, current, next.clone())?;
        }
    }
    cell::set_colspan(doc, current, attrs.colspan - 1)?;
    Ok(skip)
}

/// Visit grid column `column` in every row, translating it to row-local indices
///
/// Rows flagged by a previous visit are not visited, but their own spans
/// still count toward the rows below them.
fn walk_column(
    doc: &mut Document,
    rows: &[NodeId],
    column: usize,
    mut visit: impl FnMut(&mut Document, NodeId, isize) -> Result<SkipInfo>,
) -> Result<()> {
    let mut covered: VecDeque<usize> = VecDeque::new();
    let mut skip_rows = 0;
    for &row in rows {
        let local = column as isize - covered.pop_front().unwrap_or(0) as isize;
        let skip = if skip_rows > 0 {
            skip_rows -= 1;
            cell_at_column_index(doc, row, local)?.skip
        } else {
            let skip = visit(doc, row, local)?;
            skip_rows = skip.skip_row_num;
            skip
        };
        for (i, count) in skip.per_row.iter().enumerate() {
            match covered.get_mut(i) {
                Some(existing) => *existing += count,
                None => covered.push_back(*count),
            }
        }
    }
    Ok(())
}

/// Give every row a cell at grid column `column`
pub(crate) fn insert_column_cells(
    doc: &mut Document,
    rows: &[NodeId],
    column: usize,
    template: impl Fn(&Document, NodeId) -> Result<CellInnerAttrs>,
) -> Result<()> {
    walk_column(doc, rows, column, |doc, row, local| {
        let value = template(doc, row)?;
        insert_cell_at_index(doc, row, local, &value)
    })
}

/// Take grid column `column` out of every row
pub(crate) fn remove_column_cells(doc: &mut Document, rows: &[NodeId], column: usize) -> Result<()> {
    walk_column(doc, rows, column, remove_cell_at_index)
}

/// Merge adjacent cells that carry the same row and column ids
pub fn normalize(doc: &mut Document, row: NodeId) -> Result<usize> {
    let mut merged = 0;
    let mut previous: Option<NodeId> = None;
    for current in cells(doc, row)? {
        if let Some(prev) = previous {
            let (a, b) = (cell::attrs(doc, prev)?, cell::attrs(doc, current)?);
            if a.row_id == b.row_id && a.col_id == b.col_id {
                if let (Some(keep), Some(drop)) = (cell::inner(doc, prev)?, cell::inner(doc, current)?) {
                    doc.move_children(drop, keep)?;
                }
                doc.remove(current)?;
                merged += 1;
                continue;
            }
        }
        previous = Some(current);
    }
    Ok(merged)
}
