//! Repair passes
//!
//! [`repair_after_removal`] runs right after module-driven removals (rows,
//! columns, merges). It drops rows left without cells, shortens the spans
//! that crossed them, and removes ghost columns that no cell anchors to.
//!
//! [`rebalance`] is the self-healing pass for arbitrary structural damage.
//! It walks an occupancy map of the grid, inserting filler cells where a
//! slot is empty, clamping spans that leave the table and dropping surplus
//! cells. Both passes are idempotent.

use tessera_core::{CellInnerAttrs, Document, NodeId};
use tracing::{debug, info, warn};

use crate::colgroup::{self, Neighbour};
use crate::error::Result;
use crate::{cell, row, table};

/// What a repair pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub table_removed: bool,
    pub rows_removed: usize,
    pub columns_removed: usize,
    pub cells_inserted: usize,
    pub cells_removed: usize,
    pub spans_adjusted: usize,
    pub cells_normalized: usize,
}

impl RepairReport {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    /// Add the counts of another pass
    pub fn absorb(&mut self, other: RepairReport) {
        self.table_removed |= other.table_removed;
        self.rows_removed += other.rows_removed;
        self.columns_removed += other.columns_removed;
        self.cells_inserted += other.cells_inserted;
        self.cells_removed += other.cells_removed;
        self.spans_adjusted += other.spans_adjusted;
        self.cells_normalized += other.cells_normalized;
    }
}

/// Clean up after a bulk removal: empty rows, spans crossing them and ghost columns
pub fn repair_after_removal(doc: &mut Document, table: NodeId) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    let rows = table::rows(doc, table)?;
    let col_ids = table::col_ids(doc, table)?;
    let mut anchored = vec![0usize; col_ids.len()];
    let mut empty_rows: Vec<usize> = Vec::new();

    for index in (0..rows.len()).rev() {
        let cells = row::cells(doc, rows[index])?;
        if cells.is_empty() {
            empty_rows.push(index);
            continue;
        }
        for current in cells {
            let attrs = cell::attrs(doc, current)?;
            let rowspan = attrs.rowspan;
            let crossed = empty_rows
                .iter()
                .filter(|&&empty| index.saturating_add(rowspan) > empty)
                .count();
            if let Some(c) = col_ids.iter().position(|id| *id == attrs.col_id) {
                anchored[c] += 1;
            }
            if crossed > 0 {
                cell::set_rowspan(doc, current, rowspan.saturating_sub(crossed))?;
                report.spans_adjusted += 1;
            }
        }
    }
    for &index in &empty_rows {
        doc.remove(rows[index])?;
        report.rows_removed += 1;
    }

    let rows = table::rows(doc, table)?;
    if rows.is_empty() {
        table::remove(doc, table)?;
        report.table_removed = true;
        return Ok(report);
    }

    let cols = table::cols(doc, table)?;
    let mut index = 0;
    let mut ghosts = Vec::new();
    for (c, count) in anchored.iter().enumerate() {
        if *count > 0 {
            index += 1;
            continue;
        }
        row::remove_column_cells(doc, &rows, index)?;
        if let Some(col) = cols.get(c) {
            ghosts.push(*col);
        }
    }
    for ghost in ghosts {
        colgroup::remove_col(doc, ghost, Neighbour::Previous)?;
        report.columns_removed += 1;
    }

    if !report.is_noop() {
        debug!(
            "Repaired table after removal: {} rows, {} columns removed",
            report.rows_removed, report.columns_removed
        );
    }
    Ok(report)
}

/// Restore the rectangular grid of a table, deleting it when it has no rows or columns
pub fn rebalance(doc: &mut Document, table: NodeId) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    let rows = table::rows(doc, table)?;
    let col_ids = table::col_ids(doc, table)?;
    if rows.is_empty() || col_ids.is_empty() {
        table::remove(doc, table)?;
        report.table_removed = true;
        return Ok(report);
    }

    let table_id = table::table_id(doc, table)?;
    for &current_row in &rows {
        report.cells_removed += row::normalize(doc, current_row)?;
        for current in row::cells(doc, current_row)? {
            if cell::normalize(doc, current, &table_id)? {
                report.cells_normalized += 1;
            }
        }
    }

    let (row_count, col_count) = (rows.len(), col_ids.len());
    let mut occupied = vec![vec![false; col_count]; row_count];
    for (r, &current_row) in rows.iter().enumerate() {
        let row_id = row::row_id(doc, current_row)?;
        let cells = row::cells(doc, current_row)?;
        let mut next = 0;
        for c in 0..col_count {
            if occupied[r][c] {
                continue;
            }
            let current = cells.get(next).copied();
            let matched = match current {
                Some(candidate) => cell::attrs(doc, candidate)?.col_id == col_ids[c],
                None => false,
            };
            let Some(current) = current.filter(|_| matched) else {
                let value =
                    CellInnerAttrs::unit(table_id.clone(), row_id.clone(), col_ids[c].clone());
                let filler = cell::create(doc, &value)?;
                doc.insert_before(current_row, filler, current)?;
                occupied[r][c] = true;
                report.cells_inserted += 1;
                warn!("Inserted filler cell at row {} column {} of table {}", r, c, table_id);
                continue;
            };
            next += 1;

            let attrs = cell::attrs(doc, current)?.clone();
            let free_run = (c..col_count).take_while(|&k| !occupied[r][k]).count();
            let rowspan = attrs.rowspan.min(row_count - r);
            let colspan = attrs.colspan.min(free_run);
            if rowspan != attrs.rowspan {
                cell::set_rowspan(doc, current, rowspan)?;
                report.spans_adjusted += 1;
            }
            if colspan != attrs.colspan {
                cell::set_colspan(doc, current, colspan)?;
                report.spans_adjusted += 1;
            }
            for covered in occupied.iter_mut().skip(r).take(rowspan) {
                for slot in &mut covered[c..c + colspan] {
                    *slot = true;
                }
            }
        }
        for surplus in cells.iter().skip(next) {
            doc.remove(*surplus)?;
            report.cells_removed += 1;
        }
    }

    if !report.is_noop() {
        info!("Rebalanced table {}: {:?}", table_id, report);
    }
    Ok(report)
}

/// Rebalance every table of the document
pub fn rebalance_all(doc: &mut Document) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    for current in table::all_tables(doc)? {
        if doc.contains(current) {
            report.absorb(rebalance(doc, current)?);
        }
    }
    Ok(report)
}
