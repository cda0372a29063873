//! Logical grid of a table
//!
//! Each cell occupies `rowspan` x `colspan` slots anchored at its row index
//! and the index of its column id. A table is rectangular when every slot
//! is covered by exactly one cell.

use tessera_core::{Document, NodeId};

use crate::error::Result;
use crate::{cell, row, table};

/// Occupant of a grid slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub cell: NodeId,
    pub anchor_row: usize,
    pub anchor_col: usize,
}

/// A way in which a table fails to form a rectangular grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridViolation {
    Uncovered { row: usize, col: usize },
    Overlap { row: usize, col: usize },
    UnknownColumn { cell: NodeId },
    OutOfBounds { cell: NodeId },
    Misordered { cell: NodeId },
}

#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    slots: Vec<Option<Slot>>,
    violations: Vec<GridViolation>,
}

impl Grid {
    pub fn build(doc: &Document, table: NodeId) -> Result<Self> {
        let rows = table::rows(doc, table)?;
        let col_ids = table::col_ids(doc, table)?;
        let mut grid = Self {
            rows: rows.len(),
            cols: col_ids.len(),
            slots: vec![None; rows.len() * col_ids.len()],
            violations: Vec::new(),
        };

        for (r, &row) in rows.iter().enumerate() {
            let mut last_anchor: Option<usize> = None;
            for current in row::cells(doc, row)? {
                let attrs = cell::attrs(doc, current)?;
                let Some(c) = col_ids.iter().position(|id| *id == attrs.col_id) else {
                    grid.violations.push(GridViolation::UnknownColumn { cell: current });
                    continue;
                };
                if last_anchor.is_some_and(|last| last >= c) {
                    grid.violations.push(GridViolation::Misordered { cell: current });
                }
                last_anchor = Some(c);
                let row_end = r.saturating_add(attrs.rowspan);
                let col_end = c.saturating_add(attrs.colspan);
                if row_end > grid.rows || col_end > grid.cols {
                    grid.violations.push(GridViolation::OutOfBounds { cell: current });
                }
                for sr in r..row_end.min(grid.rows) {
                    for sc in c..col_end.min(grid.cols) {
                        let index = sr * grid.cols + sc;
                        if grid.slots[index].is_some() {
                            grid.violations.push(GridViolation::Overlap { row: sr, col: sc });
                            continue;
                        }
                        grid.slots[index] = Some(Slot {
                            cell: current,
                            anchor_row: r,
                            anchor_col: c,
                        });
                    }
                }
            }
        }

        for r in 0..grid.rows {
            for c in 0..grid.cols {
                if grid.slots[r * grid.cols + c].is_none() {
                    grid.violations.push(GridViolation::Uncovered { row: r, col: c });
                }
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn slot(&self, row: usize, col: usize) -> Option<Slot> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.slots[row * self.cols + col]
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<NodeId> {
        self.slot(row, col).map(|slot| slot.cell)
    }

    pub fn violations(&self) -> &[GridViolation] {
        &self.violations
    }

    pub fn is_rectangular(&self) -> bool {
        self.violations.is_empty()
    }

    /// Slots before `col` in `row` that are occupied by cells anchored in that row
    ///
    /// This is the row-local index of grid column `col`.
    pub fn own_columns_before(&self, row: usize, col: usize) -> usize {
        (0..col.min(self.cols))
            .filter(|&c| self.slot(row, c).is_some_and(|slot| slot.anchor_row == row))
            .count()
    }
}

/// Rectangular-grid violations of a table; empty when the table is consistent
pub fn check(doc: &Document, table: NodeId) -> Result<Vec<GridViolation>> {
    Ok(Grid::build(doc, table)?.violations)
}
