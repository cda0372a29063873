//! Table editing operations
//!
//! Operations act on the current cell selection, given as cell or
//! cell-inner handles in document order. Degenerate selections are no-ops.

use std::collections::HashMap;

use tessera_core::{
    CellInnerAttrs, ColAttrs, ColId, Document, NodeId, NodeType, RowId, StylePatch, TableId,
};
use tessera_delta::{apply_delta, document_length, line_at, Delta, LineFormat};
use tracing::{debug, info};

use crate::config::{TableConfig, MAX_TABLE_DIMENSION};
use crate::error::{Result, TableError};
use crate::grid::Grid;
use crate::repair::{repair_after_removal, RepairReport};
use crate::{body, cell, colgroup, row, table};

/// A freshly inserted table and where the cursor goes after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedTable {
    pub table: NodeId,
    pub cursor: usize,
}

/// Node types a table may not be nested in
const FORBIDDEN_CONTAINERS: [NodeType; 3] = [NodeType::Cell, NodeType::Table, NodeType::CodeBlock];

/// Fail unless a table may be placed at document offset `offset`
pub fn check_insert_position(doc: &Document, offset: usize) -> Result<()> {
    match line_at(doc, offset)? {
        Some(position) => {
            for container in FORBIDDEN_CONTAINERS {
                if doc.ancestor_of_type(position.node, container)?.is_some() {
                    return Err(TableError::ForbiddenNesting(container));
                }
            }
            Ok(())
        }
        None if offset == document_length(doc)? => Ok(()),
        None => Err(TableError::InvalidOffset(offset)),
    }
}

/// Insert a `rows` x `columns` table at document offset `offset`
///
/// The table is built as one edit batch: a plain line break, one line per
/// column, then one line per cell in row-major order.
pub fn insert_table(
    doc: &mut Document,
    offset: usize,
    rows: usize,
    columns: usize,
    config: &TableConfig,
) -> Result<InsertedTable> {
    if rows >= MAX_TABLE_DIMENSION || columns >= MAX_TABLE_DIMENSION {
        return Err(TableError::TooLarge {
            rows,
            columns,
            limit: MAX_TABLE_DIMENSION,
        });
    }
    if rows == 0 || columns == 0 {
        return Err(TableError::Empty);
    }
    check_insert_position(doc, offset)?;

    let table_id = TableId::new();
    let full = config.full_width;
    let width = if full {
        100.0 / columns as f64
    } else {
        (config.content_width() / columns as f64).floor()
    };
    let col_ids: Vec<ColId> = (0..columns).map(|_| ColId::new()).collect();

    let mut delta = Delta::new().retain(offset).insert("\n", None);
    for col_id in &col_ids {
        delta = delta.insert(
            "\n",
            Some(LineFormat::Col(ColAttrs {
                table_id: table_id.clone(),
                col_id: col_id.clone(),
                width,
                full,
            })),
        );
    }
    for _ in 0..rows {
        let row_id = RowId::new();
        for col_id in &col_ids {
            delta = delta.insert(
                "\n",
                Some(LineFormat::CellInner(CellInnerAttrs::unit(
                    table_id.clone(),
                    row_id.clone(),
                    col_id.clone(),
                ))),
            );
        }
    }
    apply_delta(doc, &delta)?;

    let inserted = table::all_tables(doc)?
        .into_iter()
        .find(|t| table::table_id(doc, *t).is_ok_and(|id| id == table_id))
        .ok_or(TableError::InvalidOffset(offset))?;
    info!("Inserted {}x{} table {}", rows, columns, table_id);
    Ok(InsertedTable {
        table: inserted,
        cursor: offset + columns + columns * rows + 1,
    })
}

fn resolve_all(doc: &Document, selected: &[NodeId]) -> Result<Vec<NodeId>> {
    selected.iter().map(|node| cell::resolve(doc, *node)).collect()
}

/// Row index of a cell within its table
fn row_index(doc: &Document, rows: &[NodeId], current: NodeId) -> Result<Option<usize>> {
    let owner = doc.find_ancestor(current, NodeType::Row)?;
    Ok(rows.iter().position(|r| *r == owner))
}

/// Delete the table containing the selection
pub fn remove_table(doc: &mut Document, selected: &[NodeId]) -> Result<()> {
    let Some(first) = selected.first() else {
        return Ok(());
    };
    let owner = table::table_of(doc, *first)?;
    table::remove(doc, owner)
}

/// Insert a row above the first selected cell, or below the last one
pub fn append_row(doc: &mut Document, selected: &[NodeId], below: bool) -> Result<Option<NodeId>> {
    let cells = resolve_all(doc, selected)?;
    let base = if below { cells.last() } else { cells.first() };
    let Some(&base) = base else {
        return Ok(None);
    };
    let owner = table::table_of(doc, base)?;
    let Some(body) = table::body(doc, owner)? else {
        return Ok(None);
    };
    let rows = table::rows(doc, owner)?;
    let Some(index) = row_index(doc, &rows, base)? else {
        return Ok(None);
    };
    let target = if below {
        index + cell::rowspan(doc, base)?
    } else {
        index
    };
    body::insert_row_at_index(doc, body, target).map(Some)
}

/// Delete every row touched by the selection
///
/// Cells from the band whose span reaches below it are re-created in the
/// first row after the band with their remaining rowspan.
pub fn remove_row(doc: &mut Document, selected: &[NodeId]) -> Result<RepairReport> {
    let cells = resolve_all(doc, selected)?;
    let Some(&first) = cells.first() else {
        return Ok(RepairReport::default());
    };
    let owner = table::table_of(doc, first)?;
    let table_id = table::table_id(doc, owner)?;
    let rows = table::rows(doc, owner)?;
    let col_ids = table::col_ids(doc, owner)?;

    let mut start = usize::MAX;
    let mut end = 0;
    for &current in &cells {
        if let Some(index) = row_index(doc, &rows, current)? {
            start = start.min(index);
            end = end.max(index + cell::rowspan(doc, current)?);
        }
    }
    if start == usize::MAX {
        return Ok(RepairReport::default());
    }
    let end = end.min(rows.len());
    let grid = Grid::build(doc, owner)?;
    let next_row = rows.get(end).copied();
    let next_row_id = match next_row {
        Some(next) => Some(row::row_id(doc, next)?),
        None => None,
    };

    let mut patches: Vec<(usize, CellInnerAttrs)> = Vec::new();
    for (index, &band_row) in rows.iter().enumerate().take(end).skip(start) {
        for current in row::cells(doc, band_row)? {
            let attrs = cell::attrs(doc, current)?.clone();
            if index + attrs.rowspan > end {
                if let (Some(row_id), Some(column)) = (
                    next_row_id.clone(),
                    col_ids.iter().position(|id| *id == attrs.col_id),
                ) {
                    let mut value = attrs.inner_attrs(table_id.clone());
                    value.row_id = row_id;
                    value.rowspan = index + attrs.rowspan - end;
                    patches.push((column, value));
                }
            }
            doc.remove(current)?;
        }
    }

    if let Some(next) = next_row {
        patches.sort_by_key(|(column, _)| *column);
        let mut inserted_width = 0;
        for (column, value) in &patches {
            let local = grid.own_columns_before(end, *column) + inserted_width;
            row::insert_cell_at_index(doc, next, local as isize, value)?;
            inserted_width += value.colspan;
        }
    }
    debug!("Removed rows {}..{} of table {}", start, end, table_id);
    repair_after_removal(doc, owner)
}

/// Insert a column left of the leftmost selected cell, or right of the rightmost
pub fn append_col(
    doc: &mut Document,
    selected: &[NodeId],
    right: bool,
    config: &TableConfig,
) -> Result<Option<NodeId>> {
    let cells = resolve_all(doc, selected)?;
    let mut base: Option<(NodeId, usize)> = None;
    for &current in &cells {
        let Some(index) = cell::column_index(doc, current)? else {
            continue;
        };
        let better = match base {
            None => true,
            Some((_, best)) if right => index >= best,
            Some((_, best)) => index <= best,
        };
        if better {
            base = Some((current, index));
        }
    }
    let Some((base, base_index)) = base else {
        return Ok(None);
    };
    let column = if right {
        base_index + cell::colspan(doc, base)?
    } else {
        base_index
    };

    let owner = table::table_of(doc, base)?;
    let Some(colgroup) = table::colgroup(doc, owner)? else {
        return Ok(None);
    };
    let table_id = table::table_id(doc, owner)?;
    let full = table::is_full(doc, owner)?;
    let col_id = ColId::new();
    let col = colgroup::insert_col_at_index(
        doc,
        colgroup,
        column,
        ColAttrs {
            table_id: table_id.clone(),
            col_id: col_id.clone(),
            width: config.inserted_width(full),
            full,
        },
        config,
    )?;

    let rows = table::rows(doc, owner)?;
    row::insert_column_cells(doc, &rows, column, |doc, current_row| {
        Ok(CellInnerAttrs::unit(
            table_id.clone(),
            row::row_id(doc, current_row)?,
            col_id.clone(),
        ))
    })?;
    debug!("Appended column {} at index {} of table {}", col_id, column, table_id);
    Ok(Some(col))
}

/// Delete the columns covered by the selection
///
/// The count is the widest selected extent of any single row, so the
/// selection must be rectangular.
pub fn remove_col(doc: &mut Document, selected: &[NodeId]) -> Result<RepairReport> {
    let cells = resolve_all(doc, selected)?;
    let Some(&first) = cells.first() else {
        return Ok(RepairReport::default());
    };
    let mut per_row: HashMap<RowId, usize> = HashMap::new();
    for &current in &cells {
        let attrs = cell::attrs(doc, current)?;
        *per_row.entry(attrs.row_id.clone()).or_default() += attrs.colspan;
    }
    let depth = per_row.values().copied().max().unwrap_or(0);
    let Some(column) = cell::column_index(doc, first)? else {
        return Ok(RepairReport::default());
    };

    let owner = table::table_of(doc, first)?;
    let rows = table::rows(doc, owner)?;
    for _ in 0..depth {
        row::remove_column_cells(doc, &rows, column)?;
    }
    if let Some(colgroup) = table::colgroup(doc, owner)? {
        for _ in 0..depth {
            colgroup::remove_col_at_index(doc, colgroup, column)?;
        }
    }
    debug!("Removed {} columns at index {}", depth, column);
    repair_after_removal(doc, owner)
}

/// Merge the selected cells into the first one
///
/// The merged span is the widest per-row colspan total and the tallest
/// per-column rowspan total of the selection.
pub fn merge_cells(doc: &mut Document, selected: &[NodeId]) -> Result<RepairReport> {
    let cells = resolve_all(doc, selected)?;
    if cells.len() < 2 {
        return Ok(RepairReport::default());
    }
    let mut colspan_by_row: HashMap<RowId, usize> = HashMap::new();
    let mut rowspan_by_col: HashMap<ColId, usize> = HashMap::new();
    for &current in &cells {
        let attrs = cell::attrs(doc, current)?;
        *colspan_by_row.entry(attrs.row_id.clone()).or_default() += attrs.colspan;
        *rowspan_by_col.entry(attrs.col_id.clone()).or_default() += attrs.rowspan;
    }
    let colspan = colspan_by_row.values().copied().max().unwrap_or(1);
    let rowspan = rowspan_by_col.values().copied().max().unwrap_or(1);

    let base = cells[0];
    let owner = table::table_of(doc, base)?;
    let target = cell::inner(doc, base)?;
    for &other in &cells[1..] {
        if let (Some(target), Some(source)) = (target, cell::inner(doc, other)?) {
            doc.move_children(source, target)?;
        }
        doc.remove(other)?;
    }
    cell::set_colspan(doc, base, colspan)?;
    cell::set_rowspan(doc, base, rowspan)?;
    debug!("Merged {} cells into {}x{}", cells.len(), rowspan, colspan);
    repair_after_removal(doc, owner)
}

/// Split a single spanning cell back into unit cells
pub fn split_cell(doc: &mut Document, selected: &[NodeId]) -> Result<()> {
    let cells = resolve_all(doc, selected)?;
    let [base] = cells.as_slice() else {
        return Ok(());
    };
    let base = *base;
    let attrs = cell::attrs(doc, base)?.clone();
    if attrs.colspan == 1 && attrs.rowspan == 1 {
        return Ok(());
    }
    let owner = table::table_of(doc, base)?;
    let table_id = table::table_id(doc, owner)?;
    let rows = table::rows(doc, owner)?;
    let col_ids = table::col_ids(doc, owner)?;
    let Some(column) = col_ids.iter().position(|id| *id == attrs.col_id) else {
        return Ok(());
    };
    let Some(base_row) = row_index(doc, &rows, base)? else {
        return Ok(());
    };
    let grid = Grid::build(doc, owner)?;
    let covered: Vec<ColId> = col_ids
        .iter()
        .skip(column)
        .take(attrs.colspan)
        .rev()
        .cloned()
        .collect();

    cell::set_colspan(doc, base, 1)?;
    cell::set_rowspan(doc, base, 1)?;
    for (index, &current_row) in rows.iter().enumerate().skip(base_row).take(attrs.rowspan) {
        let row_id = row::row_id(doc, current_row)?;
        let local = if index == base_row {
            grid.own_columns_before(index, column) + 1
        } else {
            grid.own_columns_before(index, column)
        };
        for col_id in &covered {
            if index == base_row && *col_id == attrs.col_id {
                continue;
            }
            let value = CellInnerAttrs::unit(table_id.clone(), row_id.clone(), col_id.clone());
            row::insert_cell_at_index(doc, current_row, local as isize, &value)?;
        }
    }
    debug!("Split {}x{} cell in table {}", attrs.rowspan, attrs.colspan, table_id);
    Ok(())
}

/// Apply a style patch to every selected cell
pub fn set_style(doc: &mut Document, selected: &[NodeId], patch: &StylePatch) -> Result<()> {
    for current in resolve_all(doc, selected)? {
        cell::apply_style(doc, current, patch)?;
    }
    Ok(())
}

/// Commit an interactive column resize on the table containing `node`
pub fn resize_column(
    doc: &mut Document,
    node: NodeId,
    index: usize,
    width: f64,
    config: &TableConfig,
) -> Result<()> {
    let owner = table::table_of(doc, node)?;
    colgroup::resize_column(doc, owner, index, width, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::check;
    use crate::repair::rebalance;
    use crate::selection::{compute_selection, CellBox, Point, Rect, Viewport};

    fn full_config() -> TableConfig {
        TableConfig {
            full_width: true,
            ..Default::default()
        }
    }

    fn setup(rows: usize, cols: usize) -> (Document, NodeId) {
        let mut doc = Document::default();
        let inserted = insert_table(&mut doc, 0, rows, cols, &full_config()).unwrap();
        (doc, inserted.table)
    }

    fn at(doc: &Document, table: NodeId, row: usize, col: usize) -> NodeId {
        Grid::build(doc, table).unwrap().cell_at(row, col).unwrap()
    }

    /// (rowspan, colspan) of every cell, row by row
    fn spans(doc: &Document, table: NodeId) -> Vec<Vec<(usize, usize)>> {
        table::rows(doc, table)
            .unwrap()
            .into_iter()
            .map(|r| {
                row::cells(doc, r)
                    .unwrap()
                    .into_iter()
                    .map(|c| (cell::rowspan(doc, c).unwrap(), cell::colspan(doc, c).unwrap()))
                    .collect()
            })
            .collect()
    }

    fn widths(doc: &Document, table: NodeId) -> Vec<f64> {
        table::cols(doc, table)
            .unwrap()
            .into_iter()
            .map(|c| (colgroup::width(doc, c).unwrap() * 100.0).round() / 100.0)
            .collect()
    }

    fn assert_consistent(doc: &Document, table: NodeId) {
        assert_eq!(check(doc, table).unwrap(), vec![]);
    }

    #[test]
    fn test_insert_full_width_table() {
        let mut doc = Document::default();
        let inserted = insert_table(&mut doc, 0, 3, 3, &full_config()).unwrap();
        assert_eq!(inserted.cursor, 13);
        assert_eq!(widths(&doc, inserted.table), vec![33.33, 33.33, 33.33]);
        assert_eq!(spans(&doc, inserted.table), vec![vec![(1, 1); 3]; 3]);
        assert_eq!(table::cells(&doc, inserted.table).unwrap().len(), 9);
        assert!(table::is_full(&doc, inserted.table).unwrap());
        assert_consistent(&doc, inserted.table);
    }

    #[test]
    fn test_insert_fixed_width_table() {
        let mut doc = Document::default();
        let config = TableConfig::default();
        let inserted = insert_table(&mut doc, 0, 2, 4, &config).unwrap();
        assert_eq!(widths(&doc, inserted.table), vec![194.0; 4]);
        assert_eq!(table::pixel_width(&doc, inserted.table).unwrap(), Some(776.0));
    }

    #[test]
    fn test_insert_table_rejects_bad_input() {
        let mut doc = Document::default();
        let config = full_config();
        assert!(matches!(
            insert_table(&mut doc, 0, 30, 2, &config),
            Err(TableError::TooLarge { rows: 30, .. })
        ));
        assert!(matches!(
            insert_table(&mut doc, 0, 2, 30, &config),
            Err(TableError::TooLarge { columns: 30, .. })
        ));
        assert!(matches!(
            insert_table(&mut doc, 0, 0, 2, &config),
            Err(TableError::Empty)
        ));
        assert!(matches!(
            insert_table(&mut doc, 5, 2, 2, &config),
            Err(TableError::InvalidOffset(5))
        ));
    }

    #[test]
    fn test_insert_table_inside_table_is_forbidden() {
        let (mut doc, _) = setup(2, 2);
        let config = full_config();
        // Line 0 is the paragraph before the table, then two column lines
        assert!(matches!(
            insert_table(&mut doc, 1, 1, 1, &config),
            Err(TableError::ForbiddenNesting(NodeType::Table))
        ));
        assert!(matches!(
            insert_table(&mut doc, 3, 1, 1, &config),
            Err(TableError::ForbiddenNesting(NodeType::Cell))
        ));
        assert_eq!(table::all_tables(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_table() {
        let (mut doc, table) = setup(2, 2);
        let selected = [at(&doc, table, 1, 1)];
        remove_table(&mut doc, &selected).unwrap();
        assert!(table::all_tables(&doc).unwrap().is_empty());
        remove_table(&mut doc, &[]).unwrap();
    }

    #[test]
    fn test_merge_square_block() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 0, 0),
            at(&doc, table, 0, 1),
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
        ];
        let report = merge_cells(&mut doc, &selected).unwrap();
        assert!(report.is_noop());
        assert_eq!(
            spans(&doc, table),
            vec![
                vec![(2, 2), (1, 1)],
                vec![(1, 1)],
                vec![(1, 1), (1, 1), (1, 1)],
            ]
        );
        assert_eq!(table::cells(&doc, table).unwrap().len(), 6);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_merge_keeps_content_in_order() {
        let (mut doc, table) = setup(1, 2);
        let first = at(&doc, table, 0, 0);
        let second = at(&doc, table, 0, 1);
        let inner = cell::inner(&doc, first).unwrap().unwrap();
        let before = doc.children(inner).unwrap().to_vec();
        let moved = doc.children(cell::inner(&doc, second).unwrap().unwrap()).unwrap().to_vec();

        merge_cells(&mut doc, &[first, second]).unwrap();
        let after = doc.children(inner).unwrap().to_vec();
        assert_eq!(after, [before, moved].concat());
        // The second column no longer anchors a cell
        assert_eq!(widths(&doc, table), vec![100.0]);
        assert_eq!(spans(&doc, table), vec![vec![(1, 1)]]);
    }

    #[test]
    fn test_merge_needs_two_cells() {
        let (mut doc, table) = setup(2, 2);
        let cells = [at(&doc, table, 0, 0)];
        let report = merge_cells(&mut doc, &cells).unwrap();
        assert!(report.is_noop());
        assert_eq!(table::cells(&doc, table).unwrap().len(), 4);
    }

    #[test]
    fn test_merge_full_columns_collapses_ghost_columns() {
        let (mut doc, table) = setup(2, 5);
        let mut selected = Vec::new();
        for r in 0..2 {
            for c in 1..4 {
                selected.push(at(&doc, table, r, c));
            }
        }
        let report = merge_cells(&mut doc, &selected).unwrap();
        assert_eq!(report.columns_removed, 2);
        assert_eq!(widths(&doc, table), vec![20.0, 60.0, 20.0]);
        assert_eq!(
            spans(&doc, table),
            vec![vec![(1, 1), (2, 1), (1, 1)], vec![(1, 1), (1, 1)]]
        );
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_merge_lower_block() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
            at(&doc, table, 2, 0),
            at(&doc, table, 2, 1),
        ];
        merge_cells(&mut doc, &selected).unwrap();
        assert_eq!(
            spans(&doc, table),
            vec![vec![(1, 1); 3], vec![(2, 2), (1, 1)], vec![(1, 1)]]
        );
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_split_restores_unit_cells() {
        let (mut doc, table) = setup(3, 3);
        let col_ids = table::col_ids(&doc, table).unwrap();
        let selected = [
            at(&doc, table, 0, 0),
            at(&doc, table, 0, 1),
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
        ];
        merge_cells(&mut doc, &selected).unwrap();
        let merged = at(&doc, table, 0, 0);
        let inner = cell::inner(&doc, merged).unwrap().unwrap();

        split_cell(&mut doc, &[inner]).unwrap();
        assert_eq!(spans(&doc, table), vec![vec![(1, 1); 3]; 3]);
        assert_consistent(&doc, table);
        for r in table::rows(&doc, table).unwrap() {
            let ids: Vec<ColId> = row::cells(&doc, r)
                .unwrap()
                .into_iter()
                .map(|c| cell::col_id(&doc, c).unwrap())
                .collect();
            assert_eq!(ids, col_ids);
        }
    }

    #[test]
    fn test_split_ignores_unit_and_multiple_cells() {
        let (mut doc, table) = setup(2, 2);
        let cells = [at(&doc, table, 0, 0)];
        split_cell(&mut doc, &cells).unwrap();
        let cells = [at(&doc, table, 0, 0), at(&doc, table, 0, 1)];
        split_cell(&mut doc, &cells).unwrap();
        assert_eq!(table::cells(&doc, table).unwrap().len(), 4);
    }

    #[test]
    fn test_split_middle_span() {
        let (mut doc, table) = setup(3, 3);
        let selected = [at(&doc, table, 1, 1), at(&doc, table, 1, 2), at(&doc, table, 2, 1), at(&doc, table, 2, 2)];
        merge_cells(&mut doc, &selected).unwrap();
        let cells = [at(&doc, table, 1, 1)];
        split_cell(&mut doc, &cells).unwrap();
        assert_eq!(spans(&doc, table), vec![vec![(1, 1); 3]; 3]);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_append_row_below_and_above() {
        let (mut doc, table) = setup(2, 2);
        let first = at(&doc, table, 0, 0);
        let added = append_row(&mut doc, &[first], false).unwrap().unwrap();
        assert_eq!(table::rows(&doc, table).unwrap()[0], added);

        let last = at(&doc, table, 2, 1);
        let added = append_row(&mut doc, &[last], true).unwrap().unwrap();
        assert_eq!(table::rows(&doc, table).unwrap()[3], added);
        assert_eq!(spans(&doc, table), vec![vec![(1, 1); 2]; 4]);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_append_row_below_spanning_cell() {
        let (mut doc, table) = setup(3, 2);
        let selected = [at(&doc, table, 0, 0), at(&doc, table, 1, 0)];
        merge_cells(&mut doc, &selected).unwrap();

        let merged = at(&doc, table, 0, 0);
        append_row(&mut doc, &[merged], true).unwrap();
        let rows = table::rows(&doc, table).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(row::cells(&doc, rows[2]).unwrap().len(), 2);
        assert_eq!(cell::rowspan(&doc, merged).unwrap(), 2);

        // Inserting inside the span grows it
        let beside = at(&doc, table, 0, 1);
        append_row(&mut doc, &[beside], true).unwrap();
        assert_eq!(cell::rowspan(&doc, merged).unwrap(), 3);
        assert_eq!(row::cells(&doc, table::rows(&doc, table).unwrap()[1]).unwrap().len(), 1);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_remove_first_row() {
        let (mut doc, table) = setup(3, 3);
        let cells = [at(&doc, table, 0, 1)];
        let report = remove_row(&mut doc, &cells).unwrap();
        assert_eq!(report.rows_removed, 1);
        assert_eq!(spans(&doc, table), vec![vec![(1, 1); 3]; 2]);
        assert_eq!(widths(&doc, table), vec![33.33, 33.33, 33.33]);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_remove_row_keeps_span_remainder() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 0, 1),
            at(&doc, table, 0, 2),
            at(&doc, table, 1, 1),
            at(&doc, table, 1, 2),
        ];
        merge_cells(&mut doc, &selected).unwrap();

        let cells = [at(&doc, table, 0, 0)];
        remove_row(&mut doc, &cells).unwrap();
        assert_eq!(
            spans(&doc, table),
            vec![vec![(1, 1), (1, 2)], vec![(1, 1); 3]]
        );
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_remove_every_row_removes_table() {
        let (mut doc, table) = setup(2, 2);
        let selected = [at(&doc, table, 0, 0), at(&doc, table, 1, 0)];
        let report = remove_row(&mut doc, &selected).unwrap();
        assert!(report.table_removed);
        assert!(table::all_tables(&doc).unwrap().is_empty());
    }

    /// Inserting right of a spanning cell places the column after the cell's
    /// last covered column, so the cell keeps colspan 2 rather than growing to 3.
    /// Only an insert strictly inside a span widens the cell, see
    /// `test_append_col_inside_span_widens_cell`.
    #[test]
    fn test_append_col_right_of_spanning_cell() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 0, 0),
            at(&doc, table, 0, 1),
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
        ];
        merge_cells(&mut doc, &selected).unwrap();
        let merged = at(&doc, table, 0, 0);

        append_col(&mut doc, &[merged], true, &full_config()).unwrap().unwrap();
        assert_eq!(widths(&doc, table), vec![27.33, 33.33, 6.0, 33.33]);
        assert_eq!(
            spans(&doc, table),
            vec![
                vec![(2, 2), (1, 1), (1, 1)],
                vec![(1, 1), (1, 1)],
                vec![(1, 1); 4],
            ]
        );
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_append_col_inside_span_widens_cell() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 0, 0),
            at(&doc, table, 0, 1),
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
        ];
        merge_cells(&mut doc, &selected).unwrap();
        let merged = at(&doc, table, 0, 0);

        let cells = [at(&doc, table, 2, 1)];
        append_col(&mut doc, &cells, false, &full_config()).unwrap();
        assert_eq!(cell::colspan(&doc, merged).unwrap(), 3);
        assert_eq!(
            spans(&doc, table),
            vec![vec![(2, 3), (1, 1)], vec![(1, 1)], vec![(1, 1); 4]]
        );
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_append_col_beside_row_span() {
        let (mut doc, table) = setup(2, 3);
        let selected = [at(&doc, table, 0, 0), at(&doc, table, 1, 0)];
        merge_cells(&mut doc, &selected).unwrap();

        let cells = [at(&doc, table, 0, 1)];
        append_col(&mut doc, &cells, false, &full_config()).unwrap();
        assert_eq!(widths(&doc, table), vec![27.33, 6.0, 33.33, 33.33]);
        assert_eq!(
            spans(&doc, table),
            vec![vec![(2, 1), (1, 1), (1, 1), (1, 1)], vec![(1, 1); 3]]
        );
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_remove_col_block() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 0, 0),
            at(&doc, table, 0, 1),
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
        ];
        remove_col(&mut doc, &selected).unwrap();
        assert_eq!(widths(&doc, table), vec![100.0]);
        assert_eq!(spans(&doc, table), vec![vec![(1, 1)]; 3]);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_remove_col_through_span() {
        let (mut doc, table) = setup(2, 3);
        let selected = [at(&doc, table, 0, 0), at(&doc, table, 0, 1)];
        merge_cells(&mut doc, &selected).unwrap();
        let merged = at(&doc, table, 0, 0);

        let cells = [at(&doc, table, 1, 0)];
        remove_col(&mut doc, &cells).unwrap();
        assert_eq!(cell::colspan(&doc, merged).unwrap(), 1);
        assert_eq!(
            cell::col_id(&doc, merged).unwrap(),
            table::col_ids(&doc, table).unwrap()[0]
        );
        assert_eq!(widths(&doc, table), vec![66.67, 33.33]);
        assert_consistent(&doc, table);
    }

    #[test]
    fn test_set_style_writes_both_layers() {
        let (mut doc, table) = setup(1, 2);
        let selected = [at(&doc, table, 0, 0), at(&doc, table, 0, 1)];
        set_style(&mut doc, &selected, &StylePatch::background_color(Some("#ff0"))).unwrap();
        for current in selected {
            let inner = cell::inner(&doc, current).unwrap().unwrap();
            assert_eq!(
                cell::inner_attrs(&doc, inner).unwrap().style.get("background-color"),
                Some("#ff0")
            );
        }
        set_style(&mut doc, &selected, &StylePatch::background_color(None)).unwrap();
        assert!(cell::attrs(&doc, selected[0]).unwrap().style.is_empty());
    }

    #[test]
    fn test_operations_leave_nothing_to_rebalance() {
        let (mut doc, table) = setup(4, 4);
        let selected = [
            at(&doc, table, 1, 1),
            at(&doc, table, 1, 2),
            at(&doc, table, 2, 1),
            at(&doc, table, 2, 2),
        ];
        merge_cells(&mut doc, &selected).unwrap();
        let cells = [at(&doc, table, 1, 1)];
        append_col(&mut doc, &cells, true, &full_config()).unwrap();
        let cells = [at(&doc, table, 1, 1)];
        append_row(&mut doc, &cells, false).unwrap();
        let cells = [at(&doc, table, 3, 0)];
        remove_row(&mut doc, &cells).unwrap();
        let cells = [at(&doc, table, 0, 0)];
        remove_col(&mut doc, &cells).unwrap();
        assert_consistent(&doc, table);
        assert!(rebalance(&mut doc, table).unwrap().is_noop());
    }

    #[test]
    fn test_drag_selection_covers_merged_block() {
        let (mut doc, table) = setup(3, 3);
        let selected = [
            at(&doc, table, 0, 0),
            at(&doc, table, 0, 1),
            at(&doc, table, 1, 0),
            at(&doc, table, 1, 1),
        ];
        merge_cells(&mut doc, &selected).unwrap();

        let grid = Grid::build(&doc, table).unwrap();
        let mut boxes = Vec::new();
        for current in table::cells(&doc, table).unwrap().into_iter().rev() {
            let (mut r, mut c) = (0, 0);
            'find: for gr in 0..grid.rows() {
                for gc in 0..grid.cols() {
                    if grid.cell_at(gr, gc) == Some(current) {
                        (r, c) = (gr, gc);
                        break 'find;
                    }
                }
            }
            let (rs, cs) = (cell::rowspan(&doc, current).unwrap(), cell::colspan(&doc, current).unwrap());
            boxes.push(CellBox {
                cell: current,
                rect: Rect::new(
                    c as f64 * 100.0,
                    r as f64 * 40.0,
                    (c + cs) as f64 * 100.0,
                    (r + rs) as f64 * 40.0,
                ),
            });
        }

        let viewport = Viewport {
            origin: Point::new(10.0, 20.0),
            scroll: Point::new(0.0, 5.0),
        };
        let selection = compute_selection(
            &doc,
            Point::new(150.0, 50.0),
            Point::new(250.0, 50.0),
            &boxes,
            viewport,
            4.0,
        )
        .unwrap();

        let expected: Vec<NodeId> = [at(&doc, table, 0, 0), at(&doc, table, 0, 2), at(&doc, table, 1, 2)]
            .into_iter()
            .map(|c| cell::inner(&doc, c).unwrap().unwrap())
            .collect();
        assert_eq!(selection.cells, expected);
        assert_eq!(selection.boundary, Rect::new(-10.0, -25.0, 290.0, 55.0));
    }
}
