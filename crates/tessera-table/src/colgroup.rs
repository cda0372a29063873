//! Column group and the column width policy
//!
//! Full-width tables keep column widths in percent summing to 100. A new
//! column borrows its width from the first column that can spare it while
//! staying at or above the minimum; a removed column hands its width to a
//! neighbour. Fixed-width tables size columns in pixels and never
//! redistribute on insert.

use tessera_core::{ColAttrs, CoreError, Document, NodeId, NodeKind, NodeType};
use tracing::debug;

use crate::config::TableConfig;
use crate::error::{unexpected, Result};
use crate::table;

/// Which neighbour receives the width of a removed column first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbour {
    Next,
    Previous,
}

pub fn cols(doc: &Document, colgroup: NodeId) -> Result<Vec<NodeId>> {
    Ok(doc.children_of_type(colgroup, NodeType::Col)?)
}

pub fn find_col(doc: &Document, colgroup: NodeId, index: usize) -> Result<Option<NodeId>> {
    Ok(cols(doc, colgroup)?.get(index).copied())
}

pub fn col_attrs(doc: &Document, col: NodeId) -> Result<&ColAttrs> {
    doc.kind(col)?
        .as_col()
        .ok_or_else(|| unexpected(doc, col, NodeType::Col))
}

pub fn width(doc: &Document, col: NodeId) -> Result<f64> {
    Ok(col_attrs(doc, col)?.width)
}

pub fn set_width(doc: &mut Document, col: NodeId, width: f64) -> Result<()> {
    doc.expect_type(col, NodeType::Col)?;
    if let Some(attrs) = doc.kind_mut(col)?.as_col_mut() {
        attrs.width = width;
    }
    Ok(())
}

/// The table owning a column group; any other parent is a structural error
fn owning_table(doc: &Document, colgroup: NodeId) -> Result<NodeId> {
    doc.expect_type(colgroup, NodeType::ColGroup)?;
    match doc.parent(colgroup)? {
        Some(parent) if doc.node_type(parent)? == NodeType::Table => Ok(parent),
        _ => Err(CoreError::InvalidParent {
            node: colgroup,
            node_type: NodeType::ColGroup,
            expected: NodeType::Table,
        }
        .into()),
    }
}

/// Insert a column before the column at `index` (or last when past the end)
pub fn insert_col_at_index(
    doc: &mut Document,
    colgroup: NodeId,
    index: usize,
    attrs: ColAttrs,
    config: &TableConfig,
) -> Result<NodeId> {
    let table = owning_table(doc, colgroup)?;
    let existing = cols(doc, colgroup)?;
    if table::is_full(doc, table)? {
        for &col in &existing {
            let current = width(doc, col)?;
            if current - attrs.width >= config.min_percent_width {
                set_width(doc, col, current - attrs.width)?;
                break;
            }
        }
    }
    let col_id = attrs.col_id.clone();
    let col = doc.create(NodeKind::Col(attrs));
    doc.insert_before(colgroup, col, existing.get(index).copied())?;
    debug!("Inserted column {} at index {}", col_id, index);
    Ok(col)
}

/// Remove the column at `index`, handing its width to the next column, else the previous
pub fn remove_col_at_index(doc: &mut Document, colgroup: NodeId, index: usize) -> Result<()> {
    owning_table(doc, colgroup)?;
    if let Some(col) = find_col(doc, colgroup, index)? {
        remove_col(doc, col, Neighbour::Next)?;
    }
    Ok(())
}

/// Remove a column, handing its width to the preferred neighbour when present
pub fn remove_col(doc: &mut Document, col: NodeId, prefer: Neighbour) -> Result<()> {
    let freed = width(doc, col)?;
    let (first, second) = match prefer {
        Neighbour::Next => (doc.next_sibling(col)?, doc.prev_sibling(col)?),
        Neighbour::Previous => (doc.prev_sibling(col)?, doc.next_sibling(col)?),
    };
    if let Some(receiver) = first.or(second) {
        let current = width(doc, receiver)?;
        set_width(doc, receiver, current + freed)?;
    }
    let col_id = col_attrs(doc, col)?.col_id.clone();
    doc.remove(col)?;
    debug!("Removed column {}", col_id);
    Ok(())
}

/// Commit an interactive resize of the column at `index`
///
/// `requested` is in the table's unit. In a full-width table a shrinking
/// column gives the difference to its next (else previous) neighbour, and a
/// growing column borrows from its next neighbour down to the minimum; the
/// last column cannot grow. A lone column is always 100%.
pub fn resize_column(
    doc: &mut Document,
    table: NodeId,
    index: usize,
    requested: f64,
    config: &TableConfig,
) -> Result<()> {
    let Some(colgroup) = table::colgroup(doc, table)? else {
        return Ok(());
    };
    let Some(col) = find_col(doc, colgroup, index)? else {
        return Ok(());
    };
    if !table::is_full(doc, table)? {
        return set_width(doc, col, requested.max(config.min_pixel_width));
    }

    let old = width(doc, col)?;
    let next = doc.next_sibling(col)?;
    let prev = doc.prev_sibling(col)?;
    if requested < old {
        let shrunk = requested.max(config.min_percent_width);
        match next.or(prev) {
            Some(receiver) => {
                let current = width(doc, receiver)?;
                set_width(doc, receiver, current + old - shrunk)?;
                set_width(doc, col, shrunk)
            }
            None => set_width(doc, col, 100.0),
        }
    } else {
        let Some(next) = next else {
            return Ok(());
        };
        let total = old + width(doc, next)?;
        let grown = requested.min(total - config.min_percent_width);
        set_width(doc, col, grown)?;
        set_width(doc, next, total - grown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{ColId, TableAttrs, TableId};

    fn table_with_widths(full: bool, widths: &[f64]) -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let table_id = TableId::from("t");
        let table = doc.create(NodeKind::Table(TableAttrs {
            table_id: table_id.clone(),
            full,
        }));
        doc.append_child(doc.root(), table).unwrap();
        let colgroup = doc.create(NodeKind::ColGroup);
        doc.append_child(table, colgroup).unwrap();
        for (i, w) in widths.iter().enumerate() {
            let col = doc.create(NodeKind::Col(ColAttrs {
                table_id: table_id.clone(),
                col_id: ColId::from(format!("c{}", i)),
                width: *w,
                full,
            }));
            doc.append_child(colgroup, col).unwrap();
        }
        (doc, table, colgroup)
    }

    fn widths(doc: &Document, colgroup: NodeId) -> Vec<f64> {
        cols(doc, colgroup)
            .unwrap()
            .into_iter()
            .map(|c| (width(doc, c).unwrap() * 100.0).round() / 100.0)
            .collect()
    }

    fn new_col(width: f64, full: bool) -> ColAttrs {
        ColAttrs {
            table_id: TableId::from("t"),
            col_id: ColId::new(),
            width,
            full,
        }
    }

    #[test]
    fn test_insert_left_borrows_from_first_column() {
        let (mut doc, _, colgroup) = table_with_widths(true, &[50.0, 50.0]);
        let config = TableConfig::default();
        insert_col_at_index(&mut doc, colgroup, 0, new_col(6.0, true), &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![6.0, 44.0, 50.0]);
    }

    #[test]
    fn test_insert_right_appends() {
        let (mut doc, _, colgroup) = table_with_widths(true, &[50.0, 50.0]);
        let config = TableConfig::default();
        insert_col_at_index(&mut doc, colgroup, 2, new_col(6.0, true), &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![44.0, 50.0, 6.0]);
    }

    #[test]
    fn test_insert_without_donor_leaves_widths() {
        let (mut doc, _, colgroup) = table_with_widths(true, &[5.0, 5.0]);
        let config = TableConfig::default();
        insert_col_at_index(&mut doc, colgroup, 1, new_col(6.0, true), &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![5.0, 6.0, 5.0]);
    }

    #[test]
    fn test_fixed_width_insert_does_not_redistribute() {
        let (mut doc, table, colgroup) = table_with_widths(false, &[200.0, 200.0]);
        let config = TableConfig::default();
        insert_col_at_index(&mut doc, colgroup, 1, new_col(160.0, false), &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![200.0, 160.0, 200.0]);
        assert_eq!(table::pixel_width(&doc, table).unwrap(), Some(560.0));
    }

    #[test]
    fn test_insert_then_remove_conserves_width() {
        let (mut doc, _, colgroup) = table_with_widths(true, &[50.0, 50.0]);
        let config = TableConfig::default();
        insert_col_at_index(&mut doc, colgroup, 0, new_col(6.0, true), &config).unwrap();
        remove_col_at_index(&mut doc, colgroup, 0).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![50.0, 50.0]);
    }

    #[test]
    fn test_remove_last_gives_width_to_previous() {
        let (mut doc, _, colgroup) = table_with_widths(true, &[30.0, 30.0, 40.0]);
        remove_col_at_index(&mut doc, colgroup, 2).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![30.0, 70.0]);
    }

    #[test]
    fn test_colgroup_outside_table_is_rejected() {
        let mut doc = Document::new();
        let colgroup = doc.create(NodeKind::ColGroup);
        doc.append_child(doc.root(), colgroup).unwrap();
        let err = remove_col_at_index(&mut doc, colgroup, 0).unwrap_err();
        assert!(matches!(
            err,
            crate::TableError::Core(CoreError::InvalidParent { .. })
        ));
    }

    #[test]
    fn test_resize_full_width() {
        let (mut doc, table, colgroup) = table_with_widths(true, &[40.0, 30.0, 30.0]);
        let config = TableConfig::default();

        resize_column(&mut doc, table, 0, 1.0, &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![3.0, 67.0, 30.0]);

        resize_column(&mut doc, table, 1, 99.0, &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![3.0, 94.0, 3.0]);

        resize_column(&mut doc, table, 2, 50.0, &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![3.0, 94.0, 3.0]);
    }

    #[test]
    fn test_resize_fixed_width_clamps() {
        let (mut doc, table, colgroup) = table_with_widths(false, &[100.0, 100.0]);
        let config = TableConfig::default();
        resize_column(&mut doc, table, 0, 10.0, &config).unwrap();
        resize_column(&mut doc, table, 1, 250.0, &config).unwrap();
        assert_eq!(widths(&doc, colgroup), vec![26.0, 250.0]);
    }
}
