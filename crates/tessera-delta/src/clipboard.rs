//! Clipboard import for pasted tables
//!
//! A pasted table is re-keyed so it never collides with the table it was
//! copied from: it gets a fresh table id and fresh row ids. Column ids are
//! kept when the source carried them. Widths are normalized to the width
//! mode of the destination.

use serde::{Deserialize, Serialize};
use tessera_core::{
    clamp_span, deserialize_span, parse_css_number, CellInnerAttrs, CellStyle, ColAttrs, ColId,
    RowId, TableId, WidthUnit,
};
use tracing::debug;

use crate::delta::Delta;
use crate::line::LineFormat;

/// A table as read from pasted markup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastedTable {
    #[serde(default)]
    pub cols: Vec<PastedCol>,
    pub rows: Vec<PastedRow>,
    /// Rendered width of the source table in pixels
    #[serde(default)]
    pub rendered_width: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastedCol {
    #[serde(default)]
    pub col_id: Option<ColId>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PastedRow {
    pub cells: Vec<PastedCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastedCell {
    #[serde(default = "one", deserialize_with = "deserialize_span")]
    pub rowspan: usize,
    #[serde(default = "one", deserialize_with = "deserialize_span")]
    pub colspan: usize,
    #[serde(default)]
    pub style: CellStyle,
    /// Text of each line in the cell
    #[serde(default)]
    pub lines: Vec<String>,
}

impl Default for PastedCell {
    fn default() -> Self {
        Self {
            rowspan: 1,
            colspan: 1,
            style: CellStyle::default(),
            lines: Vec::new(),
        }
    }
}

impl PastedCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            ..Self::default()
        }
    }
}

fn one() -> usize {
    1
}

/// Width policy of the destination editor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    pub full_width: bool,
    pub min_percent_width: f64,
    pub min_pixel_width: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            full_width: false,
            min_percent_width: 3.0,
            min_pixel_width: 26.0,
        }
    }
}

/// Grid position of a pasted cell, with its span bounded by the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    col: usize,
    rowspan: usize,
    colspan: usize,
}

/// Placement of every pasted cell, in row-major order, and the column count
fn place_cells(rows: &[PastedRow]) -> (Vec<Vec<Placement>>, usize) {
    let mut occupied: Vec<Vec<bool>> = vec![Vec::new(); rows.len()];
    let mut anchors = Vec::with_capacity(rows.len());
    let mut columns = 0;
    for (r, row) in rows.iter().enumerate() {
        let mut col = 0;
        let mut row_anchors = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            while occupied[r].get(col).copied().unwrap_or(false) {
                col += 1;
            }
            let rowspan = clamp_span(cell.rowspan).min(rows.len() - r);
            let colspan = clamp_span(cell.colspan);
            row_anchors.push(Placement {
                col,
                rowspan,
                colspan,
            });
            for covered in occupied.iter_mut().skip(r).take(rowspan) {
                if covered.len() < col + colspan {
                    covered.resize(col + colspan, false);
                }
                for slot in &mut covered[col..col + colspan] {
                    *slot = true;
                }
            }
            col += colspan;
        }
        columns = columns.max(occupied[r].len());
        anchors.push(row_anchors);
    }
    (anchors, columns)
}

fn normalized_width(col: &PastedCol, target: WidthUnit, rendered_width: f64) -> Option<f64> {
    let raw = col.width.as_deref()?;
    let value = parse_css_number(raw)?;
    let source = if raw.trim_end().ends_with('%') {
        WidthUnit::Percent
    } else if raw.trim_end().ends_with("px") {
        WidthUnit::Pixel
    } else if col.full {
        WidthUnit::Percent
    } else {
        WidthUnit::Pixel
    };
    match (source, target) {
        (WidthUnit::Percent, WidthUnit::Pixel) if rendered_width > 0.0 => {
            Some(value / 100.0 * rendered_width)
        }
        (WidthUnit::Pixel, WidthUnit::Percent) if rendered_width > 0.0 => {
            Some(value / rendered_width * 100.0)
        }
        (source, target) if source == target => Some(value),
        _ => None,
    }
}

/// Convert a pasted table into an insert-only delta of column and cell lines
pub fn import_table(pasted: &PastedTable, options: &ImportOptions) -> Delta {
    let (anchors, grid_columns) = place_cells(&pasted.rows);
    let columns = if pasted.cols.is_empty() {
        grid_columns
    } else {
        pasted.cols.len()
    };
    if columns == 0 {
        return Delta::new();
    }

    let table_id = TableId::new();
    let target = if options.full_width {
        WidthUnit::Percent
    } else {
        WidthUnit::Pixel
    };
    let default_width = if options.full_width {
        (100.0 / columns as f64).max(options.min_percent_width)
    } else {
        (pasted.rendered_width / columns as f64).max(options.min_pixel_width)
    };

    let col_ids: Vec<ColId> = (0..columns)
        .map(|i| {
            pasted
                .cols
                .get(i)
                .and_then(|c| c.col_id.clone())
                .unwrap_or_default()
        })
        .collect();

    let mut delta = Delta::new();
    for (i, col_id) in col_ids.iter().enumerate() {
        let width = pasted
            .cols
            .get(i)
            .and_then(|c| normalized_width(c, target, pasted.rendered_width))
            .unwrap_or(default_width);
        delta = delta.insert(
            "\n",
            Some(LineFormat::Col(ColAttrs {
                table_id: table_id.clone(),
                col_id: col_id.clone(),
                width,
                full: options.full_width,
            })),
        );
    }

    for (row, row_anchors) in pasted.rows.iter().zip(&anchors) {
        let row_id = RowId::new();
        for (cell, placement) in row.cells.iter().zip(row_anchors) {
            let Some(col_id) = col_ids.get(placement.col) else {
                continue;
            };
            let attrs = CellInnerAttrs {
                table_id: table_id.clone(),
                row_id: row_id.clone(),
                col_id: col_id.clone(),
                rowspan: placement.rowspan,
                colspan: placement.colspan.min(columns - placement.col),
                style: cell.style.clone(),
            };
            let format = Some(LineFormat::CellInner(attrs));
            if cell.lines.is_empty() {
                delta = delta.insert("\n", format);
                continue;
            }
            for text in &cell.lines {
                delta = delta.insert(text.replace('\n', " "), None).insert("\n", format.clone());
            }
        }
    }
    debug!("Imported pasted table {} with {} columns", table_id, columns);
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{from_delta, Op};
    use tessera_core::{NodeType, MAX_SPAN};

    fn cols_of(delta: &Delta) -> Vec<ColAttrs> {
        delta
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    attributes: Some(LineFormat::Col(attrs)),
                    ..
                } => Some(attrs.clone()),
                _ => None,
            })
            .collect()
    }

    fn cells_of(delta: &Delta) -> Vec<CellInnerAttrs> {
        delta
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    attributes: Some(LineFormat::CellInner(attrs)),
                    ..
                } => Some(attrs.clone()),
                _ => None,
            })
            .collect()
    }

    fn unit_row(n: usize) -> PastedRow {
        PastedRow {
            cells: (0..n).map(|i| PastedCell::text(format!("c{}", i))).collect(),
        }
    }

    #[test]
    fn test_full_width_defaults() {
        let pasted = PastedTable {
            rows: vec![unit_row(4), unit_row(4)],
            ..Default::default()
        };
        let options = ImportOptions {
            full_width: true,
            ..Default::default()
        };
        let delta = import_table(&pasted, &options);
        let cols = cols_of(&delta);
        assert_eq!(cols.len(), 4);
        assert!(cols.iter().all(|c| c.width == 25.0 && c.full));
        assert_eq!(cells_of(&delta).len(), 8);
    }

    #[test]
    fn test_fixed_width_floor() {
        let pasted = PastedTable {
            rows: vec![unit_row(3)],
            rendered_width: 30.0,
            ..Default::default()
        };
        let cols = cols_of(&import_table(&pasted, &ImportOptions::default()));
        assert!(cols.iter().all(|c| c.width == 26.0 && !c.full));
    }

    #[test]
    fn test_spanning_cells_anchor_by_grid_position() {
        let mut spanning = PastedCell::text("wide");
        spanning.colspan = 2;
        spanning.rowspan = 2;
        let pasted = PastedTable {
            rows: vec![
                PastedRow {
                    cells: vec![spanning, PastedCell::text("x")],
                },
                PastedRow {
                    cells: vec![PastedCell::text("y")],
                },
            ],
            ..Default::default()
        };
        let delta = import_table(&pasted, &ImportOptions::default());
        let cols = cols_of(&delta);
        let cells = cells_of(&delta);
        assert_eq!(cols.len(), 3);
        assert_eq!(cells[0].col_id, cols[0].col_id);
        assert_eq!(cells[1].col_id, cols[2].col_id);
        assert_eq!(cells[2].col_id, cols[2].col_id);
        assert_ne!(cells[0].row_id, cells[2].row_id);
    }

    #[test]
    fn test_oversized_spans_are_bounded() {
        let pasted: PastedTable = serde_json::from_str(
            r#"{"rows":[{"cells":[{"colspan":18446744073709551615,"rowspan":1e30,"lines":["a"]}]}]}"#,
        )
        .unwrap();
        assert_eq!(pasted.rows[0].cells[0].colspan, MAX_SPAN);
        let cells = cells_of(&import_table(&pasted, &ImportOptions::default()));
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].rowspan, 1);
        assert_eq!(cells[0].colspan, MAX_SPAN);

        // Spans built in code are bounded by the declared columns and the remaining rows
        let mut wide = PastedCell::text("wide");
        wide.colspan = usize::MAX;
        wide.rowspan = usize::MAX;
        let pasted = PastedTable {
            cols: vec![PastedCol::default(), PastedCol::default()],
            rows: vec![
                PastedRow { cells: vec![wide] },
                PastedRow { cells: Vec::new() },
            ],
            ..Default::default()
        };
        let delta = import_table(&pasted, &ImportOptions::default());
        let cells = cells_of(&delta);
        assert_eq!(cols_of(&delta).len(), 2);
        assert_eq!((cells[0].rowspan, cells[0].colspan), (2, 2));
    }

    #[test]
    fn test_source_col_ids_kept_and_widths_converted() {
        let pasted = PastedTable {
            cols: vec![
                PastedCol {
                    col_id: Some(ColId::from("keep")),
                    width: Some("100px".into()),
                    full: false,
                },
                PastedCol {
                    col_id: None,
                    width: Some("300px".into()),
                    full: false,
                },
            ],
            rows: vec![unit_row(2)],
            rendered_width: 400.0,
        };
        let options = ImportOptions {
            full_width: true,
            ..Default::default()
        };
        let cols = cols_of(&import_table(&pasted, &options));
        assert_eq!(cols[0].col_id, ColId::from("keep"));
        assert_eq!(cols[0].width, 25.0);
        assert_eq!(cols[1].width, 75.0);
    }

    #[test]
    fn test_import_builds_a_table() {
        let pasted = PastedTable {
            rows: vec![unit_row(2), unit_row(2)],
            ..Default::default()
        };
        let delta = Delta::new()
            .concat(import_table(&pasted, &ImportOptions::default()))
            .insert("\n", None);
        let doc = from_delta(&delta).unwrap();
        let tables = doc.descendants_of_type(doc.root(), NodeType::Table).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(
            doc.descendants_of_type(tables[0], NodeType::Cell).unwrap().len(),
            4
        );
    }
}
