//! Drag selection over rendered cells
//!
//! The drag rectangle grows to the union of every cell it touches until a
//! pass adds nothing, so a selection always covers a full block of cells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tessera_core::{Document, NodeId};

use crate::cell;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `(x, y)` is the top-left corner, `(x1, y1)` the bottom-right
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, x1: f64, y1: f64) -> Self {
        Self { x, y, x1, y1 }
    }

    /// Smallest rectangle containing both points
    pub fn spanning(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y
    }

    /// Whether the rectangles overlap by more than `tolerance` on both axes
    pub fn intersects(&self, other: &Rect, tolerance: f64) -> bool {
        self.x + tolerance < other.x1
            && other.x + tolerance < self.x1
            && self.y + tolerance < other.y1
            && other.y + tolerance < self.y1
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }
}

/// Rendered bounds of one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBox {
    pub cell: NodeId,
    pub rect: Rect,
}

/// Position and scroll offset of the table container; both are subtracted
/// from the selection boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub origin: Point,
    pub scroll: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Cell inners of the selected cells, in document order
    pub cells: Vec<NodeId>,
    /// Selection bounds relative to the viewport
    pub boundary: Rect,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Cells selected by dragging from `start` to `end`
pub fn compute_selection(
    doc: &Document,
    start: Point,
    end: Point,
    boxes: &[CellBox],
    viewport: Viewport,
    tolerance: f64,
) -> Result<Selection> {
    let mut bounds = Rect::spanning(start, end);
    let mut taken = vec![false; boxes.len()];
    loop {
        let mut grew = false;
        for (index, candidate) in boxes.iter().enumerate() {
            if taken[index] || !candidate.rect.intersects(&bounds, tolerance) {
                continue;
            }
            taken[index] = true;
            bounds = bounds.union(&candidate.rect);
            grew = true;
        }
        if !grew {
            break;
        }
    }

    let mut cells = Vec::new();
    for (candidate, _) in boxes.iter().zip(&taken).filter(|(_, taken)| **taken) {
        let outer = cell::resolve(doc, candidate.cell)?;
        if let Some(inner) = cell::inner(doc, outer)? {
            if !cells.contains(&inner) {
                cells.push(inner);
            }
        }
    }
    if cells.is_empty() {
        return Ok(Selection::default());
    }
    let order: HashMap<NodeId, usize> = doc
        .descendants(doc.root())?
        .into_iter()
        .enumerate()
        .map(|(position, node)| (node, position))
        .collect();
    cells.sort_by_key(|node| order.get(node).copied().unwrap_or(usize::MAX));

    Ok(Selection {
        cells,
        boundary: bounds.translate(
            -viewport.origin.x - viewport.scroll.x,
            -viewport.origin.y - viewport.scroll.y,
        ),
    })
}
