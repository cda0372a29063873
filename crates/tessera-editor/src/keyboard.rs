//! Keyboard guards
//!
//! A collapsed backspace or delete must never merge a line into a table or
//! pull a cell's content out of it.

use tessera_core::{Document, NodeId, NodeType};
use tessera_delta::line_at;

use crate::error::Result;

/// Whether `node` is the first (or last) line of its cell inner
fn is_inner_edge(doc: &Document, node: NodeId, last: bool) -> Result<bool> {
    let Some(inner) = doc.ancestor_of_type(node, NodeType::CellInner)? else {
        return Ok(false);
    };
    if inner == node {
        return Ok(true);
    }
    let lines = doc.children(inner)?;
    let edge = if last { lines.last() } else { lines.first() };
    Ok(edge == Some(&node))
}

fn sibling_is_table(sibling: Option<NodeId>, doc: &Document) -> Result<bool> {
    Ok(match sibling {
        Some(sibling) => doc.node_type(sibling)? == NodeType::Table,
        None => false,
    })
}

/// Whether a collapsed backspace at `offset` may run
pub fn allow_backspace(doc: &Document, offset: usize) -> Result<bool> {
    let Some(position) = line_at(doc, offset)? else {
        return Ok(true);
    };
    if position.offset != 0 {
        return Ok(true);
    }
    if sibling_is_table(doc.prev_sibling(position.node)?, doc)? {
        return Ok(false);
    }
    Ok(!is_inner_edge(doc, position.node, false)?)
}

/// Whether a collapsed delete at `offset` may run
pub fn allow_delete(doc: &Document, offset: usize) -> Result<bool> {
    let Some(position) = line_at(doc, offset)? else {
        return Ok(true);
    };
    if position.offset + 1 != position.line_len {
        return Ok(true);
    }
    if sibling_is_table(doc.next_sibling(position.node)?, doc)? {
        return Ok(false);
    }
    Ok(!is_inner_edge(doc, position.node, true)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{CellInnerAttrs, ColAttrs};
    use tessera_delta::{from_delta, Delta, LineFormat};

    /// "ab", a one-cell table holding "x" and "y", then "cd"
    fn document() -> Document {
        let cell = CellInnerAttrs::unit("t".into(), "r".into(), "c".into());
        let delta = Delta::new()
            .insert("ab\n", None)
            .insert(
                "\n",
                Some(LineFormat::Col(ColAttrs {
                    table_id: "t".into(),
                    col_id: "c".into(),
                    width: 100.0,
                    full: true,
                })),
            )
            .insert("x", None)
            .insert("\n", Some(LineFormat::CellInner(cell.clone())))
            .insert("y", None)
            .insert("\n", Some(LineFormat::CellInner(cell)))
            .insert("cd\n", None);
        from_delta(&delta).unwrap()
    }

    #[test]
    fn test_backspace_guards() {
        let doc = document();
        // ab=0..3 col=3 x=4..6 y=6..8 cd=8..11
        assert!(!allow_backspace(&doc, 8).unwrap());
        assert!(allow_backspace(&doc, 9).unwrap());
        assert!(!allow_backspace(&doc, 4).unwrap());
        assert!(allow_backspace(&doc, 6).unwrap());
        assert!(allow_backspace(&doc, 0).unwrap());
        assert!(allow_backspace(&doc, 11).unwrap());
    }

    #[test]
    fn test_delete_guards() {
        let doc = document();
        assert!(!allow_delete(&doc, 2).unwrap());
        assert!(allow_delete(&doc, 1).unwrap());
        assert!(allow_delete(&doc, 5).unwrap());
        assert!(!allow_delete(&doc, 7).unwrap());
        assert!(allow_delete(&doc, 10).unwrap());
    }
}
