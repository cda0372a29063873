//! Edit batches
//!
//! A `Delta` is an ordered list of operations walked against the flattened
//! document: `retain` keeps characters (optionally re-formatting the
//! newlines it passes), `insert` adds text, `delete` drops characters.
//! Block formats only ever live on newline characters.

use serde::{Deserialize, Serialize};
use tessera_core::Document;
use tracing::debug;

use crate::error::{DeltaError, Result};
use crate::line::{document_lines, rebuild, Line, LineFormat};

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Op {
    Insert {
        insert: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<LineFormat>,
    },
    Retain {
        retain: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<LineFormat>,
    },
    Delete {
        delete: usize,
    },
}

impl Op {
    /// Number of document characters this operation produces or consumes
    pub fn len(&self) -> usize {
        match self {
            Self::Insert { insert, .. } => insert.chars().count(),
            Self::Retain { retain, .. } => *retain,
            Self::Delete { delete } => *delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered batch of edit operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, text: impl Into<String>, attributes: Option<LineFormat>) -> Self {
        self.push(Op::Insert {
            insert: text.into(),
            attributes,
        });
        self
    }

    pub fn retain(mut self, count: usize) -> Self {
        self.push(Op::Retain {
            retain: count,
            attributes: None,
        });
        self
    }

    /// Retain `count` characters, applying `format` to every newline among them
    pub fn format(mut self, count: usize, format: LineFormat) -> Self {
        self.push(Op::Retain {
            retain: count,
            attributes: Some(format),
        });
        self
    }

    pub fn delete(mut self, count: usize) -> Self {
        self.push(Op::Delete { delete: count });
        self
    }

    /// Append an operation, merging it into the previous one when compatible
    pub fn push(&mut self, op: Op) {
        if op.is_empty() {
            return;
        }
        let merged = match (self.ops.last_mut(), &op) {
            (
                Some(Op::Insert {
                    insert: last,
                    attributes: last_attrs,
                }),
                Op::Insert { insert, attributes },
            ) if last_attrs == attributes => {
                last.push_str(insert);
                true
            }
            (
                Some(Op::Retain {
                    retain: last,
                    attributes: None,
                }),
                Op::Retain {
                    retain,
                    attributes: None,
                },
            ) => {
                *last = last.saturating_add(*retain);
                true
            }
            (Some(Op::Delete { delete: last }), Op::Delete { delete }) => {
                *last = last.saturating_add(*delete);
                true
            }
            _ => false,
        };
        if !merged {
            self.ops.push(op);
        }
    }

    /// Append every operation of `other`
    pub fn concat(mut self, other: Delta) -> Self {
        for op in other.ops {
            self.push(op);
        }
        self
    }

    /// Length of the document an insert-only delta describes
    pub fn document_length(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Insert { .. }))
            .map(Op::len)
            .sum()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Char(char),
    Break(Option<LineFormat>),
}

fn to_items(lines: Vec<Line>) -> Vec<Item> {
    let mut items = Vec::new();
    for line in lines {
        items.extend(line.text.chars().map(Item::Char));
        items.push(Item::Break(line.format));
    }
    items
}

fn to_lines(items: Vec<Item>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut text = String::new();
    for item in items {
        match item {
            Item::Char(c) => text.push(c),
            Item::Break(format) => lines.push(Line::new(std::mem::take(&mut text), format)),
        }
    }
    if !text.is_empty() {
        lines.push(Line::new(text, None));
    }
    lines
}

fn push_text(out: &mut Vec<Item>, text: &str, format: &Option<LineFormat>) {
    for c in text.chars() {
        if c == '\n' {
            out.push(Item::Break(format.clone()));
        } else {
            out.push(Item::Char(c));
        }
    }
}

/// Apply a delta to the document and re-derive the tree
///
/// Node handles taken before the call are invalidated.
pub fn apply_delta(doc: &mut Document, delta: &Delta) -> Result<()> {
    let items = to_items(document_lines(doc)?);
    let length = items.len();
    let mut out = Vec::with_capacity(length + delta.document_length());
    let mut cursor: usize = 0;

    for op in &delta.ops {
        match op {
            Op::Insert { insert, attributes } => push_text(&mut out, insert, attributes),
            Op::Retain { retain, attributes } => {
                let end = cursor.saturating_add(*retain);
                if end > length {
                    return Err(DeltaError::OutOfRange {
                        op: "retain",
                        requested: end,
                        length,
                    });
                }
                for item in &items[cursor..end] {
                    match (item, attributes) {
                        (Item::Break(_), Some(format)) => out.push(Item::Break(Some(format.clone()))),
                        _ => out.push(item.clone()),
                    }
                }
                cursor = end;
            }
            Op::Delete { delete } => {
                let end = cursor.saturating_add(*delete);
                if end > length {
                    return Err(DeltaError::OutOfRange {
                        op: "delete",
                        requested: end,
                        length,
                    });
                }
                cursor = end;
            }
        }
    }
    out.extend_from_slice(&items[cursor..]);
    if !matches!(out.last(), Some(Item::Break(_))) {
        out.push(Item::Break(None));
    }

    let lines = to_lines(out);
    debug!("Applying delta with {} ops, {} lines result", delta.ops.len(), lines.len());
    rebuild(doc, &lines)?;
    Ok(())
}

/// Serialize a document as an insert-only delta
pub fn to_delta(doc: &Document) -> Result<Delta> {
    let mut delta = Delta::new();
    for line in document_lines(doc)? {
        delta = delta.insert(line.text, None).insert("\n", line.format);
    }
    Ok(delta)
}

/// Build a document from an insert-only delta
pub fn from_delta(delta: &Delta) -> Result<Document> {
    let mut doc = Document::new();
    apply_delta(&mut doc, delta)?;
    doc.take_mutations();
    Ok(doc)
}
