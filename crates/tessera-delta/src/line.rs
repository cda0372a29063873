//! Line model
//!
//! A document flattens to a sequence of lines, each ending in a newline that
//! carries the line's block format. Table structure is encoded entirely in
//! those formats, so the tree can always be re-derived from the lines:
//! consecutive lines sharing a table id form one table, a row id one row,
//! and a (row id, col id) pair one cell.

use serde::{Deserialize, Serialize};
use tessera_core::{
    CellInnerAttrs, ColAttrs, ColId, Document, NodeId, NodeKind, NodeType, Paragraph, RowAttrs,
    RowId, TableAttrs, TableId,
};

use crate::error::Result;

/// Block format carried by a line's trailing newline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineFormat {
    #[serde(rename = "code-block")]
    CodeBlock(bool),
    #[serde(rename = "col")]
    Col(ColAttrs),
    #[serde(rename = "tableCellInner")]
    CellInner(CellInnerAttrs),
}

impl LineFormat {
    pub fn table_id(&self) -> Option<&TableId> {
        match self {
            Self::CodeBlock(_) => None,
            Self::Col(attrs) => Some(&attrs.table_id),
            Self::CellInner(attrs) => Some(&attrs.table_id),
        }
    }
}

/// One line of a document
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub format: Option<LineFormat>,
}

impl Line {
    pub fn new(text: impl Into<String>, format: Option<LineFormat>) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    /// Length in characters, trailing newline included
    pub fn len(&self) -> usize {
        self.text.chars().count() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A line together with the block node that holds it
#[derive(Debug, Clone, PartialEq)]
pub struct LineNode {
    pub node: NodeId,
    pub line: Line,
}

/// Position of a document offset inside a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePosition {
    pub node: NodeId,
    pub line_index: usize,
    pub line_start: usize,
    pub offset: usize,
    pub line_len: usize,
}

/// Flatten a document into lines
pub fn document_lines(doc: &Document) -> Result<Vec<Line>> {
    Ok(line_nodes(doc)?.into_iter().map(|ln| ln.line).collect())
}

/// Flatten a document into lines, keeping the node of each line
pub fn line_nodes(doc: &Document) -> Result<Vec<LineNode>> {
    let mut out = Vec::new();
    for child in doc.children(doc.root())? {
        collect_block(doc, *child, &mut out)?;
    }
    Ok(out)
}

fn collect_block(doc: &Document, node: NodeId, out: &mut Vec<LineNode>) -> Result<()> {
    match doc.kind(node)? {
        NodeKind::Paragraph(p) => out.push(LineNode {
            node,
            line: Line::new(p.text.clone(), None),
        }),
        NodeKind::CodeBlock(p) => out.push(LineNode {
            node,
            line: Line::new(p.text.clone(), Some(LineFormat::CodeBlock(true))),
        }),
        NodeKind::Table(attrs) => collect_table(doc, node, &attrs.table_id, out)?,
        _ => {
            for child in doc.children(node)? {
                collect_block(doc, *child, out)?;
            }
        }
    }
    Ok(())
}

fn collect_table(
    doc: &Document,
    table: NodeId,
    table_id: &TableId,
    out: &mut Vec<LineNode>,
) -> Result<()> {
    for col in doc.descendants_of_type(table, NodeType::Col)? {
        if let Some(attrs) = doc.kind(col)?.as_col() {
            let mut attrs = attrs.clone();
            attrs.table_id = table_id.clone();
            out.push(LineNode {
                node: col,
                line: Line::new("", Some(LineFormat::Col(attrs))),
            });
        }
    }
    for row in doc.descendants_of_type(table, NodeType::Row)? {
        let Some(row_id) = doc.kind(row)?.as_row().map(|r| r.row_id.clone()) else {
            continue;
        };
        for cell in doc.children_of_type(row, NodeType::Cell)? {
            collect_cell(doc, cell, table_id, &row_id, out)?;
        }
    }
    Ok(())
}

fn collect_cell(
    doc: &Document,
    cell: NodeId,
    table_id: &TableId,
    row_id: &RowId,
    out: &mut Vec<LineNode>,
) -> Result<()> {
    let inner = doc.first_child_of_type(cell, NodeType::CellInner)?;
    let mut attrs = match inner.map(|i| doc.kind(i)).transpose()? {
        Some(NodeKind::CellInner(attrs)) => attrs.clone(),
        _ => match doc.kind(cell)?.as_cell() {
            Some(cell_attrs) => cell_attrs.inner_attrs(table_id.clone()),
            None => return Ok(()),
        },
    };
    attrs.table_id = table_id.clone();
    attrs.row_id = row_id.clone();

    let paragraphs = match inner {
        Some(inner) => doc.children_of_type(inner, NodeType::Paragraph)?,
        None => Vec::new(),
    };
    if paragraphs.is_empty() {
        out.push(LineNode {
            node: inner.unwrap_or(cell),
            line: Line::new("", Some(LineFormat::CellInner(attrs))),
        });
        return Ok(());
    }
    for paragraph in paragraphs {
        let text = doc.kind(paragraph)?.text().unwrap_or_default().to_string();
        out.push(LineNode {
            node: paragraph,
            line: Line::new(text, Some(LineFormat::CellInner(attrs.clone()))),
        });
    }
    Ok(())
}

/// Total length of a document in characters
pub fn document_length(doc: &Document) -> Result<usize> {
    Ok(document_lines(doc)?.iter().map(Line::len).sum())
}

/// Locate the line containing `offset`; a line's newline belongs to that line
pub fn line_at(doc: &Document, offset: usize) -> Result<Option<LinePosition>> {
    let mut start = 0;
    for (line_index, entry) in line_nodes(doc)?.into_iter().enumerate() {
        let len = entry.line.len();
        if offset < start + len {
            return Ok(Some(LinePosition {
                node: entry.node,
                line_index,
                line_start: start,
                offset: offset - start,
                line_len: len,
            }));
        }
        start += len;
    }
    Ok(None)
}

/// Replace the content of `doc` with the tree derived from `lines`
pub fn rebuild(doc: &mut Document, lines: &[Line]) -> Result<()> {
    let root = doc.root();
    for child in doc.children(root)?.to_vec() {
        doc.remove(child)?;
    }
    let mut builder = TreeBuilder::default();
    for line in lines {
        builder.push(doc, line)?;
    }
    Ok(())
}

#[derive(Default)]
struct TreeBuilder {
    table: Option<(NodeId, TableId)>,
    row: Option<(NodeId, RowId)>,
    cell: Option<(NodeId, RowId, ColId)>,
}

impl TreeBuilder {
    fn push(&mut self, doc: &mut Document, line: &Line) -> Result<()> {
        match &line.format {
            None => {
                self.close();
                let node = doc.create(NodeKind::Paragraph(Paragraph::new(line.text.clone())));
                doc.append_child(doc.root(), node)?;
            }
            Some(LineFormat::CodeBlock(_)) => {
                self.close();
                let node = doc.create(NodeKind::CodeBlock(Paragraph::new(line.text.clone())));
                doc.append_child(doc.root(), node)?;
            }
            Some(LineFormat::Col(attrs)) => {
                let table = self.table(doc, &attrs.table_id, attrs.full)?;
                let colgroup = ensure_section(doc, table, NodeType::ColGroup)?;
                let last = doc.children(colgroup)?.last().copied();
                let duplicate = match last {
                    Some(last) => doc
                        .kind(last)?
                        .as_col()
                        .is_some_and(|c| c.col_id == attrs.col_id),
                    None => false,
                };
                if !duplicate {
                    let col = doc.create(NodeKind::Col(attrs.clone()));
                    doc.append_child(colgroup, col)?;
                }
            }
            Some(LineFormat::CellInner(attrs)) => {
                let table = self.table(doc, &attrs.table_id, false)?;
                let inner = self.cell(doc, table, attrs)?;
                let paragraph = doc.create(NodeKind::Paragraph(Paragraph::new(line.text.clone())));
                doc.append_child(inner, paragraph)?;
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.table = None;
        self.row = None;
        self.cell = None;
    }

    fn table(&mut self, doc: &mut Document, table_id: &TableId, full: bool) -> Result<NodeId> {
        if let Some((node, id)) = &self.table {
            if id == table_id {
                return Ok(*node);
            }
        }
        self.close();
        let node = doc.create(NodeKind::Table(TableAttrs {
            table_id: table_id.clone(),
            full,
        }));
        doc.append_child(doc.root(), node)?;
        self.table = Some((node, table_id.clone()));
        Ok(node)
    }

    fn cell(&mut self, doc: &mut Document, table: NodeId, attrs: &CellInnerAttrs) -> Result<NodeId> {
        if let Some((inner, row_id, col_id)) = &self.cell {
            if *row_id == attrs.row_id && *col_id == attrs.col_id {
                return Ok(*inner);
            }
        }
        let row = match &self.row {
            Some((row, row_id)) if *row_id == attrs.row_id => *row,
            _ => {
                let body = ensure_section(doc, table, NodeType::Body)?;
                let row = doc.create(NodeKind::Row(RowAttrs {
                    row_id: attrs.row_id.clone(),
                }));
                doc.append_child(body, row)?;
                self.row = Some((row, attrs.row_id.clone()));
                row
            }
        };
        let cell = doc.create(NodeKind::Cell(attrs.cell_attrs()));
        let inner = doc.create(NodeKind::CellInner(attrs.clone()));
        doc.append_child(cell, inner)?;
        doc.append_child(row, cell)?;
        self.cell = Some((inner, attrs.row_id.clone(), attrs.col_id.clone()));
        Ok(inner)
    }
}

/// The table's column group or body, created when missing
fn ensure_section(doc: &mut Document, table: NodeId, section: NodeType) -> Result<NodeId> {
    if let Some(existing) = doc.first_child_of_type(table, section)? {
        return Ok(existing);
    }
    let (kind, reference) = match section {
        NodeType::ColGroup => (NodeKind::ColGroup, doc.children(table)?.first().copied()),
        _ => (NodeKind::Body, None),
    };
    let node = doc.create(kind);
    doc.insert_before(table, node, reference)?;
    Ok(node)
}
