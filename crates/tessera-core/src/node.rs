//! Node kinds stored in the document tree

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CellAttrs, CellInnerAttrs, ColAttrs, RowAttrs, TableAttrs};

/// Discriminant of a [`NodeKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Paragraph,
    CodeBlock,
    Table,
    ColGroup,
    Col,
    Body,
    Row,
    Cell,
    CellInner,
}

impl NodeType {
    /// Markup tag reported for nodes of this type
    pub fn tag(self) -> Tag {
        match self {
            Self::Root => Tag::Div,
            Self::Paragraph | Self::CellInner => Tag::P,
            Self::CodeBlock => Tag::Pre,
            Self::Table => Tag::Table,
            Self::ColGroup => Tag::Colgroup,
            Self::Col => Tag::Col,
            Self::Body => Tag::Tbody,
            Self::Row => Tag::Tr,
            Self::Cell => Tag::Td,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Root => "scroll",
            Self::Paragraph => "block",
            Self::CodeBlock => "code-block",
            Self::Table => "table",
            Self::ColGroup => "colgroup",
            Self::Col => "col",
            Self::Body => "tbody",
            Self::Row => "tr",
            Self::Cell => "td",
            Self::CellInner => "tableCellInner",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Markup tag of a node, as seen by mutation observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tag {
    Div,
    P,
    Pre,
    Table,
    Colgroup,
    Col,
    Tbody,
    Tr,
    Td,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Div => "DIV",
            Self::P => "P",
            Self::Pre => "PRE",
            Self::Table => "TABLE",
            Self::Colgroup => "COLGROUP",
            Self::Col => "COL",
            Self::Tbody => "TBODY",
            Self::Tr => "TR",
            Self::Td => "TD",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text content of a line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Everything a node can be
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Paragraph(Paragraph),
    CodeBlock(Paragraph),
    Table(TableAttrs),
    ColGroup,
    Col(ColAttrs),
    Body,
    Row(RowAttrs),
    Cell(CellAttrs),
    CellInner(CellInnerAttrs),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Root => NodeType::Root,
            Self::Paragraph(_) => NodeType::Paragraph,
            Self::CodeBlock(_) => NodeType::CodeBlock,
            Self::Table(_) => NodeType::Table,
            Self::ColGroup => NodeType::ColGroup,
            Self::Col(_) => NodeType::Col,
            Self::Body => NodeType::Body,
            Self::Row(_) => NodeType::Row,
            Self::Cell(_) => NodeType::Cell,
            Self::CellInner(_) => NodeType::CellInner,
        }
    }

    pub fn tag(&self) -> Tag {
        self.node_type().tag()
    }

    /// Text of a paragraph or code block line
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Paragraph(p) | Self::CodeBlock(p) => Some(&p.text),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableAttrs> {
        match self {
            Self::Table(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_col(&self) -> Option<&ColAttrs> {
        match self {
            Self::Col(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_col_mut(&mut self) -> Option<&mut ColAttrs> {
        match self {
            Self::Col(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&RowAttrs> {
        match self {
            Self::Row(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellAttrs> {
        match self {
            Self::Cell(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_cell_mut(&mut self) -> Option<&mut CellAttrs> {
        match self {
            Self::Cell(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_cell_inner(&self) -> Option<&CellInnerAttrs> {
        match self {
            Self::CellInner(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_cell_inner_mut(&mut self) -> Option<&mut CellInnerAttrs> {
        match self {
            Self::CellInner(attrs) => Some(attrs),
            _ => None,
        }
    }
}
