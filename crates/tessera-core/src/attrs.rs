//! Attribute bags carried by table nodes
//!
//! Column and cell-inner bags are the persisted representation of table
//! structure. They serialize with the camelCase keys used on the wire:
//! `{tableId, colId, width, full}` and `{tableId, rowId, colId, rowspan, colspan, style}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ColId, RowId, TableId};

/// Unit of a column width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthUnit {
    Percent,
    Pixel,
}

impl WidthUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Pixel => "px",
        }
    }
}

/// Parse a CSS length such as `"33.3%"`, `"160px"` or `"42"` into its number
pub fn parse_css_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed
        .strip_suffix('%')
        .or_else(|| trimmed.strip_suffix("px"))
        .unwrap_or(trimmed)
        .trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Attributes of a table node
#[derive(Debug, Clone, PartialEq)]
pub struct TableAttrs {
    pub table_id: TableId,
    /// Full-width tables size columns in percent, fixed-width tables in pixels
    pub full: bool,
}

/// Attributes of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawColAttrs", try_from = "RawColAttrs")]
pub struct ColAttrs {
    pub table_id: TableId,
    pub col_id: ColId,
    pub width: f64,
    pub full: bool,
}

impl ColAttrs {
    pub fn unit(&self) -> WidthUnit {
        if self.full {
            WidthUnit::Percent
        } else {
            WidthUnit::Pixel
        }
    }

    /// Width rendered as a CSS length
    pub fn width_css(&self) -> String {
        format!("{}{}", self.width, self.unit().suffix())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColAttrs {
    table_id: TableId,
    col_id: ColId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<RawNumber>,
    #[serde(default)]
    full: bool,
}

impl From<ColAttrs> for RawColAttrs {
    fn from(attrs: ColAttrs) -> Self {
        Self {
            width: Some(RawNumber::Text(attrs.width_css())),
            table_id: attrs.table_id,
            col_id: attrs.col_id,
            full: attrs.full,
        }
    }
}

impl TryFrom<RawColAttrs> for ColAttrs {
    type Error = String;

    fn try_from(raw: RawColAttrs) -> Result<Self, Self::Error> {
        let width = match raw.width {
            Some(width) => width
                .as_f64()
                .ok_or_else(|| format!("invalid column width for {}", raw.col_id))?,
            None => 0.0,
        };
        Ok(Self {
            table_id: raw.table_id,
            col_id: raw.col_id,
            width,
            full: raw.full,
        })
    }
}

/// A number as it appears in markup-derived attribute bags
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_css_number(s),
        }
    }
}

/// Largest rowspan or colspan accepted from markup, pasted content or saved documents
pub const MAX_SPAN: usize = 1000;

/// Bound a span read from outside input to `1..=MAX_SPAN`
pub fn clamp_span(span: usize) -> usize {
    span.clamp(1, MAX_SPAN)
}

/// Read a span written as a number or numeric string; missing or invalid values become 1
pub fn deserialize_span<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    let span = raw.and_then(|r| r.as_f64()).unwrap_or(1.0);
    // Float casts saturate and map NaN to 0
    Ok(clamp_span(span as usize))
}

fn default_span() -> usize {
    1
}

/// Attributes of a row
#[derive(Debug, Clone, PartialEq)]
pub struct RowAttrs {
    pub row_id: RowId,
}

/// Attributes of a cell, mirrored on its inner node
#[derive(Debug, Clone, PartialEq)]
pub struct CellAttrs {
    pub row_id: RowId,
    pub col_id: ColId,
    pub rowspan: usize,
    pub colspan: usize,
    pub style: CellStyle,
}

/// Attributes of a cell's content-bearing inner node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellInnerAttrs {
    pub table_id: TableId,
    pub row_id: RowId,
    pub col_id: ColId,
    #[serde(default = "default_span", deserialize_with = "deserialize_span")]
    pub rowspan: usize,
    #[serde(default = "default_span", deserialize_with = "deserialize_span")]
    pub colspan: usize,
    #[serde(default)]
    pub style: CellStyle,
}

impl CellInnerAttrs {
    /// A single-span, unstyled cell
    pub fn unit(table_id: TableId, row_id: RowId, col_id: ColId) -> Self {
        Self {
            table_id,
            row_id,
            col_id,
            rowspan: 1,
            colspan: 1,
            style: CellStyle::default(),
        }
    }

    /// The attribute set the outer cell mirrors
    pub fn cell_attrs(&self) -> CellAttrs {
        CellAttrs {
            row_id: self.row_id.clone(),
            col_id: self.col_id.clone(),
            rowspan: self.rowspan,
            colspan: self.colspan,
            style: self.style.clone(),
        }
    }
}

impl CellAttrs {
    /// Rebuild the inner attribute bag for a cell of `table_id`
    pub fn inner_attrs(&self, table_id: TableId) -> CellInnerAttrs {
        CellInnerAttrs {
            table_id,
            row_id: self.row_id.clone(),
            col_id: self.col_id.clone(),
            rowspan: self.rowspan,
            colspan: self.colspan,
            style: self.style.clone(),
        }
    }
}

/// Inline CSS declarations of a cell, keyed by property name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStyle(BTreeMap<String, String>);

impl CellStyle {
    /// Parse CSS text like `"background-color: #fff; border-color: red"`
    pub fn parse(css: &str) -> Self {
        let declarations = css
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let (name, value) = (name.trim(), value.trim());
                if name.is_empty() || value.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.to_string()))
            })
            .collect();
        Self(declarations)
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply a patch; `None` values clear the property
    pub fn apply(&mut self, patch: &StylePatch) {
        for (property, value) in &patch.0 {
            match value {
                Some(value) => {
                    self.0.insert(property.clone(), value.clone());
                }
                None => {
                    self.0.remove(property);
                }
            }
        }
    }

    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for CellStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl Serialize for CellStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for CellStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let css = Option::<String>::deserialize(deserializer)?;
        Ok(css.map(|css| Self::parse(&css)).unwrap_or_default())
    }
}

/// A set of style changes applied to selected cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePatch(BTreeMap<String, Option<String>>);

impl StylePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(property.into(), Some(value.into()));
        self
    }

    pub fn clear(mut self, property: impl Into<String>) -> Self {
        self.0.insert(property.into(), None);
        self
    }

    /// Set or clear `background-color`
    pub fn background_color(color: Option<&str>) -> Self {
        Self::color("background-color", color)
    }

    /// Set or clear `border-color`
    pub fn border_color(color: Option<&str>) -> Self {
        Self::color("border-color", color)
    }

    fn color(property: &str, color: Option<&str>) -> Self {
        match color {
            Some(color) => Self::new().set(property, color),
            None => Self::new().clear(property),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
