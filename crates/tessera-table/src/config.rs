//! Table configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_delta::ImportOptions;

use crate::error::Result;

/// Tables must have fewer rows and fewer columns than this
pub const MAX_TABLE_DIMENSION: usize = 30;

/// Configuration for the table engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableConfig {
    /// New tables size their columns in percent of the surface
    pub full_width: bool,

    /// Width of the editing surface in pixels
    pub surface_width: f64,

    pub surface_padding_left: f64,

    pub surface_padding_right: f64,

    /// Narrowest column of a full-width table, in percent
    pub min_percent_width: f64,

    /// Narrowest column of a fixed-width table, in pixels
    pub min_pixel_width: f64,

    /// Width of a column added to a full-width table, in percent
    pub inserted_percent_width: f64,

    /// Width of a column added to a fixed-width table, in pixels
    pub inserted_pixel_width: f64,

    /// Slack in pixels when testing cell rectangles for overlap
    pub selection_tolerance: f64,

    /// Quiet period before the repair pass runs, in milliseconds
    pub repair_debounce_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            full_width: false,
            surface_width: 800.0,
            surface_padding_left: 12.0,
            surface_padding_right: 12.0,
            min_percent_width: 3.0,
            min_pixel_width: 26.0,
            inserted_percent_width: 6.0,
            inserted_pixel_width: 160.0,
            selection_tolerance: 4.0,
            repair_debounce_ms: 100,
        }
    }
}

impl TableConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file; absent keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Usable width of the editing surface
    pub fn content_width(&self) -> f64 {
        (self.surface_width - self.surface_padding_left - self.surface_padding_right).max(0.0)
    }

    /// Width given to a newly appended column
    pub fn inserted_width(&self, full: bool) -> f64 {
        if full {
            self.inserted_percent_width
        } else {
            self.inserted_pixel_width
        }
    }

    pub fn repair_debounce(&self) -> Duration {
        Duration::from_millis(self.repair_debounce_ms)
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            full_width: self.full_width,
            min_percent_width: self.min_percent_width,
            min_pixel_width: self.min_pixel_width,
        }
    }
}
