//! The table module of an editing session

use std::time::Instant;

use tessera_core::{Document, Mutation, NodeId, StylePatch, Tag};
use tessera_delta::{apply_delta, import_table, Delta, PastedTable};
use tessera_table::{
    append_col, append_row, check_insert_position, compute_selection, insert_table, merge_cells,
    rebalance_all, remove_col, remove_row, remove_table, resize_column, set_style, split_cell,
    CellBox, InsertedTable, Point, RepairReport, Selection, TableConfig, Viewport,
};
use tracing::{debug, info};

use crate::debounce::Debouncer;
use crate::error::Result;

/// A table menu command acting on the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand {
    InsertColumnLeft,
    InsertColumnRight,
    InsertRowAbove,
    InsertRowBelow,
    RemoveColumn,
    RemoveRow,
    RemoveTable,
    MergeCells,
    SplitCell,
    SetBackgroundColor(String),
    ClearBackgroundColor,
    SetBorderColor(String),
    ClearBorderColor,
}

impl TableCommand {
    /// Parse a menu key; colour commands take their colour from `color`
    pub fn from_menu_key(key: &str, color: Option<&str>) -> Option<Self> {
        let command = match key {
            "insertColumnLeft" => Self::InsertColumnLeft,
            "insertColumnRight" => Self::InsertColumnRight,
            "insertRowTop" => Self::InsertRowAbove,
            "insertRowBottom" => Self::InsertRowBelow,
            "removeCol" => Self::RemoveColumn,
            "removeRow" => Self::RemoveRow,
            "removeTable" => Self::RemoveTable,
            "mergeCell" => Self::MergeCells,
            "splitCell" => Self::SplitCell,
            "setBackgroundColor" => Self::SetBackgroundColor(color?.to_string()),
            "clearBackgroundColor" => Self::ClearBackgroundColor,
            "setBorderColor" => Self::SetBorderColor(color?.to_string()),
            "clearBorderColor" => Self::ClearBorderColor,
            _ => return None,
        };
        Some(command)
    }

    pub fn menu_key(&self) -> &'static str {
        match self {
            Self::InsertColumnLeft => "insertColumnLeft",
            Self::InsertColumnRight => "insertColumnRight",
            Self::InsertRowAbove => "insertRowTop",
            Self::InsertRowBelow => "insertRowBottom",
            Self::RemoveColumn => "removeCol",
            Self::RemoveRow => "removeRow",
            Self::RemoveTable => "removeTable",
            Self::MergeCells => "mergeCell",
            Self::SplitCell => "splitCell",
            Self::SetBackgroundColor(_) => "setBackgroundColor",
            Self::ClearBackgroundColor => "clearBackgroundColor",
            Self::SetBorderColor(_) => "setBorderColor",
            Self::ClearBorderColor => "clearBorderColor",
        }
    }

    /// Style commands leave the table layout and the selection alone
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Self::SetBackgroundColor(_)
                | Self::ClearBackgroundColor
                | Self::SetBorderColor(_)
                | Self::ClearBorderColor
        )
    }
}

/// Tags whose mutation can break a table grid
pub fn triggers_repair(tag: Tag) -> bool {
    matches!(tag, Tag::Td | Tag::Tr | Tag::Tbody | Tag::Table)
}

/// Table state of one editing session
#[derive(Debug)]
pub struct TableModule {
    config: TableConfig,
    selection: Selection,
    debouncer: Debouncer,
}

impl Default for TableModule {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}

impl TableModule {
    pub fn new(config: TableConfig) -> Self {
        let debouncer = Debouncer::new(config.repair_debounce());
        Self {
            config,
            selection: Selection::default(),
            debouncer,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_cells(&self) -> &[NodeId] {
        &self.selection.cells
    }

    /// Replace the selection with the given cell or cell-inner handles
    pub fn select_cells(&mut self, cells: Vec<NodeId>) {
        self.selection = Selection {
            cells,
            ..Selection::default()
        };
    }

    /// Select the cells touched by a drag from `start` to `end`
    pub fn select_by_drag(
        &mut self,
        doc: &Document,
        start: Point,
        end: Point,
        boxes: &[CellBox],
        viewport: Viewport,
    ) -> Result<&Selection> {
        self.selection = compute_selection(
            doc,
            start,
            end,
            boxes,
            viewport,
            self.config.selection_tolerance,
        )?;
        Ok(&self.selection)
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Typing invalidates the cell selection
    pub fn on_text_change(&mut self) {
        self.clear_selection();
    }

    pub fn insert_table(
        &mut self,
        doc: &mut Document,
        offset: usize,
        rows: usize,
        columns: usize,
    ) -> Result<InsertedTable> {
        let inserted = insert_table(doc, offset, rows, columns, &self.config)?;
        // The document tree was re-derived; old handles are gone
        self.clear_selection();
        Ok(inserted)
    }

    /// Run a menu command against the current selection
    pub fn execute(&mut self, doc: &mut Document, command: &TableCommand) -> Result<()> {
        let selected = self.selection.cells.clone();
        debug!("Executing {} on {} cells", command.menu_key(), selected.len());
        match command {
            TableCommand::InsertColumnLeft => {
                append_col(doc, &selected, false, &self.config)?;
            }
            TableCommand::InsertColumnRight => {
                append_col(doc, &selected, true, &self.config)?;
            }
            TableCommand::InsertRowAbove => {
                append_row(doc, &selected, false)?;
            }
            TableCommand::InsertRowBelow => {
                append_row(doc, &selected, true)?;
            }
            TableCommand::RemoveColumn => {
                remove_col(doc, &selected)?;
            }
            TableCommand::RemoveRow => {
                remove_row(doc, &selected)?;
            }
            TableCommand::RemoveTable => remove_table(doc, &selected)?,
            TableCommand::MergeCells => {
                merge_cells(doc, &selected)?;
            }
            TableCommand::SplitCell => split_cell(doc, &selected)?,
            TableCommand::SetBackgroundColor(color) => {
                set_style(doc, &selected, &StylePatch::background_color(Some(color.as_str())))?
            }
            TableCommand::ClearBackgroundColor => {
                set_style(doc, &selected, &StylePatch::background_color(None))?
            }
            TableCommand::SetBorderColor(color) => {
                set_style(doc, &selected, &StylePatch::border_color(Some(color.as_str())))?
            }
            TableCommand::ClearBorderColor => {
                set_style(doc, &selected, &StylePatch::border_color(None))?
            }
        }
        if command.is_structural() {
            self.clear_selection();
        }
        Ok(())
    }

    /// Commit a column resize on the table containing `node`
    pub fn resize_column(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        index: usize,
        width: f64,
    ) -> Result<()> {
        Ok(resize_column(doc, node, index, width, &self.config)?)
    }

    /// Paste a table at `offset`, re-keyed and with widths in this editor's mode
    pub fn paste_table(
        &mut self,
        doc: &mut Document,
        offset: usize,
        pasted: &PastedTable,
    ) -> Result<()> {
        if pasted.rows.is_empty() {
            return Ok(());
        }
        check_insert_position(doc, offset)?;
        let imported = import_table(pasted, &self.config.import_options());
        let delta = Delta::new().retain(offset).insert("\n", None).concat(imported);
        apply_delta(doc, &delta)?;
        self.clear_selection();
        info!("Pasted table with {} rows at offset {}", pasted.rows.len(), offset);
        Ok(())
    }

    /// Drain the document's mutation log, scheduling a repair when a table changed
    pub fn observe(&mut self, doc: &mut Document, now: Instant) -> bool {
        let mutations = doc.take_mutations();
        self.observe_mutations(&mutations, now)
    }

    pub fn observe_mutations(&mut self, mutations: &[Mutation], now: Instant) -> bool {
        let Some(mutation) = mutations.iter().find(|m| triggers_repair(m.tag)) else {
            return false;
        };
        debug!("Scheduling table repair after change to {}", mutation.tag);
        self.debouncer.trigger(now);
        true
    }

    pub fn repair_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Rebalance every table once the quiet period after the last table mutation is over
    pub fn poll_repair(&mut self, doc: &mut Document, now: Instant) -> Result<Option<RepairReport>> {
        self.observe(doc, now);
        if !self.debouncer.poll(now) {
            return Ok(None);
        }
        let report = rebalance_all(doc)?;
        // The pass's own edits must not schedule another pass
        doc.take_mutations();
        self.selection.cells.retain(|cell| doc.contains(*cell));
        if !report.is_noop() {
            info!("Table repair pass: {:?}", report);
        }
        Ok(Some(report))
    }
}
