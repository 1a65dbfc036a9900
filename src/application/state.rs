//! Application state management for the data-entry panel.
//!
//! This module contains the main application state and mode management
//! for the terminal user interface.

use tracing::warn;

use super::panel::{PanelService, PanelSnapshot, SaveOutcome};
use crate::domain::{PanelLayout, RangeSynchronizer, Table};
use crate::infrastructure::RangeSource;

/// Represents the current mode of the application.
///
/// The application can be in different modes that determine how user input
/// is interpreted and what UI elements are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Normal navigation mode - arrow keys move selection, shortcuts available
    Normal,
    /// Cell editing mode - user is typing into a cell
    Editing,
    /// Choice popup is open for the dropdown column
    Choosing,
    /// Help screen is displayed
    Help,
    /// CSV export dialog is open
    ExportCsv,
}

/// Main application state: the two panel tables plus UI state.
///
/// # Examples
///
/// ```
/// use sheetpanel::application::App;
/// use sheetpanel::domain::PanelLayout;
///
/// let app = App::new(PanelLayout::default());
/// assert_eq!(app.inputs.height(), 31);
/// assert_eq!(app.inputs.width(), 5);
/// ```
#[derive(Debug)]
pub struct App {
    /// Pinned regions of the worksheet
    pub layout: PanelLayout,
    /// Editable input table (fixed shape)
    pub inputs: Table,
    /// Results table, or why it could not be read
    pub results: Result<Table, String>,
    /// Currently selected data row (zero-based)
    pub selected_row: usize,
    /// Currently selected column (zero-based)
    pub selected_col: usize,
    /// Top data row visible in the viewport
    pub scroll_row: usize,
    /// Current application mode
    pub mode: AppMode,
    /// Current input buffer (for editing mode)
    pub input: String,
    /// Cursor position within the input buffer, in characters
    pub cursor_position: usize,
    /// Highlighted entry in the choice popup
    pub choice_index: usize,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Input buffer for filename entry
    pub filename_input: String,
    /// Whether the inputs hold edits not yet saved
    pub dirty: bool,
    /// Whether the inputs came from a successful read of the source
    pub loaded: bool,
    /// Description of the connected source
    pub source_label: String,
    /// Account the session is authenticated as
    pub connected_as: Option<String>,
    /// Viewport height in data rows (for scrolling calculations)
    pub viewport_rows: usize,
}

impl App {
    /// Creates a panel with blank tables shaped by `layout`.
    pub fn new(layout: PanelLayout) -> Self {
        let inputs = RangeSynchronizer::reshape(
            RangeSynchronizer::read(Vec::new(), layout.input_width(), 0, false),
            layout.input_data_rows,
        );
        let results = Ok(RangeSynchronizer::read_range(Vec::new(), &layout.result_range, false));

        Self {
            layout,
            inputs,
            results,
            selected_row: 0,
            selected_col: 0,
            scroll_row: 0,
            mode: AppMode::Normal,
            input: String::new(),
            cursor_position: 0,
            choice_index: 0,
            help_scroll: 0,
            status_message: None,
            filename_input: String::new(),
            dirty: false,
            loaded: false,
            source_label: String::new(),
            connected_as: None,
            viewport_rows: 20,
        }
    }

    pub fn selected_value(&self) -> &str {
        self.inputs.get(self.selected_row, self.selected_col)
    }

    pub fn on_choice_column(&self) -> bool {
        self.layout.is_choice_column(self.selected_col, self.inputs.width())
    }

    /// Starts editing the selected cell.
    ///
    /// On the choice column this opens the choice popup instead, with the
    /// current value highlighted.
    pub fn start_editing(&mut self) {
        if self.on_choice_column() {
            let current = self.selected_value();
            self.choice_index = self
                .layout
                .choice_options()
                .iter()
                .position(|o| o == current)
                .unwrap_or(0);
            self.mode = AppMode::Choosing;
            return;
        }

        self.mode = AppMode::Editing;
        self.input = self.selected_value().to_string();
        self.cursor_position = self.input.chars().count();
    }

    /// Stores the input buffer in the selected cell and moves down one row.
    pub fn finish_editing(&mut self) {
        let value = std::mem::take(&mut self.input);
        self.set_selected(value);
        self.move_down_after_edit();

        self.mode = AppMode::Normal;
        self.cursor_position = 0;
    }

    /// Cancels editing and returns to normal mode without saving changes.
    pub fn cancel_editing(&mut self) {
        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn next_choice(&mut self) {
        let count = self.layout.choice_options().len();
        if count > 0 {
            self.choice_index = (self.choice_index + 1) % count;
        }
    }

    pub fn previous_choice(&mut self) {
        let count = self.layout.choice_options().len();
        if count > 0 {
            self.choice_index = (self.choice_index + count - 1) % count;
        }
    }

    /// Applies the highlighted choice to the selected cell.
    pub fn finish_choice(&mut self) {
        if let Some(choice) = self.layout.choice_options().get(self.choice_index).cloned() {
            self.set_selected(choice);
            self.move_down_after_edit();
        }
        self.mode = AppMode::Normal;
    }

    pub fn cancel_choice(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn clear_selected_cell(&mut self) {
        self.set_selected(String::new());
    }

    /// Pastes text into the selected cell. The choice column only accepts
    /// one of its options.
    pub fn paste_into_selected(&mut self, text: String) {
        if self.on_choice_column() && !self.layout.choice_options().contains(&text) {
            self.status_message = Some(format!(
                "'{}' is not one of: {}",
                text,
                self.layout.choices.join(", ")
            ));
            return;
        }
        self.set_selected(text);
        self.status_message = Some("Pasted".to_string());
    }

    fn set_selected(&mut self, value: String) {
        if self.selected_value() != value && self.inputs.set(self.selected_row, self.selected_col, value) {
            self.dirty = true;
        }
    }

    fn move_down_after_edit(&mut self) {
        if self.selected_row + 1 < self.inputs.height() {
            self.selected_row += 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.selected_row + 1 < self.inputs.height() {
            self.selected_row += 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_left(&mut self) {
        self.selected_col = self.selected_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.selected_col + 1 < self.inputs.width() {
            self.selected_col += 1;
        }
    }

    /// Replaces both tables with a fresh read from `source`, discarding
    /// local edits. On failure the current tables are kept.
    pub fn reload(&mut self, source: &mut dyn RangeSource) {
        let result = PanelService::new(source, &self.layout).snapshot();
        match result {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                self.status_message = Some(format!("Reloaded from {}", source.describe()));
            }
            Err(error) => {
                warn!(%error, "reload failed");
                self.status_message = Some(format!("Reload failed: {}", error));
            }
        }
    }

    /// Writes the inputs back to `source`, then re-reads both regions.
    ///
    /// A failed write leaves the local edits untouched so they can be saved
    /// again. Nothing is written until a read has succeeded, so the blank
    /// placeholder tables never overwrite the sheet.
    pub fn save(&mut self, source: &mut dyn RangeSource) {
        if !self.loaded {
            warn!("save refused: inputs were never loaded");
            self.status_message = Some("Nothing loaded from the sheet yet; press Ctrl+R".to_string());
            return;
        }

        let result = PanelService::new(source, &self.layout).persist(&self.inputs);
        match result {
            Ok(SaveOutcome::Saved(snapshot)) => {
                self.apply_snapshot(snapshot);
                self.status_message =
                    Some("Saved. The spreadsheet recalculates its formulas automatically.".to_string());
            }
            Ok(SaveOutcome::ReloadFailed(error)) => {
                self.dirty = false;
                self.status_message = Some(format!("Saved, but reload failed: {}", error));
            }
            Err(error) => {
                self.status_message = Some(format!("Save failed: {}", error));
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: PanelSnapshot) {
        self.inputs = snapshot.inputs;
        self.results = snapshot.results;
        self.dirty = false;
        self.loaded = true;
        self.selected_row = self.selected_row.min(self.inputs.height().saturating_sub(1));
        self.selected_col = self.selected_col.min(self.inputs.width().saturating_sub(1));
        self.ensure_cursor_visible();
    }

    /// Switches to CSV export mode to prompt for a filename.
    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = "inputs.csv".to_string();
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Returns the filename input if not empty, otherwise a default CSV filename.
    pub fn get_csv_export_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "inputs.csv".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Processes the result of a CSV export operation.
    ///
    /// # Arguments
    ///
    /// * `result` - Result of the CSV export operation (filename or error message)
    pub fn set_csv_export_result(&mut self, result: Result<String, String>) {
        match result {
            Ok(filename) => {
                self.status_message = Some(format!("Exported to {}", filename));
            }
            Err(error) => {
                self.status_message = Some(format!("Export failed: {}", error));
            }
        }

        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    pub fn set_copy_result(&mut self, result: Result<(), String>) {
        self.status_message = Some(match result {
            Ok(()) => "Copied".to_string(),
            Err(error) => format!("Copy failed: {}", error),
        });
    }

    pub fn update_viewport_size(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.ensure_cursor_visible();
    }

    /// Adjusts the scroll offset so the selected row is on screen.
    pub fn ensure_cursor_visible(&mut self) {
        if self.selected_row < self.scroll_row {
            self.scroll_row = self.selected_row;
        } else if self.selected_row >= self.scroll_row + self.viewport_rows {
            self.scroll_row = self.selected_row + 1 - self.viewport_rows;
        }
    }
}
