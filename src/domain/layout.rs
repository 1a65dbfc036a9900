//! Region layout of the panel: which part of the worksheet is edited,
//! which part holds the computed results, and which column offers a
//! fixed set of choices.

use serde::{Deserialize, Serialize};

use super::models::{CellRef, GridRange};

/// Ranges and column configuration the panel is pinned to.
///
/// The input range includes its header row; `input_data_rows` is the
/// number of editable rows below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelLayout {
    pub input_range: GridRange,
    pub input_data_rows: usize,
    pub result_range: GridRange,
    pub choice_column: Option<usize>,
    pub choices: Vec<String>,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            input_range: GridRange::new(
                CellRef::new(0, 0),
                CellRef::new(30, 4),
            ),
            input_data_rows: 31,
            result_range: GridRange::new(
                CellRef::new(0, 11),
                CellRef::new(13, 13),
            ),
            choice_column: Some(3),
            choices: vec!["Bolivia".to_string(), "Paraguai".to_string(), "Argentina".to_string()],
        }
    }
}

impl PanelLayout {
    /// The range read for the input table: the header plus every data row.
    ///
    /// ```
    /// use sheetpanel::domain::PanelLayout;
    ///
    /// assert_eq!(PanelLayout::default().input_read_range().a1(), "A1:E32");
    /// ```
    pub fn input_read_range(&self) -> GridRange {
        self.input_range.with_height(self.input_data_rows + 1)
    }

    pub fn input_width(&self) -> usize {
        self.input_range.width()
    }

    /// Whether `col` is the choice column and the table is wide enough for it.
    pub fn is_choice_column(&self, col: usize, table_width: usize) -> bool {
        self.choice_column == Some(col) && col < table_width && !self.choices.is_empty()
    }

    /// Options offered for the choice column; the leading empty entry clears the cell.
    pub fn choice_options(&self) -> Vec<String> {
        std::iter::once(String::new()).chain(self.choices.iter().cloned()).collect()
    }

    /// Worksheet row number (1-based) of a data row in the input table.
    pub fn sheet_row_of(&self, data_row: usize) -> usize {
        self.input_range.start.row + data_row + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_panel_regions() {
        let layout = PanelLayout::default();
        assert_eq!(layout.input_range.a1(), "A1:E31");
        assert_eq!(layout.result_range.a1(), "L1:N14");
        assert_eq!(layout.input_width(), 5);
        assert_eq!(layout.input_data_rows, 31);
    }

    #[test]
    fn test_choice_column_requires_width() {
        let layout = PanelLayout::default();
        assert!(layout.is_choice_column(3, 5));
        assert!(!layout.is_choice_column(3, 3));
        assert!(!layout.is_choice_column(2, 5));
    }

    #[test]
    fn test_choice_options_allow_empty() {
        let layout = PanelLayout::default();
        assert_eq!(layout.choice_options(), vec!["", "Bolivia", "Paraguai", "Argentina"]);
    }

    #[test]
    fn test_sheet_row_of_skips_header() {
        let layout = PanelLayout::default();
        assert_eq!(layout.sheet_row_of(0), 2);
        assert_eq!(layout.sheet_row_of(30), 32);
    }

    #[test]
    fn test_layout_from_toml_overrides() {
        let layout: PanelLayout = toml::from_str(
            r#"
            input_range = "B2:D10"
            input_data_rows = 8
            choices = ["X", "Y"]
            "#,
        )
        .unwrap();
        assert_eq!(layout.input_range.a1(), "B2:D10");
        assert_eq!(layout.input_read_range().a1(), "B2:D10");
        assert_eq!(layout.result_range.a1(), "L1:N14");
        assert_eq!(layout.choices, vec!["X", "Y"]);
    }
}
