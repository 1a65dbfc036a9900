//! Fixed-shape range synchronization.
//!
//! Converts between the ragged rows a remote spreadsheet returns for a
//! range and the fixed-shape [`Table`] the panel edits, and back again for
//! writes. Every operation here is total: irregular input is padded or
//! truncated into shape, never rejected.

use super::models::{CellValue, GridRange, RawCells, Table};

/// Stateless converter between [`RawCells`] and [`Table`].
///
/// # Examples
///
/// ```
/// use sheetpanel::domain::{CellValue, RangeSynchronizer};
///
/// let raw = vec![
///     vec![CellValue::Text("Name".into()), CellValue::Text("Qty".into())],
///     vec![CellValue::Text("A".into()), CellValue::Number(3.0)],
/// ];
/// let table = RangeSynchronizer::read(raw, 2, 3, true);
///
/// assert_eq!(table.columns, vec!["Name", "Qty"]);
/// assert_eq!(table.rows, vec![vec!["A", "3"], vec!["", ""]]);
/// ```
pub struct RangeSynchronizer;

impl RangeSynchronizer {
    /// Normalises `raw` into a table.
    ///
    /// Rows are padded with empty rows up to `expected_height` (extra rows
    /// are kept), and every row is padded or truncated to `expected_width`.
    /// With `has_header_row` and at least one row, the first row supplies
    /// the column names; otherwise names are `Col_1..Col_N`.
    pub fn read(mut raw: RawCells, expected_width: usize, expected_height: usize, has_header_row: bool) -> Table {
        if raw.len() < expected_height {
            raw.resize_with(expected_height, Vec::new);
        }

        let mut rows = raw.into_iter().map(|row| {
            let mut texts: Vec<String> = row.iter().take(expected_width).map(CellValue::to_text).collect();
            texts.resize(expected_width, String::new());
            texts
        });

        let columns = match rows.next() {
            Some(header) if has_header_row => header,
            first => {
                let columns = Self::positional_columns(expected_width);
                let mut table = Table::new(columns);
                table.rows.extend(first);
                table.rows.extend(rows);
                return table;
            }
        };

        Table { columns, rows: rows.collect() }
    }

    /// [`RangeSynchronizer::read`] with the shape taken from `range`.
    pub fn read_range(raw: RawCells, range: &GridRange, has_header_row: bool) -> Table {
        Self::read(raw, range.width(), range.height(), has_header_row)
    }

    /// Pins the data row count: appends blank rows or drops trailing ones.
    pub fn reshape(mut table: Table, target_row_count: usize) -> Table {
        if table.rows.len() > target_row_count {
            table.rows.truncate(target_row_count);
        } else {
            let blank = table.blank_row();
            table.rows.resize(target_row_count, blank);
        }
        table
    }

    /// Projects a table back into rows for a range write, optionally led by
    /// the column names. Empty strings become [`CellValue::Empty`], which
    /// serialises as `""`.
    pub fn write(table: &Table, include_header_row: bool) -> RawCells {
        let to_row = |values: &[String]| values.iter().map(|v| CellValue::from_text(v)).collect::<Vec<_>>();

        let mut raw = Vec::with_capacity(table.rows.len() + usize::from(include_header_row));
        if include_header_row {
            raw.push(to_row(table.columns.as_slice()));
        }
        raw.extend(table.rows.iter().map(|row| to_row(row.as_slice())));
        raw
    }

    fn positional_columns(width: usize) -> Vec<String> {
        (1..=width).map(|i| format!("Col_{}", i)).collect()
    }
}
