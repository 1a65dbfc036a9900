//! Load and save workflows between a range source and the panel tables.

use tracing::{info, warn};

use crate::domain::{PanelLayout, RangeSynchronizer, Table};
use crate::infrastructure::{RangeSource, SourceError, SourceResult, ValueInputMode};

/// Both panel regions as last read from the source.
///
/// A failed results read does not invalidate the inputs, so the results
/// carry their own error text.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    pub inputs: Table,
    pub results: Result<Table, String>,
}

/// Result of a save that reached the source.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Written and re-read.
    Saved(PanelSnapshot),
    /// Written, but the follow-up read failed.
    ReloadFailed(SourceError),
}

pub struct PanelService<'a> {
    source: &'a mut dyn RangeSource,
    layout: &'a PanelLayout,
}

impl<'a> PanelService<'a> {
    pub fn new(source: &'a mut dyn RangeSource, layout: &'a PanelLayout) -> Self {
        Self { source, layout }
    }

    /// Reads the input region (header plus data rows) and pins it to
    /// exactly `input_data_rows` rows.
    pub fn load_inputs(&self) -> SourceResult<Table> {
        let range = self.layout.input_read_range();
        let raw = self.source.get_range(&range)?;
        let table = RangeSynchronizer::read(raw, range.width(), range.height(), true);
        Ok(RangeSynchronizer::reshape(table, self.layout.input_data_rows))
    }

    pub fn load_results(&self) -> SourceResult<Table> {
        let range = self.layout.result_range;
        let raw = self.source.get_range(&range)?;
        Ok(RangeSynchronizer::read_range(raw, &range, true))
    }

    pub fn snapshot(&self) -> SourceResult<PanelSnapshot> {
        let inputs = self.load_inputs()?;
        let results = self.load_results().map_err(|e| {
            warn!(range = %self.layout.result_range, error = %e, "failed to read results");
            e.to_string()
        });
        Ok(PanelSnapshot { inputs, results })
    }

    /// Writes the table with its header over the input region, letting the
    /// spreadsheet interpret values as typed, then re-reads both regions.
    ///
    /// A write error is returned as `Err` and nothing else is attempted.
    pub fn persist(&mut self, table: &Table) -> SourceResult<SaveOutcome> {
        let range = self.layout.input_read_range();
        let raw = RangeSynchronizer::write(table, true);
        self.source
            .set_range(&range, &raw, ValueInputMode::UserEntered)
            .inspect_err(|e| warn!(range = %range, error = %e, "save failed"))?;
        info!(range = %range, rows = raw.len(), "saved inputs");

        Ok(match self.snapshot() {
            Ok(snapshot) => SaveOutcome::Saved(snapshot),
            Err(e) => SaveOutcome::ReloadFailed(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, GridRange, RawCells};
    use crate::infrastructure::CsvWorkbook;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sample_book() -> CsvWorkbook {
        let mut grid: Vec<Vec<CellValue>> = vec![
            vec![text("Name"), text("Qty"), text("Price"), text("Country"), text("Note")],
            vec![text("A"), CellValue::Number(3.0), CellValue::Number(1.5), text("Bolivia")],
        ];
        grid[0].extend(std::iter::repeat_n(CellValue::Empty, 6));
        grid[0].extend([text("Metric"), text("Value"), text("Unit")]);
        grid.push(vec![CellValue::Empty; 11].into_iter().chain([text("Total"), CellValue::Number(4.5)]).collect());
        CsvWorkbook::in_memory(grid)
    }

    #[test]
    fn test_load_inputs_is_fixed_shape() {
        let mut book = sample_book();
        let layout = PanelLayout::default();
        let service = PanelService::new(&mut book, &layout);

        let inputs = service.load_inputs().unwrap();
        assert_eq!(inputs.columns, vec!["Name", "Qty", "Price", "Country", "Note"]);
        assert_eq!(inputs.height(), 31);
        assert!(inputs.rows.iter().all(|r| r.len() == 5));
        assert_eq!(inputs.rows[0], vec!["A", "3", "1.5", "Bolivia", ""]);
        assert_eq!(inputs.rows[1], vec!["", "", "", "", ""]);
    }

    #[test]
    fn test_load_results() {
        let mut book = sample_book();
        let layout = PanelLayout::default();
        let service = PanelService::new(&mut book, &layout);

        let results = service.load_results().unwrap();
        assert_eq!(results.columns, vec!["Metric", "Value", "Unit"]);
        assert_eq!(results.height(), 13);
        assert_eq!(results.rows[1], vec!["Total", "4.5", ""]);
    }

    #[test]
    fn test_persist_writes_header_and_rows_then_reloads() {
        let mut book = sample_book();
        let layout = PanelLayout::default();

        let mut inputs = PanelService::new(&mut book, &layout).load_inputs().unwrap();
        inputs.set(1, 0, "B");
        inputs.set(1, 3, "Paraguai");

        let outcome = PanelService::new(&mut book, &layout).persist(&inputs).unwrap();
        let SaveOutcome::Saved(snapshot) = outcome else {
            panic!("expected a saved snapshot");
        };
        assert_eq!(snapshot.inputs, inputs);
        assert!(snapshot.results.is_ok());

        assert_eq!(book.cell(2, 0), &text("B"));
        assert_eq!(book.cell(2, 3), &text("Paraguai"));
        assert_eq!(book.cell(0, 0), &text("Name"));
        assert_eq!(book.cell(0, 11), &text("Metric"));
    }

    struct FailingSource {
        fail_reads_of: Option<GridRange>,
        fail_writes: bool,
        inner: CsvWorkbook,
    }

    impl RangeSource for FailingSource {
        fn get_range(&self, range: &GridRange) -> SourceResult<RawCells> {
            if self.fail_reads_of == Some(*range) {
                return Err(SourceError::Unavailable("offline".into()));
            }
            self.inner.get_range(range)
        }

        fn set_range(&mut self, range: &GridRange, values: &RawCells, mode: ValueInputMode) -> SourceResult<()> {
            if self.fail_writes {
                return Err(SourceError::AccessDenied("read-only".into()));
            }
            self.inner.set_range(range, values, mode)
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    #[test]
    fn test_results_error_does_not_block_inputs() {
        let layout = PanelLayout::default();
        let mut source = FailingSource {
            fail_reads_of: Some(layout.result_range),
            fail_writes: false,
            inner: sample_book(),
        };

        let snapshot = PanelService::new(&mut source, &layout).snapshot().unwrap();
        assert_eq!(snapshot.inputs.height(), 31);
        assert_eq!(snapshot.results, Err("Spreadsheet API unavailable: offline".to_string()));
    }

    #[test]
    fn test_persist_write_error_halts() {
        let layout = PanelLayout::default();
        let mut source = FailingSource { fail_reads_of: None, fail_writes: true, inner: sample_book() };
        let inputs = PanelService::new(&mut source, &layout).load_inputs().unwrap();

        let result = PanelService::new(&mut source, &layout).persist(&inputs);
        assert!(matches!(result, Err(SourceError::AccessDenied(_))));
    }

    #[test]
    fn test_persist_reports_failed_reload() {
        let layout = PanelLayout::default();
        let mut source = FailingSource {
            fail_reads_of: Some(layout.input_read_range()),
            fail_writes: false,
            inner: sample_book(),
        };
        let inputs = RangeSynchronizer::reshape(
            RangeSynchronizer::read(Vec::new(), 5, 1, true),
            layout.input_data_rows,
        );

        let outcome = PanelService::new(&mut source, &layout).persist(&inputs).unwrap();
        assert!(matches!(outcome, SaveOutcome::ReloadFailed(SourceError::Unavailable(_))));
    }
}
