//! Offline range source backed by a CSV file.
//!
//! The whole CSV is the worksheet grid: row `n` of the file is sheet row
//! `n + 1`. Values are stored as text; formulas are kept verbatim and never
//! evaluated.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use super::source::{check_fits, RangeSource, SourceError, SourceResult, ValueInputMode};
use crate::domain::{CellValue, GridRange, RawCells};

pub struct CsvWorkbook {
    path: Option<PathBuf>,
    grid: Vec<Vec<CellValue>>,
}

impl CsvWorkbook {
    /// Opens a CSV file; a missing file starts an empty grid that is
    /// created on the first write.
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let grid = if path.exists() { Self::read_grid(&path)? } else { Vec::new() };
        info!(path = %path.display(), rows = grid.len(), "opened csv workbook");
        Ok(Self { path: Some(path), grid })
    }

    /// A grid that lives only in memory.
    pub fn in_memory(grid: Vec<Vec<CellValue>>) -> Self {
        Self { path: None, grid }
    }

    pub fn grid(&self) -> &[Vec<CellValue>] {
        &self.grid
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.grid.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    fn read_grid(path: &Path) -> SourceResult<Vec<Vec<CellValue>>> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SourceError::Parse(e.to_string()))?;
            grid.push(record.iter().map(CellValue::from_text).collect());
        }
        Ok(grid)
    }

    fn save(&self) -> SourceResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let width = self.grid.iter().map(Vec::len).max().unwrap_or(0);
        let mut writer = csv::WriterBuilder::new().flexible(false).from_path(path).map_err(csv_error)?;
        for row in &self.grid {
            let mut texts: Vec<String> = row.iter().map(CellValue::to_text).collect();
            texts.resize(width, String::new());
            writer.write_record(&texts).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn csv_error(err: csv::Error) -> SourceError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => SourceError::Io(io),
            other => SourceError::Parse(format!("{:?}", other)),
        }
    } else {
        SourceError::Parse(err.to_string())
    }
}

impl RangeSource for CsvWorkbook {
    /// Mirrors the remote API: trailing empty cells and rows are omitted.
    fn get_range(&self, range: &GridRange) -> SourceResult<RawCells> {
        let mut values: RawCells = (range.start.row..=range.end.row)
            .map(|row| {
                let mut cells: Vec<CellValue> = (range.start.col..=range.end.col)
                    .map(|col| self.cell(row, col).clone())
                    .collect();
                while cells.last().is_some_and(CellValue::is_empty) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    fn set_range(&mut self, range: &GridRange, values: &RawCells, mode: ValueInputMode) -> SourceResult<()> {
        check_fits(range, values)?;

        for (i, row) in values.iter().enumerate() {
            let r = range.start.row + i;
            if self.grid.len() <= r {
                self.grid.resize_with(r + 1, Vec::new);
            }
            let target = &mut self.grid[r];
            for (j, value) in row.iter().enumerate() {
                let c = range.start.col + j;
                if target.len() <= c {
                    target.resize(c + 1, CellValue::Empty);
                }
                target[c] = value.clone();
            }
        }

        self.save()?;
        info!(range = %range, rows = values.len(), %mode, "wrote range to csv workbook");
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("CSV {}", path.display()),
            None => "in-memory grid".to_string(),
        }
    }
}
