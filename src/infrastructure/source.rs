//! The remote-range seam: anything the panel can read ranges from and
//! write ranges to.

use std::fmt;

use thiserror::Error;

use crate::domain::{DomainError, GridRange, RawCells};

/// How the destination interprets written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputMode {
    /// Stored exactly as sent.
    Raw,
    /// Parsed as if typed by a user, so `=SUM(A1:A3)` becomes a formula.
    UserEntered,
}

impl ValueInputMode {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ValueInputMode::Raw => "RAW",
            ValueInputMode::UserEntered => "USER_ENTERED",
        }
    }
}

impl fmt::Display for ValueInputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Failures raised by range sources. Each variant carries a message meant
/// to be shown to the user as-is.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Spreadsheet not found: {0}. Check `sheet_url` and that the account has editor access")]
    SpreadsheetNotFound(String),
    #[error("Worksheet '{0}' not found. Check `sheet_name`")]
    WorksheetNotFound(String),
    #[error("Access denied: {0}. Share the spreadsheet with the account and enable the Sheets API")]
    AccessDenied(String),
    #[error("Spreadsheet API unavailable: {0}")]
    Unavailable(String),
    #[error("Write rejected: {0}")]
    Rejected(String),
    #[error("Malformed response: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// A spreadsheet-like store addressed by fixed rectangular ranges.
pub trait RangeSource {
    /// Reads a range. Trailing empty cells and rows may be omitted, so the
    /// result is ragged.
    fn get_range(&self, range: &GridRange) -> SourceResult<RawCells>;

    /// Writes `values` into `range`, top-left aligned.
    fn set_range(&mut self, range: &GridRange, values: &RawCells, mode: ValueInputMode) -> SourceResult<()>;

    /// Short human-readable identification of the store.
    fn describe(&self) -> String;
}

/// Rejects writes that do not fit inside the destination range.
pub(crate) fn check_fits(range: &GridRange, values: &RawCells) -> SourceResult<()> {
    if values.len() > range.height() {
        return Err(SourceError::Rejected(format!(
            "{} rows do not fit in {} ({} rows)",
            values.len(),
            range,
            range.height()
        )));
    }
    if let Some(row) = values.iter().find(|row| row.len() > range.width()) {
        return Err(SourceError::Rejected(format!(
            "a row of {} values does not fit in {} ({} columns)",
            row.len(),
            range,
            range.width()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellValue;

    #[test]
    fn test_value_input_mode_api_names() {
        assert_eq!(ValueInputMode::Raw.as_api_str(), "RAW");
        assert_eq!(ValueInputMode::UserEntered.to_string(), "USER_ENTERED");
    }

    #[test]
    fn test_check_fits() {
        let range: GridRange = "A1:B2".parse().unwrap();
        let cell = CellValue::Text("x".into());

        assert!(check_fits(&range, &vec![vec![cell.clone(); 2]; 2]).is_ok());
        assert!(matches!(check_fits(&range, &vec![vec![cell.clone()]; 3]), Err(SourceError::Rejected(_))));
        assert!(matches!(check_fits(&range, &vec![vec![cell; 3]]), Err(SourceError::Rejected(_))));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let err = SourceError::WorksheetNotFound("PAINEL".into());
        assert_eq!(err.to_string(), "Worksheet 'PAINEL' not found. Check `sheet_name`");
    }
}
