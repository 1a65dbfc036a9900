use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{DomainError, DomainResult};

/// A single scalar as exchanged with the remote spreadsheet.
///
/// Deserialises from any JSON scalar; `null` becomes [`CellValue::Empty`].
/// `Empty` always serialises as `""` because the sheet would otherwise
/// store a literal marker string.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    #[default]
    Empty,
}

impl CellValue {
    /// Builds a value from edited text: the empty string is `Empty`.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text.to_string())
        }
    }

    /// Renders the value the way the panel displays it.
    ///
    /// ```
    /// use sheetpanel::domain::CellValue;
    ///
    /// assert_eq!(CellValue::Number(3.0).to_text(), "3");
    /// assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    /// assert_eq!(CellValue::Bool(true).to_text(), "TRUE");
    /// assert_eq!(CellValue::Empty.to_text(), "");
    /// ```
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(n) => serializer.serialize_str(&n.to_string()),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Empty => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Bool(bool),
            Number(f64),
            Text(String),
        }

        Ok(match Option::<Scalar>::deserialize(deserializer)? {
            Some(Scalar::Bool(b)) => CellValue::Bool(b),
            Some(Scalar::Number(n)) => CellValue::Number(n),
            Some(Scalar::Text(s)) => CellValue::Text(s),
            None => CellValue::Empty,
        })
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Ragged rows exactly as returned by a range read.
pub type RawCells = Vec<Vec<CellValue>>;

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn column_label(col: usize) -> String {
        let mut result = String::new();
        let mut c = col;
        loop {
            result.insert(0, char::from(b'A' + (c % 26) as u8));
            if c < 26 {
                break;
            }
            c = c / 26 - 1;
        }
        result
    }

    /// Parses an A1-style reference such as `E31`.
    ///
    /// ```
    /// use sheetpanel::domain::CellRef;
    ///
    /// assert_eq!(CellRef::parse("E31"), Some(CellRef::new(30, 4)));
    /// assert_eq!(CellRef::parse("AA1"), Some(CellRef::new(0, 26)));
    /// assert_eq!(CellRef::parse("1A"), None);
    /// ```
    pub fn parse(cell_ref: &str) -> Option<CellRef> {
        let cell_ref = cell_ref.trim();
        let split = cell_ref.find(|c: char| !c.is_ascii_alphabetic())?;
        let (col_str, row_str) = cell_ref.split_at(split);

        if col_str.is_empty() || row_str.is_empty() || !row_str.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let col = Self::column_str_to_index(col_str)?;
        let row = row_str.parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef { row, col })
    }

    fn column_str_to_index(col_str: &str) -> Option<usize> {
        let mut result: usize = 0;
        for ch in col_str.chars() {
            let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
            result = result.checked_mul(26)?.checked_add(digit)?;
        }
        result.checked_sub(1)
    }

    pub fn a1(&self) -> String {
        format!("{}{}", Self::column_label(self.col), self.row + 1)
    }
}

/// A fixed rectangular region of a worksheet.
///
/// The shape is pinned when the range is built; reads never widen or
/// shrink it based on what the remote returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl GridRange {
    /// Builds a range from two corners, normalising their order.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn width(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    /// A range with the same top-left corner and the given number of rows.
    pub fn with_height(&self, height: usize) -> Self {
        let height = height.max(1);
        Self {
            start: self.start,
            end: CellRef::new(self.start.row + height - 1, self.end.col),
        }
    }

    pub fn a1(&self) -> String {
        format!("{}:{}", self.start.a1(), self.end.a1())
    }

    /// The range prefixed with a quoted worksheet name, e.g. `'PAINEL'!A1:E31`.
    pub fn qualified(&self, sheet: &str) -> String {
        format!("'{}'!{}", sheet.replace('\'', "''"), self.a1())
    }
}

impl FromStr for GridRange {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let s = s.trim();
        let parse = |part: &str| {
            CellRef::parse(part).ok_or_else(|| DomainError::InvalidCellReference(part.to_string()))
        };

        match s.split(':').collect::<Vec<_>>().as_slice() {
            [single] if !single.is_empty() => {
                let cell = parse(single)?;
                Ok(GridRange::new(cell, cell))
            }
            [a, b] => Ok(GridRange::new(parse(a)?, parse(b)?)),
            _ => Err(DomainError::InvalidRange(format!("expected format 'A1:B2', got '{}'", s))),
        }
    }
}

impl fmt::Display for GridRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

impl Serialize for GridRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.a1())
    }
}

impl<'de> Deserialize<'de> for GridRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Fixed-shape table: every row holds exactly `columns.len()` values and
/// missing values are the empty string.
///
/// Column names are kept verbatim, duplicates included, so a table written
/// back reproduces its header row. Name-keyed access goes through
/// [`Table::column_keys`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn blank_row(&self) -> Vec<String> {
        vec![String::new(); self.width()]
    }

    /// Appends a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.width(), String::new());
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Overwrites one value. Coordinates outside the table are ignored so
    /// the shape never changes.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Unique per-column keys: repeated names get a positional suffix
    /// (`Name`, `Name_2`), empty names key as `Col_<n>`.
    ///
    /// ```
    /// use sheetpanel::domain::Table;
    ///
    /// let table = Table::new(vec!["Name".into(), "Name".into(), "".into()]);
    /// assert_eq!(table.column_keys(), vec!["Name", "Name_2", "Col_3"]);
    /// ```
    pub fn column_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.width());
        for (i, name) in self.columns.iter().enumerate() {
            let base = if name.is_empty() { format!("Col_{}", i + 1) } else { name.clone() };
            let mut key = base.clone();
            let mut n = 2;
            while keys.contains(&key) {
                key = format!("{}_{}", base, n);
                n += 1;
            }
            keys.push(key);
        }
        keys
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.column_keys().iter().position(|k| k == key)
    }

    /// The row as ordered `(key, value)` pairs.
    pub fn row_map(&self, row: usize) -> Vec<(String, String)> {
        self.column_keys()
            .into_iter()
            .enumerate()
            .map(|(col, key)| (key, self.get(row, col).to_string()))
            .collect()
    }

    /// Length in characters of the longest entry in a column, header included.
    pub fn content_width(&self, col: usize) -> usize {
        let header = self.columns.get(col).map(|c| c.chars().count()).unwrap_or(0);
        self.rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.chars().count())
            .fold(header, usize::max)
    }
}
