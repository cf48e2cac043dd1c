//! Tabular input
//!
//! Reads a CSV file into memory. Cells holding one of the conventional
//! missing-value markers are stored as `None` so that callers never have to
//! re-check for `"NaN"`, `"N/A"` and friends.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const COL_COUNTRY: &str = "Country";
pub const COL_CAPITAL: &str = "Capital/Major City";
pub const COL_LARGEST_CITY: &str = "Largest city";
pub const COL_LANGUAGE: &str = "Official language";
pub const COL_CURRENCY: &str = "Currency-Code";

/// Columns the graph loader reads from every row
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_COUNTRY,
    COL_CAPITAL,
    COL_LARGEST_CITY,
    COL_LANGUAGE,
    COL_CURRENCY,
];

/// Cell contents treated as missing
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Errors raised while reading or validating a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset has no columns")]
    Empty,

    #[error("Malformed row at line {line}: expected at most {expected} fields, found {found}")]
    Malformed {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Whether a raw cell value denotes a missing value
pub fn is_missing(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

/// An in-memory table of optional string cells
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<Vec<Option<String>>>,
}

impl Dataset {
    /// Read a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read CSV from any reader; the first record is the header
    pub fn from_reader<R: Read>(reader: R) -> DatasetResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let raw_headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        if raw_headers.is_empty() || raw_headers.iter().all(|h| h.is_empty()) {
            return Err(DatasetError::Empty);
        }

        let columns = dedup_columns(raw_headers);
        let width = columns.len();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.len() > width {
                return Err(DatasetError::Malformed {
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    expected: width,
                    found: record.len(),
                });
            }

            let mut row: Vec<Option<String>> = record
                .iter()
                .map(|cell| {
                    if is_missing(cell) {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            row.resize(width, None);
            records.push(row);
        }

        Ok(Self::from_parts(columns, records))
    }

    fn from_parts(columns: Vec<String>, records: Vec<Vec<Option<String>>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            columns,
            index,
            records,
        }
    }

    /// Column names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate rows in file order
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(move |values| Row {
            index: &self.index,
            values,
        })
    }

    /// The first `n` rows as a new dataset
    pub fn head(&self, n: usize) -> Dataset {
        let records = self.records.iter().take(n).cloned().collect();
        Self::from_parts(self.columns.clone(), records)
    }

    /// Fail with every absent column if any of `required` is missing
    pub fn require_columns(&self, required: &[&str]) -> DatasetResult<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::MissingColumns(missing))
        }
    }
}

/// Borrowed view of one dataset row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: &'a HashMap<String, usize>,
    values: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// Cell value, `None` when the column is absent or the cell is missing
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let values = self.values;
        self.index
            .get(column)
            .and_then(|&i| values.get(i))
            .and_then(|v| v.as_deref())
    }

    /// Cells in column order
    pub fn values(&self) -> &'a [Option<String>] {
        self.values
    }
}

/// Rename repeated headers to `name.1`, `name.2`, ...
fn dedup_columns(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());

    for header in headers {
        if !columns.contains(&header) {
            seen.insert(header.clone(), 0);
            columns.push(header);
            continue;
        }
        let counter = seen.entry(header.clone()).or_insert(0);
        let mut candidate;
        loop {
            *counter += 1;
            candidate = format!("{}.{}", header, counter);
            if !columns.contains(&candidate) {
                break;
            }
        }
        columns.push(candidate);
    }

    columns
}
