use calamine::{open_workbook_auto, Data, Reader};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Why a product source yielded no records.
#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("file not found: {0}")]
    Missing(String),
    #[error("unreadable workbook: {0}")]
    Unreadable(String),
    #[error("no sheets found")]
    NoSheets,
    #[error("no rows found")]
    NoRows,
}

/// A single non-blank spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Display text for table rendering. Whole numbers print without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// One spreadsheet row keyed by the header row, in column order.
///
/// Blank cells are omitted, so a completely blank row is an empty record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRecord {
    fields: Vec<(String, Cell)>,
}

impl ProductRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Cell)>) -> Self {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, cell: Cell) {
        self.fields.push((column.into(), cell));
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ProductRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Read the first sheet of a workbook into product records.
///
/// The first row is the header; every following row becomes one record in
/// file order. Any other sheets are ignored. Performs no logging.
pub fn read_workbook(path: &Path) -> Result<Vec<ProductRecord>, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.display().to_string()));
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoadError::Unreadable(e.to_string()))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(LoadError::NoSheets);
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(LoadError::NoRows);
    };
    let headers = header_names(header_row);

    let records: Vec<ProductRecord> = rows
        .map(|row| {
            let mut record = ProductRecord::new();
            for (header, data) in headers.iter().zip(row) {
                if let Some(cell) = cell_value(data) {
                    record.insert(header.clone(), cell);
                }
            }
            record
        })
        .collect();

    if records.is_empty() {
        return Err(LoadError::NoRows);
    }
    Ok(records)
}

/// Column names from the header row. Empty headers become `__EMPTY`, and
/// repeated names get `_1`, `_2`, ... suffixes.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    row.iter()
        .map(|data| {
            let base = match cell_value(data) {
                Some(cell) => cell.to_text(),
                None => "__EMPTY".to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(data: &Data) -> Option<Cell> {
    match data {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Cell::Text(s.clone())),
        Data::Float(f) => Some(Cell::Number(*f)),
        Data::Int(i) => Some(Cell::Number(*i as f64)),
        Data::Bool(b) => Some(Cell::Bool(*b)),
        other => Some(Cell::Text(other.to_string())),
    }
}
