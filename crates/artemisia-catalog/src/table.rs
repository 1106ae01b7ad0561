use crate::product::ProductRecord;
use serde::Serialize;

/// Products projected into a rectangular table for display.
///
/// Columns are the union of record keys in first-seen order; every row is
/// aligned to them, with missing cells as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ProductTable {
    pub fn from_records(records: &[ProductRecord]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for column in record.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map(|c| c.to_text()).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
