use crate::category::Category;
use crate::product::{read_workbook, LoadError, ProductRecord};
use std::path::{Path, PathBuf};

/// Resolves categories to product records from spreadsheets in a data directory.
///
/// Every failure is logged and collapses to an empty list, so a page can
/// always render. Nothing is cached: each call re-reads the file.
#[derive(Debug, Clone)]
pub struct ProductLoader {
    data_dir: PathBuf,
}

impl ProductLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the spreadsheet backing `category`.
    pub fn source_path(&self, category: Category) -> PathBuf {
        self.data_dir.join(category.source_file_name())
    }

    /// Load the products of a registered category.
    pub fn load(&self, category: Category) -> Vec<ProductRecord> {
        let path = self.source_path(category);
        match read_workbook(&path) {
            Ok(records) => {
                log::debug!("Loaded {} product(s) for \"{category}\"", records.len());
                records
            }
            Err(err) => {
                report(category, &path, &err);
                Vec::new()
            }
        }
    }

    /// Load products by slug. Unknown slugs yield an empty list.
    pub fn load_key(&self, key: &str) -> Vec<ProductRecord> {
        match Category::from_key(key) {
            Some(category) => self.load(category),
            None => {
                log::warn!("Unknown product category: {key}");
                Vec::new()
            }
        }
    }
}

fn report(category: Category, path: &Path, err: &LoadError) {
    let file = category.source_file_name();
    match err {
        LoadError::Missing(_) => log::warn!(
            "Excel file missing for category \"{category}\": {}",
            path.display()
        ),
        LoadError::NoSheets => log::warn!("No sheets found in {file}"),
        LoadError::NoRows => log::warn!("No rows found in {file}"),
        LoadError::Unreadable(reason) => {
            log::error!("Error reading Excel file \"{file}\": {reason}")
        }
    }
}
