//! Product catalog for the Artemisia Pharma site: the fixed category registry
//! and the spreadsheet-backed product loader.

mod category;
mod loader;
mod product;
mod table;

pub use category::{list_categories, Category, CategoryDescriptor};
pub use loader::ProductLoader;
pub use product::{read_workbook, Cell, LoadError, ProductRecord};
pub use table::ProductTable;
