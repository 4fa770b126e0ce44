//! Data module - workbook loading, tables and the KPI pipeline

mod loader;
mod processor;
mod table;

pub use loader::{DataLoader, DataPaths, SourceTables};
pub use processor::{DataProcessor, PipelineError};
pub use table::{coerce_key, CellValue, FinanceTable, RawTable};
