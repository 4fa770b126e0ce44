//! Workbook Loader Module
//! Reads the simulation sheets from the two xlsx exports, once per session.

use crate::data::{CellValue, FinanceTable, RawTable};
use crate::kpi::{RoundRange, SourceTable, TableRef};
use calamine::{open_workbook, Data, Reader, Xlsx};
use once_cell::sync::OnceCell;
use polars::prelude::{DataFrame, PolarsError, PolarsResult};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const SALES_SHEET: &str = "Salesarea - Customer - Product";
pub const COMPONENT_SHEET: &str = "Component";
pub const PRODUCT_SHEET: &str = "Product";
pub const BOTTLING_SHEET: &str = "Bottling line";
pub const WAREHOUSE_SHEET: &str = "Warehouse, Salesarea";
pub const SUPPLIER_SHEET: &str = "Supplier";
pub const SUPPLIER_COMPONENT_SHEET: &str = "Supplier - Component";
pub const FINANCE_SHEET: &str = "Output";

static SESSION: OnceCell<SourceTables> = OnceCell::new();

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("Sheet '{sheet}' is missing from {path}")]
    MissingSheet { sheet: String, path: PathBuf },
    #[error("Failed to read sheet '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("Failed to build table '{sheet}': {source}")]
    Table {
        sheet: String,
        #[source]
        source: PolarsError,
    },
}

/// Locations of the two workbooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub workbook: PathBuf,
    pub finance: PathBuf,
}

/// Every table the dashboard reads. Immutable once loaded.
#[derive(Debug)]
pub struct SourceTables {
    pub sales: RawTable,
    pub component: RawTable,
    pub product: RawTable,
    pub bottling: RawTable,
    pub warehouse: RawTable,
    pub supplier: RawTable,
    pub supplier_component: RawTable,
    pub finance: FinanceTable,
}

impl SourceTables {
    pub fn table(&self, source: SourceTable) -> &RawTable {
        match source {
            SourceTable::Sales => &self.sales,
            SourceTable::Component => &self.component,
            SourceTable::Product => &self.product,
            SourceTable::Bottling => &self.bottling,
            SourceTable::Warehouse => &self.warehouse,
            SourceTable::Supplier => &self.supplier,
            SourceTable::SupplierComponent => &self.supplier_component,
        }
    }

    fn raw_tables(&self) -> [&RawTable; 7] {
        [
            &self.sales,
            &self.component,
            &self.product,
            &self.bottling,
            &self.warehouse,
            &self.supplier,
            &self.supplier_component,
        ]
    }

    /// Rounds available across all sheets, finance positions included.
    pub fn round_bounds(&self) -> RoundRange {
        self.raw_tables()
            .iter()
            .filter_map(|t| t.round_bounds())
            .chain(self.finance.round_bounds())
            .reduce(RoundRange::union)
            .unwrap_or_default()
    }

    /// Sheet name and rows of a table restricted to `range`, for display.
    pub fn view(&self, table: TableRef, range: RoundRange) -> PolarsResult<(&str, DataFrame)> {
        match table {
            TableRef::Raw(source) => {
                let raw = self.table(source);
                Ok((raw.name(), raw.filter_rounds(range)?.dataframe().clone()))
            }
            TableRef::Finance => Ok((FINANCE_SHEET, self.finance.filter_rounds(range)?)),
        }
    }
}

/// Reads workbooks into [`SourceTables`].
pub struct DataLoader;

impl DataLoader {
    /// Session-wide tables. The first successful call reads the files, later
    /// calls return the same tables.
    pub fn load(paths: &DataPaths) -> Result<&'static SourceTables, LoaderError> {
        SESSION.get_or_try_init(|| Self::read(paths))
    }

    /// Read both workbooks without touching the session cache.
    pub fn read(paths: &DataPaths) -> Result<SourceTables, LoaderError> {
        let mut workbook = Self::open(&paths.workbook)?;
        let mut finance_book = Self::open(&paths.finance)?;

        let mut sheet = |name: &str| Self::read_sheet(&mut workbook, &paths.workbook, name);
        let sales = sheet(SALES_SHEET)?;
        let component = sheet(COMPONENT_SHEET)?;
        let product = sheet(PRODUCT_SHEET)?;
        let bottling = sheet(BOTTLING_SHEET)?;
        let warehouse = sheet(WAREHOUSE_SHEET)?;
        let supplier = sheet(SUPPLIER_SHEET)?;
        let supplier_component = sheet(SUPPLIER_COMPONENT_SHEET)?;

        let finance_raw = Self::read_sheet(&mut finance_book, &paths.finance, FINANCE_SHEET)?;
        let finance = FinanceTable::from_raw(finance_raw).map_err(|source| LoaderError::Table {
            sheet: FINANCE_SHEET.to_string(),
            source,
        })?;

        let tables = SourceTables {
            sales,
            component,
            product,
            bottling,
            warehouse,
            supplier,
            supplier_component,
            finance,
        };

        info!(
            workbook = %paths.workbook.display(),
            finance = %paths.finance.display(),
            sales_rows = tables.sales.height(),
            finance_metrics = tables.finance.metric_names().len(),
            "loaded simulation workbooks"
        );

        Ok(tables)
    }

    fn open(path: &Path) -> Result<Xlsx<BufReader<File>>, LoaderError> {
        open_workbook(path).map_err(|source| LoaderError::Open {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_sheet(
        workbook: &mut Xlsx<BufReader<File>>,
        path: &Path,
        sheet: &str,
    ) -> Result<RawTable, LoaderError> {
        if !workbook.sheet_names().iter().any(|n| n == sheet) {
            return Err(LoaderError::MissingSheet {
                sheet: sheet.to_string(),
                path: path.to_path_buf(),
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|source| LoaderError::Sheet {
                sheet: sheet.to_string(),
                source,
            })?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|header| header.iter().map(Self::header_text).collect())
            .unwrap_or_default();
        let body: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(Self::cell_value).collect())
            .collect();

        debug!(sheet, columns = headers.len(), rows = body.len(), "read sheet");

        RawTable::from_rows(sheet, &headers, &body).map_err(|source| LoaderError::Table {
            sheet: sheet.to_string(),
            source,
        })
    }

    fn header_text(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Int(v) => CellValue::Number(*v as f64),
            Data::Float(v) => CellValue::Number(*v),
            Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
            Data::String(s) if s.trim().is_empty() => CellValue::Missing,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
                CellValue::Date(cell.to_string())
            }
            Data::Error(_) | Data::Empty => CellValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    const MAIN_SHEETS: [&str; 7] = [
        SALES_SHEET,
        COMPONENT_SHEET,
        PRODUCT_SHEET,
        BOTTLING_SHEET,
        WAREHOUSE_SHEET,
        SUPPLIER_SHEET,
        SUPPLIER_COMPONENT_SHEET,
    ];

    fn write_main(path: &Path, skip: Option<&str>) {
        let mut workbook = Workbook::new();
        for name in MAIN_SHEETS.iter().filter(|n| Some(**n) != skip) {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            sheet.write_string(0, 0, "Round").unwrap();
            sheet.write_string(0, 1, "Order size").unwrap();
            sheet.write_number(1, 0, 0.0).unwrap();
            sheet.write_number(1, 1, 10.0).unwrap();
            sheet.write_number(2, 0, 1.0).unwrap();
            sheet.write_string(2, 1, "n/a").unwrap();
            sheet.write_number(3, 0, 1.0).unwrap();
            sheet.write_number(3, 1, 30.0).unwrap();
        }
        workbook.save(path).unwrap();
    }

    fn write_finance(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(FINANCE_SHEET).unwrap();
        sheet.write_string(0, 1, "Round 0").unwrap();
        sheet.write_string(0, 2, "Round 1").unwrap();
        sheet.write_string(1, 0, "ROI").unwrap();
        sheet.write_number(1, 1, 0.5).unwrap();
        sheet.write_number(1, 2, 1.5).unwrap();
        workbook.save(path).unwrap();
    }

    fn fixture(skip: Option<&str>) -> (TempDir, DataPaths) {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths {
            workbook: dir.path().join("TFC_0_3.xlsx"),
            finance: dir.path().join("FinanceReport.xlsx"),
        };
        write_main(&paths.workbook, skip);
        write_finance(&paths.finance);
        (dir, paths)
    }

    #[test]
    fn reads_every_sheet_and_reshapes_finance() {
        let (_dir, paths) = fixture(None);
        let tables = DataLoader::read(&paths).unwrap();

        assert_eq!(tables.component.height(), 3);
        assert_eq!(tables.finance.metric_names(), vec!["ROI".to_string()]);
        assert_eq!(
            tables.finance.metric_values("ROI"),
            Some(vec![Some(0.5), Some(1.5)])
        );
        assert_eq!(tables.round_bounds(), RoundRange::new(0, 1));
    }

    #[test]
    fn table_views_follow_round_range() {
        let (_dir, paths) = fixture(None);
        let tables = DataLoader::read(&paths).unwrap();

        let (name, df) = tables
            .view(TableRef::Raw(SourceTable::Component), RoundRange::new(1, 1))
            .unwrap();
        assert_eq!(name, COMPONENT_SHEET);
        assert_eq!(df.height(), 2);

        let (name, df) = tables.view(TableRef::Finance, RoundRange::new(0, 0)).unwrap();
        assert_eq!(name, FINANCE_SHEET);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn missing_sheet_is_a_hard_failure() {
        let (_dir, paths) = fixture(Some(BOTTLING_SHEET));
        let err = DataLoader::read(&paths).unwrap_err();
        match err {
            LoaderError::MissingSheet { sheet, .. } => assert_eq!(sheet, BOTTLING_SHEET),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths {
            workbook: dir.path().join("absent.xlsx"),
            finance: dir.path().join("absent_finance.xlsx"),
        };
        assert!(matches!(
            DataLoader::read(&paths),
            Err(LoaderError::Open { .. })
        ));
    }

    #[test]
    fn session_load_is_memoized() {
        let (_dir, paths) = fixture(None);
        let first = DataLoader::load(&paths).unwrap();
        let second = DataLoader::load(&paths).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn cells_map_to_values() {
        assert_eq!(DataLoader::cell_value(&Data::Int(4)), CellValue::Number(4.0));
        assert_eq!(
            DataLoader::cell_value(&Data::String("  ".into())),
            CellValue::Missing
        );
        assert_eq!(DataLoader::cell_value(&Data::Empty), CellValue::Missing);
        assert_eq!(DataLoader::header_text(&Data::Empty), "");
    }
}
