//! File-backed workbook accessor
//!
//! Every call reloads the whole file and every mutation rewrites it. There is
//! no lock: concurrent writers race and the last one wins.

use crate::address::{address_to_rc, rc_to_address};
use crate::error::{Result, WorkbookError};
use crate::model::{CellData, CellRange, CellType, CellValue, RangeData};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use umya_spreadsheet::{Cell, Spreadsheet, Worksheet};

pub const DEFAULT_SHEET: &str = "Sheet1";

/// Largest rectangle `get_range` will materialize
pub const MAX_RANGE_CELLS: u64 = 10_000;

const SAMPLE_ROWS: [(&str, f64, &str); 5] = [
    ("user1@example.com", 100.0, "Active"),
    ("user2@example.com", 200.0, "Pending"),
    ("user3@example.com", 150.0, "Active"),
    ("user4@example.com", 300.0, "Active"),
    ("user5@example.com", 250.0, "Pending"),
];

/// Accessor bound to one xlsx file on disk
#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
}

impl Workbook {
    /// Bind to `path`, seeding the sample sheet when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let workbook = Self { path: path.into() };
        workbook.ensure_exists()?;
        Ok(workbook)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let book = self.load()?;
        Ok(book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect())
    }

    /// Row-major matrix between the range corners, inclusive
    pub fn get_range(&self, range: &CellRange) -> Result<RangeData> {
        let (from_row, from_col) = address_to_rc(&range.from)?;
        let (to_row, to_col) = address_to_rc(&range.to)?;

        let rows = u64::from(to_row.saturating_sub(from_row)) + 1;
        let cols = u64::from(to_col.saturating_sub(from_col)) + 1;
        let cells = rows.saturating_mul(cols);
        if cells > MAX_RANGE_CELLS {
            return Err(WorkbookError::RangeTooLarge {
                cells,
                max: MAX_RANGE_CELLS,
            });
        }

        let book = self.load()?;
        let sheet = book
            .get_sheet_by_name(&range.sheet)
            .ok_or_else(|| WorkbookError::SheetNotFound(range.sheet.clone()))?;

        let data = (from_row..=to_row)
            .map(|row| {
                (from_col..=to_col)
                    .map(|col| {
                        let address = rc_to_address(row, col);
                        sheet
                            .get_cell(address.as_str())
                            .map(read_cell)
                            .unwrap_or_else(CellData::empty)
                    })
                    .collect()
            })
            .collect();

        Ok(RangeData {
            range: range.clone(),
            data,
        })
    }

    /// Write one value, creating the sheet if it is absent
    pub fn update_cell(&self, sheet: &str, address: &str, value: &Value) -> Result<()> {
        address_to_rc(address)?;

        let mut book = self.load()?;
        let worksheet = sheet_or_create(&mut book, sheet)?;
        write_cell(worksheet.get_cell_mut(address), value);

        debug!(sheet, address, "Updated cell");
        self.save(&book)
    }

    /// Write a rectangular block anchored at `range.from`
    ///
    /// Only the anchor is used; `range.to` does not clip the block.
    pub fn update_range(&self, range: &CellRange, values: &[Vec<Value>]) -> Result<()> {
        let (anchor_row, anchor_col) = address_to_rc(&range.from)?;

        let mut book = self.load()?;
        let worksheet = sheet_or_create(&mut book, &range.sheet)?;

        for (row_offset, row) in values.iter().enumerate() {
            for (col_offset, value) in row.iter().enumerate() {
                let address =
                    rc_to_address(anchor_row + row_offset as u32, anchor_col + col_offset as u32);
                write_cell(worksheet.get_cell_mut(address.as_str()), value);
            }
        }

        debug!(range = %range, rows = values.len(), "Updated range");
        self.save(&book)
    }

    /// Raw formula source of a cell, never evaluated
    ///
    /// A missing sheet or an empty cell both yield `None`.
    pub fn get_cell_formula(&self, sheet: &str, address: &str) -> Result<Option<String>> {
        address_to_rc(address)?;

        let book = self.load()?;
        let Some(worksheet) = book.get_sheet_by_name(sheet) else {
            return Ok(None);
        };

        Ok(worksheet
            .get_cell(address)
            .filter(|cell| cell.is_formula())
            .map(|cell| cell.get_formula().to_string()))
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let book = sample_book()?;
        self.save(&book)?;
        info!(path = %self.path.display(), "Seeded sample workbook");
        Ok(())
    }

    fn load(&self) -> Result<Spreadsheet> {
        // The file may have been removed since open
        self.ensure_exists()?;
        umya_spreadsheet::reader::xlsx::read(&self.path).map_err(WorkbookError::xlsx)
    }

    fn save(&self, book: &Spreadsheet) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(book, &self.path).map_err(WorkbookError::xlsx)
    }
}

fn sheet_or_create<'a>(book: &'a mut Spreadsheet, name: &str) -> Result<&'a mut Worksheet> {
    if book.get_sheet_by_name(name).is_none() {
        book.new_sheet(name).map_err(WorkbookError::xlsx)?;
        debug!(sheet = name, "Created sheet");
    }
    book.get_sheet_by_name_mut(name)
        .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
}

fn read_cell(cell: &Cell) -> CellData {
    let formula = cell
        .is_formula()
        .then(|| cell.get_formula().to_string());

    let cell_type = match cell.get_data_type() {
        "n" => CellType::Numeric,
        "b" => CellType::Boolean,
        "e" => CellType::Error,
        _ => CellType::String,
    };

    let raw = cell.get_value();
    let value = if raw.is_empty() {
        None
    } else {
        Some(match cell_type {
            CellType::Numeric => raw
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            CellType::Boolean => CellValue::Bool(raw.eq_ignore_ascii_case("true") || raw == "1"),
            CellType::String | CellType::Error => CellValue::Text(raw.to_string()),
        })
    };

    if value.is_none() && formula.is_none() {
        return CellData::empty();
    }

    CellData {
        value,
        formula,
        cell_type,
    }
}

fn write_cell(cell: &mut Cell, value: &Value) {
    match CellValue::from_json(value) {
        Some(CellValue::Number(n)) => {
            cell.set_value_number(n);
        }
        Some(CellValue::Bool(b)) => {
            cell.set_value_bool(b);
        }
        Some(CellValue::Text(s)) => {
            cell.set_value_string(s);
        }
        None if value.is_null() => {
            cell.set_value_string(String::new());
        }
        None => {
            cell.set_value_string(value.to_string());
        }
    }
}

fn sample_book() -> Result<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = sheet_or_create(&mut book, DEFAULT_SHEET)?;

    for (col, header) in ["Email", "Amount", "Status", "Formula", "Total"]
        .iter()
        .enumerate()
    {
        sheet
            .get_cell_mut(rc_to_address(0, col as u32).as_str())
            .set_value_string(*header);
    }

    for (offset, (email, amount, status)) in SAMPLE_ROWS.iter().enumerate() {
        let row = offset as u32 + 2;
        sheet.get_cell_mut(format!("A{}", row).as_str()).set_value_string(*email);
        sheet.get_cell_mut(format!("B{}", row).as_str()).set_value_number(*amount);
        sheet.get_cell_mut(format!("C{}", row).as_str()).set_value_string(*status);
        sheet.get_cell_mut(format!("D{}", row).as_str()).set_formula(format!("B{}*2", row));
        sheet.get_cell_mut(format!("E{}", row).as_str()).set_formula(format!("B{}*2", row));
    }

    Ok(book)
}
