pub mod address;
pub mod error;
pub mod model;
pub mod workbook;

pub use address::{address_to_rc, parse_range, rc_to_address, split_sheet_address};
pub use error::{Result, WorkbookError};
pub use model::{CellData, CellRange, CellType, CellValue, RangeData};
pub use workbook::{Workbook, DEFAULT_SHEET, MAX_RANGE_CELLS};
