use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("Sheet \"{0}\" not found")]
    SheetNotFound(String),

    #[error("Range too large: {cells} cells requested, at most {max} allowed")]
    RangeTooLarge { cells: u64, max: u64 },

    #[error("Spreadsheet codec error: {0}")]
    Xlsx(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkbookError {
    pub(crate) fn xlsx(err: impl std::fmt::Display) -> Self {
        WorkbookError::Xlsx(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkbookError>;
