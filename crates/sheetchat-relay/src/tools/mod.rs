mod args;
mod executor;
mod registry;

pub use args::{
    CellFormulaArgs, ConfirmActionArgs, ReadRangeArgs, ToolError, ToolInvocationRequest,
    UpdateCellArgs,
};
pub use executor::{SheetToolExecutor, ToolExecutor};
pub use registry::{registry, CONFIRM_ACTION, GET_CELL_FORMULA, READ_EXCEL_RANGE, UPDATE_EXCEL_CELL};
