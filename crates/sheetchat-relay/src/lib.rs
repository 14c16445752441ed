pub mod accumulator;
pub mod relay;
pub mod tools;
pub mod types;

pub use accumulator::ToolCallAccumulator;
pub use relay::{ChatRelay, Completion, RelayStream};
pub use tools::{
    registry, CellFormulaArgs, ConfirmActionArgs, ReadRangeArgs, SheetToolExecutor, ToolError,
    ToolExecutor, ToolInvocationRequest, UpdateCellArgs,
};
pub use types::{RelayEvent, RelayPhase};
