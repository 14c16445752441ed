use async_trait::async_trait;
use serde_json::{json, Value};
use sheetchat_workbook::{parse_range, split_sheet_address, Workbook, DEFAULT_SHEET};
use std::time::Instant;

use super::args::{
    CellFormulaArgs, ConfirmActionArgs, ReadRangeArgs, ToolError, ToolInvocationRequest,
    UpdateCellArgs,
};

/// Executes tool calls requested by the model
///
/// Never fails: errors are folded into the returned JSON as `{"error": ..}`
/// so the model sees them on the follow-up turn.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, arguments: &str) -> Value;
}

/// Tool executor backed by the xlsx workbook
#[derive(Debug, Clone)]
pub struct SheetToolExecutor {
    workbook: Workbook,
}

impl SheetToolExecutor {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    async fn dispatch(&self, request: ToolInvocationRequest) -> Result<Value, ToolError> {
        match request {
            ToolInvocationRequest::ConfirmAction(args) => Ok(confirmation_required(args)),
            ToolInvocationRequest::UpdateCell(args) if !args.is_confirmed() => {
                Err(ToolError::NotConfirmed)
            }
            ToolInvocationRequest::UpdateCell(args) => {
                self.on_workbook(move |wb| update_cell(wb, args)).await
            }
            ToolInvocationRequest::ReadRange(args) => {
                self.on_workbook(move |wb| read_range(wb, args)).await
            }
            ToolInvocationRequest::CellFormula(args) => {
                self.on_workbook(move |wb| cell_formula(wb, args)).await
            }
        }
    }

    /// Run a blocking workbook operation off the async runtime
    async fn on_workbook<F>(&self, op: F) -> Result<Value, ToolError>
    where
        F: FnOnce(&Workbook) -> Result<Value, ToolError> + Send + 'static,
    {
        let workbook = self.workbook.clone();
        tokio::task::spawn_blocking(move || op(&workbook))
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?
    }
}

#[async_trait]
impl ToolExecutor for SheetToolExecutor {
    async fn execute(&self, tool_name: &str, arguments: &str) -> Value {
        let start = Instant::now();

        let outcome = match ToolInvocationRequest::parse(tool_name, arguments) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(result) => {
                tracing::info!(tool = tool_name, duration_ms, "Tool executed");
                result
            }
            Err(e) => {
                tracing::warn!(tool = tool_name, duration_ms, error = %e, "Tool failed");
                e.to_result()
            }
        }
    }
}

fn confirmation_required(args: ConfirmActionArgs) -> Value {
    json!({
        "type": "confirmation_required",
        "action": args.action,
        "message": args.message,
        "details": args.details,
        "requiresConfirmation": true,
    })
}

fn read_range(workbook: &Workbook, args: ReadRangeArgs) -> Result<Value, ToolError> {
    let text = args.range.strip_prefix('@').unwrap_or(&args.range);
    let range = parse_range(text).ok_or_else(|| ToolError::InvalidRange(args.range.clone()))?;

    let data = workbook.get_range(&range)?;
    Ok(json!({
        "success": true,
        "range": data.range,
        "data": data.data,
    }))
}

/// Caller has already checked `confirmed`
fn update_cell(workbook: &Workbook, args: UpdateCellArgs) -> Result<Value, ToolError> {
    workbook.update_cell(&args.sheet, &args.cell, &args.value)?;

    let shown = match &args.value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(json!({
        "success": true,
        "message": format!("Cell {}!{} updated to \"{}\"", args.sheet, args.cell, shown),
    }))
}

fn cell_formula(workbook: &Workbook, args: CellFormulaArgs) -> Result<Value, ToolError> {
    let (sheet, cell) = split_sheet_address(&args.cell).unwrap_or_else(|| {
        (
            args.sheet.clone().unwrap_or_else(|| DEFAULT_SHEET.to_string()),
            args.cell.clone(),
        )
    });

    let target = format!("{}!{}", sheet, cell);
    Ok(match workbook.get_cell_formula(&sheet, &cell)? {
        Some(formula) => json!({
            "hasFormula": true,
            "formula": formula,
            "cell": target,
        }),
        None => json!({
            "hasFormula": false,
            "message": format!("Cell {} has no formula", target),
        }),
    })
}
