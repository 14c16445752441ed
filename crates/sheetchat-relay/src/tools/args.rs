use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sheetchat_workbook::WorkbookError;
use thiserror::Error;

use super::registry::{CONFIRM_ACTION, GET_CELL_FORMULA, READ_EXCEL_RANGE, UPDATE_EXCEL_CELL};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadRangeArgs {
    pub range: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfirmActionArgs {
    pub action: String,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateCellArgs {
    pub sheet: String,
    pub cell: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub confirmed: Option<bool>,
}

impl UpdateCellArgs {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CellFormulaArgs {
    #[serde(default)]
    pub sheet: Option<String>,
    pub cell: String,
}

/// A tool call decoded against its declared argument schema
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocationRequest {
    ReadRange(ReadRangeArgs),
    ConfirmAction(ConfirmActionArgs),
    UpdateCell(UpdateCellArgs),
    CellFormula(CellFormulaArgs),
}

impl ToolInvocationRequest {
    /// Decode streamed argument text for `name`; empty text counts as `{}`
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolError> {
        let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };

        match name {
            READ_EXCEL_RANGE => decode(name, arguments).map(Self::ReadRange),
            CONFIRM_ACTION => decode(name, arguments).map(Self::ConfirmAction),
            UPDATE_EXCEL_CELL => decode(name, arguments).map(Self::UpdateCell),
            GET_CELL_FORMULA => decode(name, arguments).map(Self::CellFormula),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ReadRange(_) => READ_EXCEL_RANGE,
            Self::ConfirmAction(_) => CONFIRM_ACTION,
            Self::UpdateCell(_) => UPDATE_EXCEL_CELL,
            Self::CellFormula(_) => GET_CELL_FORMULA,
        }
    }
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: &str) -> Result<T, ToolError> {
    serde_json::from_str(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Failure of a single tool call, reported back to the model as `{"error": ..}`
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Invalid range format. Use Sheet1!A1:B3")]
    InvalidRange(String),

    #[error("Action not confirmed. Use confirmAction tool first.")]
    NotConfirmed,

    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    #[error("Tool execution error: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn to_result(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_tool() {
        assert_eq!(
            ToolInvocationRequest::parse("readExcelRange", r#"{"range":"Sheet1!A1:B2"}"#).unwrap(),
            ToolInvocationRequest::ReadRange(ReadRangeArgs {
                range: "Sheet1!A1:B2".to_string()
            })
        );

        let confirm = ToolInvocationRequest::parse(
            "confirmAction",
            r#"{"action":"update","message":"Set B2?","details":{"target":"B2"}}"#,
        )
        .unwrap();
        assert_eq!(confirm.tool_name(), "confirmAction");

        match ToolInvocationRequest::parse(
            "updateExcelCell",
            r#"{"sheet":"Sheet1","cell":"B2","value":5}"#,
        )
        .unwrap()
        {
            ToolInvocationRequest::UpdateCell(args) => {
                assert!(!args.is_confirmed());
                assert_eq!(args.value, json!(5));
            }
            other => panic!("Expected UpdateCell, got {:?}", other),
        }

        match ToolInvocationRequest::parse("getCellFormula", r#"{"cell":"D2"}"#).unwrap() {
            ToolInvocationRequest::CellFormula(args) => assert_eq!(args.sheet, None),
            other => panic!("Expected CellFormula, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_tool() {
        assert!(matches!(
            ToolInvocationRequest::parse("deleteEverything", "{}"),
            Err(ToolError::UnknownTool(name)) if name == "deleteEverything"
        ));
    }

    #[test]
    fn test_parse_bad_arguments() {
        let err = ToolInvocationRequest::parse("readExcelRange", r#"{"range": 12"#).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == "readExcelRange"));

        // Empty text decodes as {}, which still misses the required field
        let err = ToolInvocationRequest::parse("readExcelRange", "").unwrap_err();
        assert!(err.to_string().contains("missing field `range`"));
    }

    #[test]
    fn test_not_confirmed_message() {
        assert_eq!(
            ToolError::NotConfirmed.to_result(),
            json!({"error": "Action not confirmed. Use confirmAction tool first."})
        );
    }
}
