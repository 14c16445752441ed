use serde_json::json;
use sheetchat_llm::Tool;

pub const READ_EXCEL_RANGE: &str = "readExcelRange";
pub const CONFIRM_ACTION: &str = "confirmAction";
pub const UPDATE_EXCEL_CELL: &str = "updateExcelCell";
pub const GET_CELL_FORMULA: &str = "getCellFormula";

/// Tool declarations sent to the provider, shared by streaming and non-streaming chat
pub fn registry() -> Vec<Tool> {
    vec![
        Tool::new(
            READ_EXCEL_RANGE,
            "Read a range of cells from the workbook. The sheet 'Sheet1' holds emails, \
             amounts, statuses and formulas. Range format: Sheet1!A1:B3",
            json!({
                "type": "object",
                "properties": {
                    "range": {
                        "type": "string",
                        "description": "Range in format Sheet1!A1:B3. Columns A-E carry the headers: Email, Amount, Status, Formula, Total"
                    }
                },
                "required": ["range"]
            }),
        ),
        Tool::new(
            CONFIRM_ACTION,
            "Request user confirmation before performing dangerous actions like update or \
             delete operations. Shows a confirmation dialog to the user.",
            json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "description": "Type of action to confirm: 'update', 'delete', 'clear'"
                    },
                    "message": {
                        "type": "string",
                        "description": "Confirmation message to show to the user"
                    },
                    "details": {
                        "type": "object",
                        "description": "Details about the action to be performed",
                        "properties": {
                            "type": { "type": "string" },
                            "target": { "type": "string" },
                            "value": { "type": "string" }
                        }
                    }
                },
                "required": ["action", "message", "details"]
            }),
        ),
        Tool::new(
            UPDATE_EXCEL_CELL,
            "Update a single cell in the workbook. Only call this after the user confirmed \
             the change through confirmAction, and pass confirmed: true.",
            json!({
                "type": "object",
                "properties": {
                    "sheet": {
                        "type": "string",
                        "description": "Sheet name (usually 'Sheet1')"
                    },
                    "cell": {
                        "type": "string",
                        "description": "Cell address like 'A1', 'B2'"
                    },
                    "value": {
                        "description": "New value for the cell"
                    },
                    "confirmed": {
                        "type": "boolean",
                        "description": "Whether this action has been confirmed by the user"
                    }
                },
                "required": ["sheet", "cell", "value"]
            }),
        ),
        Tool::new(
            GET_CELL_FORMULA,
            "Get the formula stored in a specific cell so it can be explained",
            json!({
                "type": "object",
                "properties": {
                    "sheet": {
                        "type": "string",
                        "description": "Sheet name (usually 'Sheet1')"
                    },
                    "cell": {
                        "type": "string",
                        "description": "Cell address like 'D2', 'E3'"
                    }
                },
                "required": ["sheet", "cell"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        let names: Vec<_> = registry().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(
            names,
            vec![READ_EXCEL_RANGE, CONFIRM_ACTION, UPDATE_EXCEL_CELL, GET_CELL_FORMULA]
        );
    }

    #[test]
    fn test_update_requires_sheet_cell_value() {
        let tools = registry();
        let update = tools.iter().find(|t| t.name() == UPDATE_EXCEL_CELL).unwrap();
        assert_eq!(
            update.function.parameters["required"],
            json!(["sheet", "cell", "value"])
        );
    }
}
