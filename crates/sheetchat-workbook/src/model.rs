use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rectangular block on one sheet, corners inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub sheet: String,
    pub from: String,
    pub to: String,
}

impl CellRange {
    pub fn new(sheet: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}:{}", self.sheet, self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Scalar JSON to cell value; `null`, arrays and objects have no cell form
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(CellValue::Number),
            Value::Bool(b) => Some(CellValue::Bool(*b)),
            Value::String(s) => Some(CellValue::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Numeric,
    #[default]
    String,
    Boolean,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub value: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(rename = "type")]
    pub cell_type: CellType,
}

impl CellData {
    /// Placeholder for a cell with nothing stored in it
    pub fn empty() -> Self {
        Self {
            value: None,
            formula: None,
            cell_type: CellType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeData {
    pub range: CellRange,
    pub data: Vec<Vec<CellData>>,
}
