use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, WorkbenchError};

/// A single scalar cell. Rows are sparse, so a missing cell reads as `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

static NULL_CELL: CellValue = CellValue::Null;

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text form used for display, filtering, string sorting and export.
    /// Strings are borrowed; everything else is formatted.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            CellValue::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Convert a JSON scalar. Booleans and nested values are kept as text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
            },
            JsonValue::String(s) => CellValue::String(s.clone()),
            JsonValue::Bool(b) => CellValue::String(b.to_string()),
            other => CellValue::String(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            // Integral floats print without a fractional part: 3.0 -> "3"
            CellValue::Float(fl) if fl.is_finite() && fl.fract() == 0.0 && fl.abs() < 1e15 => {
                write!(f, "{}", *fl as i64)
            }
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value as i64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// A sparse record: column name to cell. The column set is only known at
/// runtime, per result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: HashMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Cell for `column`, `Null` when absent
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&NULL_CELL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn from_json_object(object: &serde_json::Map<String, JsonValue>) -> Self {
        let cells = object
            .iter()
            .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
            .collect();
        Self { cells }
    }
}

/// The tabular output of one query execution. Immutable once produced;
/// the grid only derives views over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    /// Total rows available at the source when the result was limited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(default)]
    pub is_limited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_applied: Option<usize>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time_ms: 0,
            total_rows: None,
            is_limited: false,
            limit_applied: None,
        }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self::new(columns, Vec::new())
    }

    pub fn with_execution_time(mut self, millis: u64) -> Self {
        self.execution_time_ms = millis;
        self
    }

    /// Mark the result as truncated at `limit` out of `total` source rows
    pub fn with_limit(mut self, total: usize, limit: usize) -> Self {
        self.total_rows = Some(total);
        self.is_limited = total > limit;
        self.limit_applied = Some(limit);
        self
    }

    /// Build from an array of JSON objects, keeping only scalar conversion
    pub fn from_json_rows(columns: Vec<String>, rows: &JsonValue) -> Result<Self> {
        let array = rows
            .as_array()
            .ok_or_else(|| WorkbenchError::Export("expected a JSON array of rows".to_string()))?;

        let mut parsed = Vec::with_capacity(array.len());
        for (idx, value) in array.iter().enumerate() {
            let object = value.as_object().ok_or_else(|| {
                WorkbenchError::Export(format!("row {} is not a JSON object", idx))
            })?;
            parsed.push(Row::from_json_object(object));
        }

        Ok(Self::new(columns, parsed))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.rows.get(row).map(|r| r.get(column))
    }
}
