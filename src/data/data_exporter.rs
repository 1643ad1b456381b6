use arboard::Clipboard;
use chrono::Local;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::result_set::{CellValue, ResultSet};
use crate::error::{Result, WorkbenchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Serializes a whole result set.
///
/// Exports always cover the complete original result: every row and every
/// column of the ResultSet, regardless of what the grid is currently
/// filtering, sorting, paging or hiding.
pub struct DataExporter;

impl DataExporter {
    /// CSV with a header row of `columns`. Fields containing delimiters,
    /// quotes or newlines are quoted.
    pub fn to_csv(result: &ResultSet) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());

        writer.write_record(&result.columns)?;
        for row in &result.rows {
            let fields = result.columns.iter().map(|c| row.get(c).as_text().into_owned());
            writer.write_record(fields)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| WorkbenchError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| WorkbenchError::Export(e.to_string()))
    }

    /// Pretty JSON array of row objects with keys in column order.
    /// Numbers stay numbers and missing cells become null.
    pub fn to_json(result: &ResultSet) -> Result<String> {
        let rows: Vec<Value> = result
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = result
                    .columns
                    .iter()
                    .map(|c| (c.clone(), cell_to_json(row.get(c))))
                    .collect();
                Value::Object(object)
            })
            .collect();

        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Parse CSV text back into a header and string rows.
    pub fn parse_csv(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(String::from).collect());
        }
        Ok((headers, rows))
    }

    pub fn serialize(result: &ResultSet, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => Self::to_csv(result),
            ExportFormat::Json => Self::to_json(result),
        }
    }

    /// Write `query_results_<timestamp>.<ext>` into `dir`, returning its path
    pub fn export_to_file(result: &ResultSet, format: ExportFormat, dir: &Path) -> Result<PathBuf> {
        let content = Self::serialize(result, format)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S%3f");
        let path = dir.join(format!("query_results_{}.{}", timestamp, format.extension()));

        fs::create_dir_all(dir)?;
        fs::write(&path, content)?;

        info!(
            "Exported {} rows to {} file: {}",
            result.rows.len(),
            format.extension(),
            path.display()
        );
        Ok(path)
    }

    /// Put the CSV form of the result on the system clipboard
    pub fn copy_to_clipboard(result: &ResultSet) -> Result<usize> {
        let csv = Self::to_csv(result)?;
        let mut clipboard =
            Clipboard::new().map_err(|e| WorkbenchError::Export(format!("clipboard: {}", e)))?;
        clipboard
            .set_text(csv.clone())
            .map_err(|e| WorkbenchError::Export(format!("clipboard: {}", e)))?;

        info!("Copied {} rows to clipboard", result.rows.len());
        Ok(csv.len())
    }
}

fn cell_to_json(cell: &CellValue) -> Value {
    match cell {
        CellValue::Integer(i) => Value::from(*i),
        CellValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::String(s) => Value::String(s.clone()),
        CellValue::Null => Value::Null,
    }
}
