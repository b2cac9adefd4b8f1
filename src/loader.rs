// Text record loader: reads the `Text` column out of CSV, spreadsheet or JSON files.
use std::fs::{self, File};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use clap::ValueEnum;
use serde_json::Value;
use tracing::debug;

use crate::error::InputError;

pub const TEXT_COLUMN: &str = "Text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    Csv,
    Excel,
    Json,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(TableFormat::Excel),
            "json" => Ok(TableFormat::Json),
            _ => Err(InputError::UnsupportedFormat(ext)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TableFormat::Csv => "CSV",
            TableFormat::Excel => "spreadsheet",
            TableFormat::Json => "JSON",
        }
    }
}

/// The `Text` values of every row, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    texts: Vec<String>,
}

impl Table {
    pub fn load(path: &Path, format: Option<TableFormat>) -> Result<Self, InputError> {
        let format = match format {
            Some(f) => f,
            None => TableFormat::from_path(path)?,
        };
        debug!("Loading {} as {}", path.display(), format.name());
        let texts = match format {
            TableFormat::Csv => read_csv(path)?,
            TableFormat::Excel => read_spreadsheet(path)?,
            TableFormat::Json => read_json(path)?,
        };
        Ok(Self { texts })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, index: usize) -> Result<&str, InputError> {
        self.texts
            .get(index)
            .map(String::as_str)
            .ok_or(InputError::RowOutOfRange {
                index,
                len: self.texts.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.texts.iter().map(String::as_str).enumerate()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> InputError {
    InputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_error(format: TableFormat, err: impl std::fmt::Display) -> InputError {
    InputError::Parse {
        format: format.name(),
        message: err.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Vec<String>, InputError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| parse_error(TableFormat::Csv, e))?;
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == TEXT_COLUMN)
        .ok_or(InputError::MissingTextColumn)?;

    let mut texts = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(TableFormat::Csv, e))?;
        texts.push(record.get(column).unwrap_or("").to_string());
    }
    Ok(texts)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_spreadsheet(path: &Path) -> Result<Vec<String>, InputError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| parse_error(TableFormat::Excel, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error(TableFormat::Excel, "the workbook has no sheets"))?
        .map_err(|e| parse_error(TableFormat::Excel, e))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or(InputError::MissingTextColumn)?;
    let column = header
        .iter()
        .position(|c| cell_text(c) == TEXT_COLUMN)
        .ok_or(InputError::MissingTextColumn)?;

    Ok(rows
        .map(|row| row.get(column).map(cell_text).unwrap_or_default())
        .collect())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_json(path: &Path) -> Result<Vec<String>, InputError> {
    let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| parse_error(TableFormat::Json, e))?;
    texts_from_json(&value)
}

// Accepts a list of records, or a column object keyed by row label.
fn texts_from_json(value: &Value) -> Result<Vec<String>, InputError> {
    match value {
        Value::Array(records) => {
            if !records.iter().any(|r| r.get(TEXT_COLUMN).is_some()) {
                return Err(InputError::MissingTextColumn);
            }
            Ok(records
                .iter()
                .map(|r| r.get(TEXT_COLUMN).map(value_text).unwrap_or_default())
                .collect())
        }
        Value::Object(columns) => match columns.get(TEXT_COLUMN) {
            Some(Value::Array(cells)) => Ok(cells.iter().map(value_text).collect()),
            Some(Value::Object(cells)) => {
                let mut labelled: Vec<(&String, &Value)> = cells.iter().collect();
                if labelled.iter().all(|(k, _)| k.parse::<usize>().is_ok()) {
                    labelled.sort_by_key(|(k, _)| k.parse::<usize>().unwrap_or(usize::MAX));
                }
                Ok(labelled.into_iter().map(|(_, v)| value_text(v)).collect())
            }
            _ => Err(InputError::MissingTextColumn),
        },
        _ => Err(parse_error(
            TableFormat::Json,
            "expected an array of records or an object of columns",
        )),
    }
}
