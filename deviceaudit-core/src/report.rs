//! Report sink: the data → table boundary
//!
//! Rows leave the core as fixed-column tables. Writing files or printing is
//! left to `TableSink` implementations; the core only guarantees column
//! order and that every column is present in every row.

use crate::error::{AuditError, Result};
use crate::resolver::FlattenedRecord;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;

/// Column order of the extraction report
pub const COLUMNS: [&str; 8] = [
    "uid",
    "device_id",
    "registered",
    "last_access",
    "method",
    "status",
    "provider_config_id",
    "expired",
];

/// One table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Bool(bool),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Bool(b) => Value::Bool(*b),
        }
    }
}

impl FlattenedRecord {
    /// Cells in `COLUMNS` order
    pub fn to_cells(&self) -> [Cell; 8] {
        [
            Cell::Text(self.uid.clone()),
            Cell::Text(self.device_id.clone()),
            Cell::Text(self.registered.clone()),
            Cell::Text(self.last_access.clone()),
            Cell::Text(self.method.clone()),
            Cell::Text(self.status.clone()),
            Cell::Text(self.provider_config_id.clone()),
            Cell::Bool(self.expired),
        ]
    }
}

/// Consumer of a finished report
pub trait TableSink {
    fn write_table(&mut self, columns: &[&str], rows: &[Vec<Cell>]) -> Result<()>;
}

/// Hand ordered records to a sink in the fixed column layout
pub fn export_records(records: &[FlattenedRecord], sink: &mut dyn TableSink) -> Result<()> {
    let rows: Vec<Vec<Cell>> = records.iter().map(|r| r.to_cells().to_vec()).collect();
    sink.write_table(&COLUMNS, &rows)
}

/// Keeps the last table in memory
#[derive(Debug, Default)]
pub struct MemoryTableSink {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableSink for MemoryTableSink {
    fn write_table(&mut self, columns: &[&str], rows: &[Vec<Cell>]) -> Result<()> {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.rows = rows.to_vec();
        Ok(())
    }
}

/// Writes a JSON array of row objects, keys in column order
pub struct JsonExportSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonExportSink<W> {
    pub fn new(writer: W) -> Self {
        JsonExportSink {
            writer,
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for JsonExportSink<W> {
    fn write_table(&mut self, columns: &[&str], rows: &[Vec<Cell>]) -> Result<()> {
        let objects: Vec<Value> = rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, cell)| (column.to_string(), Value::from(cell)))
                    .collect();
                Value::Object(object)
            })
            .collect();

        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &objects)
        } else {
            serde_json::to_writer(&mut self.writer, &objects)
        };
        written.map_err(|e| AuditError::Export(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .map_err(|e| AuditError::Export(e.to_string()))
    }
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    parts.join(" | ").trim_end().to_string()
}

/// Aligned plain-text table
pub struct TextTableSink<W: Write> {
    writer: W,
}

impl<W: Write> TextTableSink<W> {
    pub fn new(writer: W) -> Self {
        TextTableSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for TextTableSink<W> {
    fn write_table(&mut self, columns: &[&str], rows: &[Vec<Cell>]) -> Result<()> {
        let rendered: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in &rendered {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&render_line(columns.iter().copied(), &widths));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');
        for row in &rendered {
            out.push_str(&render_line(row.iter().map(String::as_str), &widths));
            out.push('\n');
        }

        self.writer
            .write_all(out.as_bytes())
            .map_err(|e| AuditError::Export(e.to_string()))
    }
}
