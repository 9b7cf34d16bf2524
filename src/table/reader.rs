//! Workbook and CSV readers
//!
//! The format is sniffed from the leading bytes so the same entry point
//! serves file paths and raw stdin buffers.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use super::{Cell, RawTable};
use crate::error::{EngineError, EngineResult};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Container format of an input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// xlsx, xlsm, xlsb or ods (all zip containers)
    ZipWorkbook,
    /// Legacy xls
    OleWorkbook,
    Csv,
}

impl TableFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            TableFormat::ZipWorkbook
        } else if bytes.starts_with(OLE_MAGIC) {
            TableFormat::OleWorkbook
        } else {
            TableFormat::Csv
        }
    }
}

/// Read a table from a file on disk
pub fn read_table_file(path: &Path, sheet: Option<&str>) -> EngineResult<RawTable> {
    let bytes = std::fs::read(path)?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    read_table(&bytes, sheet)
}

/// Read a table from an in-memory buffer.
///
/// `sheet` selects a worksheet by name for workbook formats; the first
/// sheet is used otherwise. It is ignored for CSV.
pub fn read_table(bytes: &[u8], sheet: Option<&str>) -> EngineResult<RawTable> {
    if bytes.is_empty() {
        return Err(EngineError::InputFormat("input is empty".into()));
    }

    let format = TableFormat::sniff(bytes);
    debug!("Detected input format {:?}", format);
    match format {
        TableFormat::ZipWorkbook | TableFormat::OleWorkbook => read_workbook(bytes, sheet),
        TableFormat::Csv => read_csv(bytes),
    }
}

fn read_workbook(bytes: &[u8], sheet: Option<&str>) -> EngineResult<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| EngineError::InputFormat(format!("unreadable workbook: {e}")))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| EngineError::InputFormat(format!("sheet '{name}': {e}")))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| EngineError::InputFormat("workbook has no sheets".into()))?
            .map_err(|e| EngineError::InputFormat(format!("first sheet: {e}")))?,
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(EngineError::InputFormat("sheet has no header row".into()));
    };
    let columns: Vec<String> = header.iter().map(header_text).collect();

    let data = rows
        .map(|row| row.iter().map(workbook_cell).collect::<Vec<_>>())
        .filter(|cells| !cells.iter().all(Cell::is_empty))
        .map(|cells| pad(cells, columns.len()))
        .collect();

    Ok(RawTable::new(columns, data))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Empty => Cell::Empty,
        // A date's Display is its serial number, which must not pass as a measurement
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => Cell::Empty,
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

fn read_csv(bytes: &[u8]) -> EngineResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(e, "header"))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(e, "row"))?;
        let cells: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        data.push(pad(cells, columns.len()));
    }

    Ok(RawTable::new(columns, data))
}

fn csv_error(err: csv::Error, part: &str) -> EngineError {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => {
            EngineError::InputFormat("input is neither a workbook nor UTF-8 CSV".into())
        }
        _ => EngineError::InputFormat(format!("bad CSV {part}: {err}")),
    }
}

fn pad(mut cells: Vec<Cell>, width: usize) -> Vec<Cell> {
    if cells.len() < width {
        cells.resize(width, Cell::Empty);
    }
    cells
}
