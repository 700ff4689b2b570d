//! Ingestion of one round's price sheet.
//!
//! Each input file holds a single sheet with one table on it. The table may
//! float anywhere on the sheet as long as nothing sits above it or to its
//! left. Columns are classified up front: descriptor (text) columns must all
//! come before vendor (numeric) columns.

use crate::error::{Result, TcoError};
use crate::round::{self, RoundId};
use crate::table::{is_total_label, Cell};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Column names that may not appear in a round table.
///
/// A running-number column would always be classified as a vendor price.
const RESERVED_COLUMNS: &[&str] = &["No"];

/// Cell grid of one sheet, positioned as in the source (row 0 is the first sheet row).
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub grid: Vec<Vec<Cell>>,
}

/// One data row of a round table.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRow {
    /// Descriptor values, one per descriptor column.
    pub descriptors: Vec<String>,
    /// Vendor prices, one per vendor column. `None` where the cell was empty.
    pub prices: Vec<Option<f64>>,
}

/// The normalized table of a single round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTable {
    pub round: RoundId,
    pub descriptor_columns: Vec<String>,
    pub vendor_columns: Vec<String>,
    pub rows: Vec<RoundRow>,
}

impl RoundTable {
    /// All column names, descriptors first.
    pub fn columns(&self) -> Vec<String> {
        self.descriptor_columns
            .iter()
            .chain(self.vendor_columns.iter())
            .cloned()
            .collect()
    }
}

// ============================================================================
// Reading
// ============================================================================

fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn is_spreadsheet_ext(ext: &str) -> bool {
    matches!(ext, "xlsx" | "xlsm" | "xlsb" | "xls" | "ods")
}

/// Read the first sheet of a spreadsheet or CSV file.
pub fn read_raw_sheet(path: &Path) -> Result<RawSheet> {
    let ext = extension(&path.to_string_lossy());
    if ext == "csv" {
        let file = std::fs::File::open(path)?;
        read_csv_grid(&round::round_label(path), file)
    } else if is_spreadsheet_ext(&ext) {
        let mut workbook = open_workbook_auto(path)?;
        read_first_sheet(&mut workbook)
    } else {
        Err(TcoError::UnsupportedFile(path.to_path_buf()))
    }
}

/// Read the first sheet of an in-memory file. The extension of `filename`
/// selects the format.
pub fn read_raw_sheet_from_bytes(filename: &str, data: &[u8]) -> Result<RawSheet> {
    let ext = extension(filename);
    if ext == "csv" {
        read_csv_grid(&round::round_label(Path::new(filename)), data)
    } else if is_spreadsheet_ext(&ext) {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
        read_first_sheet(&mut workbook)
    } else {
        Err(TcoError::UnsupportedFile(filename.into()))
    }
}

fn read_first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<RawSheet> {
    let names = workbook.sheet_names();
    let Some(name) = names.first().cloned() else {
        return Ok(RawSheet {
            name: String::new(),
            grid: Vec::new(),
        });
    };
    if names.len() > 1 {
        log::warn!(
            "Workbook has {} sheets; reading '{}' and ignoring the rest",
            names.len(),
            name
        );
    }

    let range = workbook.worksheet_range(&name)?;

    // calamine trims leading empty rows/columns; put them back so positions
    // match the sheet.
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col];
        cells.extend(row.iter().map(cell_from_data));
        grid.push(cells);
    }

    Ok(RawSheet { name, grid })
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(e) => {
            log::warn!("Treating spreadsheet error cell ({:?}) as empty", e);
            Cell::Empty
        }
        other => Cell::Text(other.to_string()),
    }
}

/// Read a CSV file as a plain grid. The header is located later, like any
/// other floating table.
fn read_csv_grid<R: Read>(name: &str, reader: R) -> Result<RawSheet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        grid.push(cells);
    }

    Ok(RawSheet {
        name: name.to_string(),
        grid,
    })
}

// ============================================================================
// Table location and classification
// ============================================================================

/// Turn a raw sheet into a validated round table.
pub fn ingest_sheet(raw: &RawSheet, round: RoundId) -> Result<RoundTable> {
    let label = round.label.clone();
    let empty = || empty_sheet(&round.label);

    // Header: first row with any content. Its first non-empty cell is the table origin.
    let header_row = raw
        .grid
        .iter()
        .position(|row| row.iter().any(|c| !c.is_empty()))
        .ok_or_else(empty)?;
    let header = &raw.grid[header_row];
    let origin = header.iter().position(|c| !c.is_empty()).ok_or_else(empty)?;
    let end = header
        .iter()
        .rposition(|c| !c.is_empty())
        .map(|i| i + 1)
        .ok_or_else(empty)?;

    let mut names = Vec::with_capacity(end - origin);
    for (col, cell) in header.iter().enumerate().take(end).skip(origin) {
        if cell.is_empty() {
            return Err(TcoError::BlankHeader {
                round: label,
                column: col + 1,
            });
        }
        names.push(cell.to_plain_string().trim().to_string());
    }

    if let Some(reserved) = names
        .iter()
        .find(|n| RESERVED_COLUMNS.iter().any(|r| n.eq_ignore_ascii_case(r)))
    {
        return Err(TcoError::ReservedColumn {
            round: label,
            column: reserved.clone(),
        });
    }

    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(TcoError::DuplicateColumn {
                round: label,
                column: name.clone(),
            });
        }
    }

    let body = collect_body(raw, &label, header_row, origin, end)?;
    if body.is_empty() {
        return Err(empty_sheet(&label));
    }

    let split = classify_columns(&label, &names, &body)?;

    let mut rows = Vec::with_capacity(body.len());
    for cells in body {
        let descriptors: Vec<String> = cells[..split]
            .iter()
            .map(|c| c.to_plain_string().trim().to_string())
            .collect();
        // Any descriptor may carry the marker ("", "TOTAL" under Scope, Desc)
        if descriptors.iter().any(|d| is_total_label(d)) {
            log::warn!(
                "Round '{}': dropping user-supplied TOTAL row; totals are recomputed",
                label
            );
            continue;
        }
        let prices = cells[split..].iter().map(Cell::as_number).collect();
        rows.push(RoundRow {
            descriptors,
            prices,
        });
    }

    if rows.is_empty() {
        return Err(empty_sheet(&label));
    }

    log::debug!(
        "Round '{}': {} rows, {} descriptor columns, {} vendor columns",
        label,
        rows.len(),
        split,
        names.len() - split
    );

    let vendor_columns = names.split_off(split);
    Ok(RoundTable {
        round,
        descriptor_columns: names,
        vendor_columns,
        rows,
    })
}

fn empty_sheet(label: &str) -> TcoError {
    TcoError::EmptySheet {
        round: label.to_string(),
    }
}

/// Collect the contiguous data block under the header, cut to the header's span.
fn collect_body(
    raw: &RawSheet,
    label: &str,
    header_row: usize,
    origin: usize,
    end: usize,
) -> Result<Vec<Vec<Cell>>> {
    let mut body = Vec::new();
    let mut rows = raw.grid.iter().enumerate().skip(header_row + 1);

    for (r, row) in rows.by_ref() {
        let cells: Vec<Cell> = (origin..end)
            .map(|c| row.get(c).cloned().unwrap_or(Cell::Empty))
            .collect();
        if cells.iter().all(Cell::is_empty) {
            break;
        }

        if let Some(c) = row.iter().take(origin).position(|c| !c.is_empty()) {
            return Err(TcoError::MisplacedTable {
                round: label.to_string(),
                row: r + 1,
                col: c + 1,
            });
        }
        if row.iter().skip(end).any(|c| !c.is_empty()) {
            log::warn!(
                "Round '{}': ignoring cells right of the table on row {}",
                label,
                r + 1
            );
        }

        body.push(cells);
    }

    if rows.any(|(_, row)| row.iter().any(|c| !c.is_empty())) {
        log::warn!("Round '{}': ignoring content below the table", label);
    }

    Ok(body)
}

/// Classify columns and return the index of the first vendor column.
///
/// A column is numeric when every non-empty value in it parses as a number.
fn classify_columns(label: &str, names: &[String], body: &[Vec<Cell>]) -> Result<usize> {
    let numeric: Vec<bool> = (0..names.len())
        .map(|col| {
            body.iter()
                .all(|row| row[col].is_empty() || row[col].as_number().is_some())
        })
        .collect();

    let split = numeric.iter().position(|&n| n).unwrap_or(names.len());
    if let Some(offset) = numeric[split..].iter().position(|&n| !n) {
        return Err(TcoError::ColumnOrder {
            round: label.to_string(),
            numeric: names[split].clone(),
            non_numeric: names[split + offset].clone(),
        });
    }

    if split == 0 {
        return Err(TcoError::MissingDescriptorColumn {
            round: label.to_string(),
        });
    }
    if split == names.len() {
        return Err(TcoError::MissingVendorColumn {
            round: label.to_string(),
        });
    }

    Ok(split)
}

/// Ingest one round file from disk.
pub fn ingest(path: &Path) -> Result<RoundTable> {
    let round = round::identify(path);
    let raw = read_raw_sheet(path)?;
    ingest_sheet(&raw, round)
}

/// Ingest one round file held in memory (e.g. an upload).
pub fn ingest_bytes(filename: &str, data: &[u8]) -> Result<RoundTable> {
    let round = round::identify(Path::new(filename));
    let raw = read_raw_sheet_from_bytes(filename, data)?;
    ingest_sheet(&raw, round)
}
