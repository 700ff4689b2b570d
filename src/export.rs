//! Workbook export of the analysis tables.
//!
//! The whole workbook is built in memory, so a failed export never leaves a
//! partial file behind.

use crate::error::{Result, TcoError};
use crate::format::{column_kind, excel_num_format, format_cell};
use crate::table::{Cell, ColumnKind, RowMarks, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

pub const MERGE_DATA: &str = "Merge Data";
pub const COST_SUMMARY: &str = "Cost Summary";
pub const PIVOT_TABLE: &str = "Pivot Table";
pub const BID_ANALYSIS: &str = "Bid & Price Analysis";
pub const MOVEMENT_ANALYSIS: &str = "Price Movement Analysis";
pub const WINNING_PERFORMANCE: &str = "Winning Performance";
pub const PRICE_TREND: &str = "Price Trend";

/// Every sheet the pipeline produces, in default export order.
pub const SHEET_NAMES: [&str; 7] = [
    MERGE_DATA,
    COST_SUMMARY,
    PIVOT_TABLE,
    BID_ANALYSIS,
    MOVEMENT_ANALYSIS,
    WINNING_PERFORMANCE,
    PRICE_TREND,
];

// Cell styles: (background, font colour)
const TOTAL_STYLE: (&str, &str) = ("#D9EAD3", "#1A5E20");
const FIRST_STYLE: (&str, &str) = ("#C6EFCE", "#006100");
const SECOND_STYLE: (&str, &str) = ("#FFEB9C", "#9C6500");

/// Check a sheet selection against the available tables.
pub fn validate_selection<S: AsRef<str>>(
    tables: &HashMap<String, Table>,
    selected: &[S],
) -> Result<()> {
    if selected.is_empty() {
        return Err(TcoError::NoSheetsSelected);
    }
    let mut seen = HashSet::new();
    for name in selected {
        let name = name.as_ref();
        if !tables.contains_key(name) {
            return Err(TcoError::UnknownSheet(name.to_string()));
        }
        if !seen.insert(name) {
            return Err(TcoError::DuplicateSheet(name.to_string()));
        }
    }
    Ok(())
}

/// Format for one cell, or `None` if it needs no formatting.
fn cell_format(total: bool, highlight: Option<(&str, &str)>, num_format: Option<&str>) -> Option<Format> {
    if !total && highlight.is_none() && num_format.is_none() {
        return None;
    }

    let mut format = Format::new();
    if total {
        format = format
            .set_bold()
            .set_background_color(TOTAL_STYLE.0)
            .set_font_color(TOTAL_STYLE.1);
    }
    if let Some((background, font)) = highlight {
        format = format.set_background_color(background).set_font_color(font);
    }
    if let Some(num_format) = num_format {
        format = format.set_num_format(num_format);
    }
    Some(format)
}

/// Fill for the lowest and second-lowest bidder cells.
fn cell_highlight(marks: &RowMarks, col: usize) -> Option<(&'static str, &'static str)> {
    if marks.first == Some(col) {
        Some(FIRST_STYLE)
    } else if marks.second == Some(col) {
        Some(SECOND_STYLE)
    } else {
        None
    }
}

fn write_sheet(sheet: &mut Worksheet, table: &Table) -> Result<()> {
    let header_fmt = Format::new().set_bold();
    let kinds: Vec<ColumnKind> = (0..table.columns.len())
        .map(|c| column_kind(table, c))
        .collect();
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.name.chars().count()).collect();

    for (col, column) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, &column.name, &header_fmt)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let xl_row = (r + 1) as u32;
        for (col, cell) in row.cells.iter().enumerate().take(table.columns.len()) {
            let xl_col = col as u16;
            let kind = kinds[col];
            let highlight = cell_highlight(&row.marks, col);

            let text = format_cell(cell, kind);
            widths[col] = widths[col].max(text.chars().count());

            match cell {
                Cell::Number(n) if n.is_finite() => {
                    match cell_format(row.marks.total, highlight, excel_num_format(kind, *n)) {
                        Some(format) => sheet.write_number_with_format(xl_row, xl_col, *n, &format)?,
                        None => sheet.write_number(xl_row, xl_col, *n)?,
                    };
                }
                Cell::Text(s) => {
                    match cell_format(row.marks.total, highlight, None) {
                        Some(format) => sheet.write_string_with_format(xl_row, xl_col, s, &format)?,
                        None => sheet.write_string(xl_row, xl_col, s)?,
                    };
                }
                // Empty and non-finite: blank, and only where a style needs it
                _ => {
                    if let Some(format) = cell_format(row.marks.total, highlight, None) {
                        sheet.write_blank(xl_row, xl_col, &format)?;
                    }
                }
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, (*width + 2) as f64)?;
    }
    if !table.is_empty() && !table.columns.is_empty() {
        sheet.autofilter(0, 0, table.len() as u32, (table.columns.len() - 1) as u16)?;
    }
    Ok(())
}

/// Write the selected tables, in the given order, into one xlsx workbook.
pub fn export<S: AsRef<str>>(tables: &HashMap<String, Table>, selected: &[S]) -> Result<Vec<u8>> {
    validate_selection(tables, selected)?;

    let mut workbook = Workbook::new();
    for name in selected {
        let name = name.as_ref();
        let Some(table) = tables.get(name) else {
            return Err(TcoError::UnknownSheet(name.to_string()));
        };
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_sheet(sheet, table)?;
        log::debug!("Sheet '{}': {} rows", name, table.len());
    }

    Ok(workbook.save_to_buffer()?)
}

/// [`export`] to a file, creating its directory if needed.
pub fn export_to_path<S: AsRef<str>>(
    tables: &HashMap<String, Table>,
    selected: &[S],
    path: &Path,
) -> Result<()> {
    let bytes = export(tables, selected)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    log::info!("Wrote {} sheets to {}", selected.len(), path.display());
    Ok(())
}

/// Write one table as CSV with raw (unformatted) values.
pub fn write_table_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        writer.write_record(row.cells.iter().map(Cell::to_plain_string))?;
    }
    writer.flush()?;
    Ok(())
}
