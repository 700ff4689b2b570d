//! Number formatting and plain-text table rendering.
//!
//! Amounts use a dot for thousands and a comma for decimals ("12.345,67").
//! Percentages keep one decimal and a "%" suffix.

use crate::table::{Cell, ColumnKind, Table};

/// Excel format for whole amounts.
pub const AMOUNT_FORMAT: &str = "#,##0";
/// Excel format for amounts with cents.
pub const DECIMAL_AMOUNT_FORMAT: &str = "#,##0.00";
pub const PERCENT_FORMAT: &str = "#,##0.0\"%\"";
pub const SIGNED_PERCENT_FORMAT: &str = "+#,##0.0\"%\";-#,##0.0\"%\";0.0\"%\"";

/// Round to one decimal place. Never returns negative zero.
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// "12.345" for whole amounts, "12.345,67" otherwise. A ",00" tail is dropped.
pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc();
    let frac = (cents - whole * 100.0) as u64;

    let mut out = String::new();
    if value < 0.0 && cents > 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(&format!("{:.0}", whole)));
    if frac != 0 {
        out.push_str(&format!(",{:02}", frac));
    }
    out
}

/// "9.1%", or "+12.5%" / "-8.3%" / "+0.0%" when `signed`.
pub fn format_percent(value: f64, signed: bool) -> String {
    let value = round1(value);
    if signed {
        format!("{:+.1}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

/// Display string of a cell under the given column kind. Empty cells give "".
pub fn format_cell(cell: &Cell, kind: ColumnKind) -> String {
    match (cell, kind) {
        (Cell::Empty, _) => String::new(),
        (Cell::Text(s), _) => s.clone(),
        (Cell::Number(n), _) if !n.is_finite() => String::new(),
        (Cell::Number(n), ColumnKind::Number) => format_amount(*n),
        (Cell::Number(n), ColumnKind::Percent) => format_percent(*n, false),
        (Cell::Number(n), ColumnKind::SignedPercent) => format_percent(*n, true),
        (cell @ Cell::Number(_), ColumnKind::Text) => cell.to_plain_string(),
    }
}

/// Effective kind of a column.
///
/// A name containing "%" makes it a percentage column. A number column that
/// holds anything non-numeric is shown as text. Text columns stay text.
pub fn column_kind(table: &Table, col: usize) -> ColumnKind {
    let Some(column) = table.columns.get(col) else {
        return ColumnKind::Text;
    };

    if column.name.contains('%') {
        return match column.kind {
            ColumnKind::SignedPercent => ColumnKind::SignedPercent,
            _ => ColumnKind::Percent,
        };
    }

    match column.kind {
        ColumnKind::Text => ColumnKind::Text,
        kind => {
            let numeric = table
                .rows
                .iter()
                .filter_map(|row| row.cells.get(col))
                .all(|cell| cell.is_empty() || cell.as_number().is_some());
            if numeric {
                kind
            } else {
                ColumnKind::Text
            }
        }
    }
}

/// Excel number format for a value in a column of the given kind.
pub fn excel_num_format(kind: ColumnKind, value: f64) -> Option<&'static str> {
    match kind {
        ColumnKind::Text => None,
        ColumnKind::Number if value.fract() == 0.0 => Some(AMOUNT_FORMAT),
        ColumnKind::Number => Some(DECIMAL_AMOUNT_FORMAT),
        ColumnKind::Percent => Some(PERCENT_FORMAT),
        ColumnKind::SignedPercent => Some(SIGNED_PERCENT_FORMAT),
    }
}

/// Render a table as aligned text.
///
/// TOTAL rows start with "*". The lowest and second-lowest bidder cells are
/// suffixed with "(1)" and "(2)".
pub fn render_table(table: &Table) -> String {
    let kinds: Vec<ColumnKind> = (0..table.columns.len())
        .map(|c| column_kind(table, c))
        .collect();

    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    let kind = kinds.get(c).copied().unwrap_or(ColumnKind::Text);
                    let text = format_cell(cell, kind);
                    if row.marks.first == Some(c) {
                        format!("{} (1)", text)
                    } else if row.marks.second == Some(c) {
                        format!("{} (2)", text)
                    } else {
                        text
                    }
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.name.chars().count()).collect();
    for cells in &body {
        for (w, text) in widths.iter_mut().zip(cells) {
            *w = (*w).max(text.chars().count());
        }
    }

    let line = |gutter: &str, cells: &[String]| -> String {
        let mut out = String::from(gutter);
        for (c, text) in cells.iter().enumerate() {
            let width = widths.get(c).copied().unwrap_or(0);
            let pad = width.saturating_sub(text.chars().count());
            if c > 0 {
                out.push_str("  ");
            }
            if kinds.get(c).copied().unwrap_or(ColumnKind::Text) == ColumnKind::Text {
                out.push_str(text);
                out.push_str(&" ".repeat(pad));
            } else {
                out.push_str(&" ".repeat(pad));
                out.push_str(text);
            }
        }
        out.trim_end().to_string()
    };

    let header: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&line("  ", &header));
    out.push('\n');
    out.push_str(&line("  ", &rule));
    out.push('\n');
    for (row, cells) in table.rows.iter().zip(&body) {
        let gutter = if row.marks.total { "* " } else { "  " };
        out.push_str(&line(gutter, cells));
        out.push('\n');
    }
    out
}
