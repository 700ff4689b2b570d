//! Display-neutral tables shared by the terminal renderer and the workbook exporter.
//!
//! Every analysis stage produces its own typed rows and converts them to a
//! [`Table`] for output. Row classification (TOTAL rows, the cells of the
//! lowest and second-lowest bidder) is computed once here and carried as
//! [`RowMarks`], so the renderers only read it.

/// Literal used for the synthesized per-round sum row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// True if `s` is the TOTAL marker, ignoring case and surrounding whitespace.
pub fn is_total_label(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case(TOTAL_LABEL)
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Numeric value of the cell, if it has one.
    ///
    /// Text is parsed after trimming. Non-finite values count as missing.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Empty => return None,
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, Cell::Text(s) if is_total_label(s))
    }

    /// Plain string form, used for descriptor values and width measurement.
    ///
    /// Whole numbers are written without a trailing ".0".
    pub fn to_plain_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<Option<f64>> for Cell {
    fn from(n: Option<f64>) -> Self {
        match n {
            Some(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Empty,
        }
    }
}

/// How a column's values are meant to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Amounts (prices, totals, deviations in currency).
    Number,
    /// Percentages shown without a forced sign.
    Percent,
    /// Percentages shown with an explicit sign.
    SignedPercent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Number)
    }
}

/// Highlighting metadata for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMarks {
    /// Some cell in the row is the TOTAL marker.
    pub total: bool,
    /// Column index of the lowest bidder's price cell.
    pub first: Option<usize>,
    /// Column index of the second-lowest bidder's price cell.
    pub second: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub marks: RowMarks,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, marking it as a TOTAL row if any cell says so.
    ///
    /// Short rows are padded with empty cells.
    pub fn push(&mut self, cells: Vec<Cell>) {
        self.push_marked(cells, RowMarks::default());
    }

    /// Append a row with precomputed ranking marks. The TOTAL mark is
    /// always derived from the cells.
    pub fn push_marked(&mut self, mut cells: Vec<Cell>, mut marks: RowMarks) {
        cells.resize(self.columns.len().max(cells.len()), Cell::Empty);
        marks.total = cells.iter().any(Cell::is_total);
        self.rows.push(Row { cells, marks });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }
}
