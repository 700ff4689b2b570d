//! Error types for the comparison pipeline.
//!
//! Structural problems with the input are reported as soon as the stage that
//! first sees them runs, and are never patched up by guessing. The one
//! exception is a user-supplied TOTAL row, which ingestion drops with a warning.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TcoError {
    /// Two input files resolve to the same round label.
    #[error("ambiguous round name '{label}': both {first} and {second} map to it")]
    AmbiguousRoundName {
        label: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A numeric (vendor) column sits before a non-numeric (descriptor) column.
    #[error(
        "round '{round}': numeric column '{numeric}' appears before non-numeric column '{non_numeric}'; \
         descriptor columns must come first"
    )]
    ColumnOrder {
        round: String,
        numeric: String,
        non_numeric: String,
    },

    /// A column with a reserved name (e.g. "No") is present.
    #[error("round '{round}': column '{column}' is not allowed (it would be read as a vendor price)")]
    ReservedColumn { round: String, column: String },

    /// No data rows remain after locating the table and dropping TOTAL rows.
    #[error("round '{round}': sheet has no usable data rows")]
    EmptySheet { round: String },

    /// Round tables disagree on their column layout.
    #[error("round '{round}': columns {found:?} do not match {expected:?}")]
    SchemaMismatch {
        round: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("round '{round}': header cell {column} of the table is empty")]
    BlankHeader { round: String, column: usize },

    #[error("round '{round}': column '{column}' appears more than once")]
    DuplicateColumn { round: String, column: String },

    /// Something other than the table sits to the left of it.
    #[error("round '{round}': cell at row {row}, column {col} lies to the left of the table")]
    MisplacedTable { round: String, row: usize, col: usize },

    #[error("round '{round}': table has no non-numeric (descriptor) column")]
    MissingDescriptorColumn { round: String },

    #[error("round '{round}': table has no numeric (vendor) column")]
    MissingVendorColumn { round: String },

    #[error("no round tables to merge")]
    NoRounds,

    #[error("unsupported input file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("unknown sheet '{0}'")]
    UnknownSheet(String),

    #[error("sheet '{0}' selected more than once")]
    DuplicateSheet(String),

    #[error("no sheets selected for export")]
    NoSheetsSelected,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, TcoError>;
