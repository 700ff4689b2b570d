//! TCO Compare
//!
//! Round-by-round comparison of vendor price sheets from a negotiation.
//!
//! This library provides:
//! - `round`: Round labels from file names and their natural ordering
//! - `ingest`: Reading one round sheet and locating its table
//! - `merge`: One long table of all rounds with synthesized TOTAL rows
//! - `reshape`: Cost summary (long) and pivot (wide) views
//! - `bids`: Lowest bidders, gaps and median deviation per component
//! - `movement`: Price reduction, trend and stability across rounds
//! - `export`: Formatted multi-sheet xlsx workbook
//! - `pipeline`: The stages above wired together
//!
//! Binaries:
//! - `tco-compare`: Command-line front end

pub mod bids;
pub mod error;
pub mod export;
pub mod format;
pub mod ingest;
pub mod merge;
pub mod movement;
pub mod pipeline;
pub mod reshape;
pub mod round;
pub mod table;

pub use error::{Result, TcoError};
pub use table::{Cell, Column, ColumnKind, RowMarks, Table};
