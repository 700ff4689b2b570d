//! Pipeline functions for programmatic use by the CLI and other front ends.
//!
//! Strings the stages together: ingest every round file, merge, run the
//! analyses, and export the selected sheets. Functions return structured data
//! or a summary string instead of printing.

use crate::bids::{analyze_bids, winning_performance, BidAnalysis, WinningPerformance};
use crate::error::Result;
use crate::export::{
    export_to_path, BID_ANALYSIS, COST_SUMMARY, MERGE_DATA, MOVEMENT_ANALYSIS, PIVOT_TABLE,
    PRICE_TREND, SHEET_NAMES, WINNING_PERFORMANCE,
};
use crate::ingest::{ingest, RoundTable};
use crate::merge::{merge, MergedTable};
use crate::movement::{analyze_movement, trend_distribution, MovementAnalysis, TrendDistribution};
use crate::reshape::{cost_summary, pivot, CostSummary, PivotTable};
use crate::round::identify_all;
use crate::table::Table;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;

// ============================================================================
// Analysis
// ============================================================================

/// Every view derived from one set of round files.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub merged: MergedTable,
    pub cost_summary: CostSummary,
    pub pivot: PivotTable,
    pub bids: BidAnalysis,
    pub wins: WinningPerformance,
    pub movement: MovementAnalysis,
    pub trends: TrendDistribution,
}

impl Analysis {
    pub fn from_merged(merged: MergedTable) -> Self {
        let bids = analyze_bids(&merged);
        let wins = winning_performance(&bids);
        let movement = analyze_movement(&merged);
        let trends = trend_distribution(&movement);
        Self {
            cost_summary: cost_summary(&merged),
            pivot: pivot(&merged),
            bids,
            wins,
            movement,
            trends,
            merged,
        }
    }

    /// The table behind a sheet name, if there is one.
    pub fn table(&self, sheet: &str) -> Option<Table> {
        let table = match sheet {
            MERGE_DATA => self.merged.to_table(),
            COST_SUMMARY => self.cost_summary.to_table(),
            PIVOT_TABLE => self.pivot.to_table(),
            BID_ANALYSIS => self.bids.to_table(),
            MOVEMENT_ANALYSIS => self.movement.to_table(),
            WINNING_PERFORMANCE => self.wins.to_table(),
            PRICE_TREND => self.trends.to_table(),
            _ => return None,
        };
        Some(table)
    }

    /// All tables keyed by sheet name.
    pub fn tables(&self) -> HashMap<String, Table> {
        SHEET_NAMES
            .iter()
            .filter_map(|name| self.table(name).map(|t| (name.to_string(), t)))
            .collect()
    }
}

/// Ingest round files in parallel. The result is in input order.
///
/// If several files fail, the error of the earliest one in input order is returned.
pub fn ingest_files(paths: &[PathBuf]) -> Result<Vec<RoundTable>> {
    identify_all(paths)?;
    let results: Vec<Result<RoundTable>> = paths.par_iter().map(|path| ingest(path)).collect();
    results.into_iter().collect()
}

/// Ingest, merge and analyze a set of round files.
pub fn analyze_files(paths: &[PathBuf]) -> Result<Analysis> {
    let tables = ingest_files(paths)?;
    log::info!("Ingested {} round files", tables.len());
    let merged = merge(tables)?;
    Ok(Analysis::from_merged(merged))
}

// ============================================================================
// Compare
// ============================================================================

/// Configuration for a full compare run.
pub struct CompareConfig {
    /// Round files, one per round, in any order
    pub inputs: Vec<PathBuf>,
    /// Output xlsx path
    pub output: PathBuf,
    /// Sheets to export, in order. Empty means every sheet in default order.
    pub sheets: Vec<String>,
    /// Worker threads for ingestion (rayon default if unset)
    pub threads: Option<usize>,
}

impl CompareConfig {
    pub fn selected_sheets(&self) -> Vec<String> {
        if self.sheets.is_empty() {
            SHEET_NAMES.iter().map(|s| s.to_string()).collect()
        } else {
            self.sheets.clone()
        }
    }
}

/// Run the whole comparison and write the workbook.
///
/// Returns a summary string on success. Nothing is written if any stage fails.
pub fn run_compare(config: &CompareConfig) -> Result<String> {
    if let Some(n) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let analysis = analyze_files(&config.inputs)?;
    let sheets = config.selected_sheets();
    export_to_path(&analysis.tables(), &sheets, &config.output)?;

    let merged = &analysis.merged;
    let mut summary = format!(
        "Workbook created: {}\n  Rounds: {}\n  Vendors: {}\n  Components: {}\n  Sheets: {}",
        config.output.display(),
        merged.rounds.len(),
        merged.vendor_columns.len(),
        merged.descriptor_groups().len().saturating_sub(1),
        sheets.join(", "),
    );

    let _ = write!(summary, "\n  Round order:");
    for round in &merged.rounds {
        let _ = write!(summary, " {}", round.label);
    }

    Ok(summary)
}
