//! Merging of per-round tables into one long table with synthesized totals.

use crate::error::{Result, TcoError};
use crate::ingest::RoundTable;
use crate::round::RoundId;
use crate::table::{is_total_label, Cell, Column, Table, TOTAL_LABEL};
use std::collections::HashMap;

/// Name of the leading round column in merged output.
pub const ROUND_COLUMN: &str = "ROUND";

/// One row of the merged table.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    /// Index into [`MergedTable::rounds`].
    pub round: usize,
    pub descriptors: Vec<String>,
    pub prices: Vec<Option<f64>>,
    /// True for the synthesized per-round sum row.
    pub is_total: bool,
}

/// All rounds in order, each followed by its TOTAL row.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub rounds: Vec<RoundId>,
    pub descriptor_columns: Vec<String>,
    pub vendor_columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

/// Merge round tables. Rounds are sorted by their natural key first, so the
/// input order does not matter.
pub fn merge(mut tables: Vec<RoundTable>) -> Result<MergedTable> {
    tables.sort_by(|a, b| a.round.cmp(&b.round));

    let first = tables.first().ok_or(TcoError::NoRounds)?;
    let descriptor_columns = first.descriptor_columns.clone();
    let vendor_columns = first.vendor_columns.clone();

    for pair in tables.windows(2) {
        if pair[0].round.label == pair[1].round.label {
            return Err(TcoError::AmbiguousRoundName {
                label: pair[1].round.label.clone(),
                first: pair[0].round.label.clone().into(),
                second: pair[1].round.label.clone().into(),
            });
        }
    }

    for table in &tables {
        if table.descriptor_columns != descriptor_columns
            || table.vendor_columns != vendor_columns
        {
            return Err(TcoError::SchemaMismatch {
                round: table.round.label.clone(),
                expected: first.columns(),
                found: table.columns(),
            });
        }
    }

    let mut rows = Vec::new();
    for (round_idx, table) in tables.iter().enumerate() {
        let mut totals = vec![0.0; vendor_columns.len()];
        for row in &table.rows {
            for (total, price) in totals.iter_mut().zip(&row.prices) {
                *total += price.unwrap_or(0.0);
            }
            rows.push(MergedRow {
                round: round_idx,
                descriptors: row.descriptors.clone(),
                prices: row.prices.clone(),
                is_total: false,
            });
        }

        let mut descriptors = vec![String::new(); descriptor_columns.len()];
        descriptors[0] = TOTAL_LABEL.to_string();
        rows.push(MergedRow {
            round: round_idx,
            descriptors,
            prices: totals.into_iter().map(Some).collect(),
            is_total: true,
        });
    }

    log::info!(
        "Merged {} rounds into {} rows ({} vendors)",
        tables.len(),
        rows.len(),
        vendor_columns.len()
    );

    Ok(MergedTable {
        rounds: tables.into_iter().map(|t| t.round).collect(),
        descriptor_columns,
        vendor_columns,
        rows,
    })
}

impl MergedTable {
    pub fn round_label(&self, round: usize) -> &str {
        &self.rounds[round].label
    }

    /// Distinct descriptor tuples in first-seen order, with the TOTAL tuple last.
    pub fn descriptor_groups(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut total: Option<Vec<String>> = None;

        for row in &self.rows {
            if row.is_total || is_total_label(&row.descriptors[0]) {
                if total.is_none() {
                    total = Some(row.descriptors.clone());
                }
            } else if !groups.contains(&row.descriptors) {
                groups.push(row.descriptors.clone());
            }
        }

        groups.extend(total);
        groups
    }

    /// Lookup from (round, descriptor tuple) to the row's prices.
    ///
    /// If a round repeats a descriptor tuple, the first row wins.
    pub fn price_index(&self) -> HashMap<(usize, &[String]), &[Option<f64>]> {
        let mut index = HashMap::new();
        for row in &self.rows {
            let key = (row.round, row.descriptors.as_slice());
            if index.contains_key(&key) {
                log::debug!(
                    "Round '{}': repeated row {:?}, keeping the first",
                    self.round_label(row.round),
                    row.descriptors
                );
                continue;
            }
            index.insert(key, row.prices.as_slice());
        }
        index
    }

    /// The merged table as `ROUND, <descriptors…>, <vendors…>`.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![Column::text(ROUND_COLUMN)];
        columns.extend(self.descriptor_columns.iter().map(Column::text));
        columns.extend(self.vendor_columns.iter().map(Column::number));

        let mut table = Table::new(columns);
        for row in &self.rows {
            let mut cells = vec![Cell::from(self.round_label(row.round))];
            cells.extend(row.descriptors.iter().map(|d| Cell::from(d.as_str())));
            cells.extend(row.prices.iter().map(|p| Cell::from(*p)));
            table.push(cells);
        }
        table
    }
}
