//! Long and wide views of the merged table.

use crate::merge::{MergedTable, ROUND_COLUMN};
use crate::table::{Cell, Column, Table};

pub const VENDOR_COLUMN: &str = "VENDOR";
pub const PRICE_COLUMN: &str = "PRICE";

/// One vendor's price for one merged row.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRow {
    pub round: String,
    pub vendor: String,
    pub descriptors: Vec<String>,
    pub price: Option<f64>,
}

/// The merged table with vendor columns turned into rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub descriptor_columns: Vec<String>,
    pub rows: Vec<CostRow>,
}

/// A pivot column: one vendor in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotColumn {
    pub vendor: String,
    pub round: String,
}

impl PivotColumn {
    pub fn name(&self) -> String {
        format!("{} {}", self.vendor, self.round)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub descriptors: Vec<String>,
    /// One value per [`PivotTable::columns`] entry; `None` if the round has no such row.
    pub values: Vec<Option<f64>>,
}

/// One row per descriptor, one column per (vendor, round).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub descriptor_columns: Vec<String>,
    pub columns: Vec<PivotColumn>,
    pub rows: Vec<PivotRow>,
}

/// Transpose vendor columns into `VENDOR`/`PRICE` rows.
///
/// Rows keep merged order; the vendors of one source row stay adjacent.
pub fn cost_summary(merged: &MergedTable) -> CostSummary {
    let mut rows = Vec::with_capacity(merged.rows.len() * merged.vendor_columns.len());
    for row in &merged.rows {
        for (vendor, price) in merged.vendor_columns.iter().zip(&row.prices) {
            rows.push(CostRow {
                round: merged.round_label(row.round).to_string(),
                vendor: vendor.clone(),
                descriptors: row.descriptors.clone(),
                price: *price,
            });
        }
    }

    CostSummary {
        descriptor_columns: merged.descriptor_columns.clone(),
        rows,
    }
}

/// Spread each descriptor's prices across vendor × round columns, vendor-major.
pub fn pivot(merged: &MergedTable) -> PivotTable {
    let columns: Vec<PivotColumn> = merged
        .vendor_columns
        .iter()
        .flat_map(|vendor| {
            merged.rounds.iter().map(move |round| PivotColumn {
                vendor: vendor.clone(),
                round: round.label.clone(),
            })
        })
        .collect();

    let index = merged.price_index();
    let round_count = merged.rounds.len();

    let rows = merged
        .descriptor_groups()
        .into_iter()
        .map(|descriptors| {
            let values = (0..columns.len())
                .map(|c| {
                    let (vendor, round) = (c / round_count, c % round_count);
                    index
                        .get(&(round, descriptors.as_slice()))
                        .and_then(|prices| prices[vendor])
                })
                .collect();
            PivotRow {
                descriptors,
                values,
            }
        })
        .collect();

    PivotTable {
        descriptor_columns: merged.descriptor_columns.clone(),
        columns,
        rows,
    }
}

/// Both reshaped views.
pub fn reshape(merged: &MergedTable) -> (CostSummary, PivotTable) {
    (cost_summary(merged), pivot(merged))
}

impl CostSummary {
    /// `ROUND, VENDOR, <descriptors…>, PRICE`.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![Column::text(ROUND_COLUMN), Column::text(VENDOR_COLUMN)];
        columns.extend(self.descriptor_columns.iter().map(Column::text));
        columns.push(Column::number(PRICE_COLUMN));

        let mut table = Table::new(columns);
        for row in &self.rows {
            let mut cells = vec![
                Cell::from(row.round.as_str()),
                Cell::from(row.vendor.as_str()),
            ];
            cells.extend(row.descriptors.iter().map(|d| Cell::from(d.as_str())));
            cells.push(Cell::from(row.price));
            table.push(cells);
        }
        table
    }
}

impl PivotTable {
    /// `<descriptors…>, "<vendor> <round>"…`.
    pub fn to_table(&self) -> Table {
        let mut columns: Vec<Column> = self.descriptor_columns.iter().map(Column::text).collect();
        columns.extend(self.columns.iter().map(|c| Column::number(c.name())));

        let mut table = Table::new(columns);
        for row in &self.rows {
            let mut cells: Vec<Cell> = row.descriptors.iter().map(|d| Cell::from(d.as_str())).collect();
            cells.extend(row.values.iter().map(|v| Cell::from(*v)));
            table.push(cells);
        }
        table
    }
}
