//! Round-over-round price movement per (vendor, component).

use crate::format::round1;
use crate::merge::MergedTable;
use crate::reshape::VENDOR_COLUMN;
use crate::table::{is_total_label, Cell, Column, ColumnKind, Table};
use std::fmt;

pub const REDUCTION_VALUE: &str = "PRICE REDUCTION (VALUE)";
pub const REDUCTION_PCT: &str = "PRICE REDUCTION (%)";
pub const PRICE_TREND: &str = "PRICE TREND";
pub const STANDARD_DEVIATION: &str = "STANDARD DEVIATION";
pub const STABILITY_INDEX: &str = "PRICE STABILITY INDEX (%)";

/// Shape of a price series across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    NoChange,
    ConsistentlyDown,
    ConsistentlyUp,
    Fluctuating,
}

impl Trend {
    pub const ALL: [Trend; 4] = [
        Trend::NoChange,
        Trend::ConsistentlyDown,
        Trend::ConsistentlyUp,
        Trend::Fluctuating,
    ];

    /// Classify a chronological series. Fewer than two values is `NoChange`.
    pub fn classify(series: &[f64]) -> Self {
        let steps = || series.windows(2).map(|w| (w[0], w[1]));
        if steps().all(|(a, b)| a == b) {
            Trend::NoChange
        } else if steps().all(|(a, b)| b < a) {
            Trend::ConsistentlyDown
        } else if steps().all(|(a, b)| b > a) {
            Trend::ConsistentlyUp
        } else {
            Trend::Fluctuating
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::NoChange => "No Change",
            Trend::ConsistentlyDown => "Consistently Down",
            Trend::ConsistentlyUp => "Consistently Up",
            Trend::Fluctuating => "Fluctuating",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary statistics of one series. All `None` for TOTAL rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementStats {
    pub reduction_value: Option<f64>,
    pub reduction_pct: Option<f64>,
    pub trend: Option<Trend>,
    pub std_dev: Option<f64>,
    pub stability_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementRow {
    pub vendor: String,
    pub descriptors: Vec<String>,
    /// One price per round, in round order.
    pub prices: Vec<Option<f64>>,
    pub stats: MovementStats,
    pub is_total: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementAnalysis {
    pub rounds: Vec<String>,
    pub descriptor_columns: Vec<String>,
    pub vendor_columns: Vec<String>,
    pub rows: Vec<MovementRow>,
}

/// Population standard deviation.
fn population_std(series: &[f64]) -> f64 {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Statistics over the present values of a series. `None` if no round has a price.
pub fn series_stats(prices: &[Option<f64>]) -> Option<MovementStats> {
    let series: Vec<f64> = prices.iter().flatten().copied().collect();
    let (first, last) = (*series.first()?, *series.last()?);

    let reduction = first - last;
    let reduction_pct = (first != 0.0).then(|| round1(reduction / first * 100.0));

    let std = population_std(&series);
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    let stability_pct = (mean != 0.0).then(|| round1((100.0 - std / mean * 100.0).max(0.0)));

    Some(MovementStats {
        reduction_value: Some(reduction),
        reduction_pct,
        trend: Some(Trend::classify(&series)),
        std_dev: Some(round1(std)),
        stability_pct,
    })
}

/// One row per vendor and descriptor group, vendor-major, TOTAL last per vendor.
pub fn analyze_movement(merged: &MergedTable) -> MovementAnalysis {
    let index = merged.price_index();
    let groups = merged.descriptor_groups();

    let mut rows = Vec::with_capacity(merged.vendor_columns.len() * groups.len());
    for (vendor_idx, vendor) in merged.vendor_columns.iter().enumerate() {
        for descriptors in &groups {
            let prices: Vec<Option<f64>> = (0..merged.rounds.len())
                .map(|round| {
                    index
                        .get(&(round, descriptors.as_slice()))
                        .and_then(|p| p[vendor_idx])
                })
                .collect();

            let is_total = is_total_label(&descriptors[0]);
            let stats = if is_total {
                MovementStats::default()
            } else {
                series_stats(&prices).unwrap_or_default()
            };

            rows.push(MovementRow {
                vendor: vendor.clone(),
                descriptors: descriptors.clone(),
                prices,
                stats,
                is_total,
            });
        }
    }

    log::debug!("Movement analysis: {} rows", rows.len());

    MovementAnalysis {
        rounds: merged.rounds.iter().map(|r| r.label.clone()).collect(),
        descriptor_columns: merged.descriptor_columns.clone(),
        vendor_columns: merged.vendor_columns.clone(),
        rows,
    }
}

impl MovementAnalysis {
    /// `VENDOR, <descriptors…>, <rounds…>, PRICE REDUCTION (VALUE), PRICE REDUCTION (%),
    /// PRICE TREND, STANDARD DEVIATION, PRICE STABILITY INDEX (%)`.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![Column::text(VENDOR_COLUMN)];
        columns.extend(self.descriptor_columns.iter().map(Column::text));
        columns.extend(self.rounds.iter().map(Column::number));
        columns.extend([
            Column::number(REDUCTION_VALUE),
            Column::new(REDUCTION_PCT, ColumnKind::SignedPercent),
            Column::text(PRICE_TREND),
            Column::number(STANDARD_DEVIATION),
            Column::new(STABILITY_INDEX, ColumnKind::Percent),
        ]);

        let mut table = Table::new(columns);
        for row in &self.rows {
            let mut cells = vec![Cell::from(row.vendor.as_str())];
            cells.extend(row.descriptors.iter().map(|d| Cell::from(d.as_str())));
            cells.extend(row.prices.iter().map(|p| Cell::from(*p)));
            cells.push(Cell::from(row.stats.reduction_value));
            cells.push(Cell::from(row.stats.reduction_pct));
            cells.push(row.stats.trend.map(|t| Cell::from(t.label())).unwrap_or(Cell::Empty));
            cells.push(Cell::from(row.stats.std_dev));
            cells.push(Cell::from(row.stats.stability_pct));
            table.push(cells);
        }
        table
    }
}

/// Count of non-TOTAL movement rows per vendor and trend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendDistribution {
    pub vendor_columns: Vec<String>,
    /// `counts[vendor][trend]`, trends in [`Trend::ALL`] order.
    pub counts: Vec<[usize; 4]>,
}

pub fn trend_distribution(analysis: &MovementAnalysis) -> TrendDistribution {
    let mut counts = vec![[0usize; 4]; analysis.vendor_columns.len()];
    for row in analysis.rows.iter().filter(|r| !r.is_total) {
        let (Some(vendor), Some(trend)) = (
            analysis.vendor_columns.iter().position(|v| *v == row.vendor),
            row.stats.trend,
        ) else {
            continue;
        };
        if let Some(slot) = Trend::ALL.iter().position(|t| *t == trend) {
            counts[vendor][slot] += 1;
        }
    }

    TrendDistribution {
        vendor_columns: analysis.vendor_columns.clone(),
        counts,
    }
}

impl TrendDistribution {
    /// `VENDOR, No Change, Consistently Down, Consistently Up, Fluctuating`.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![Column::text(VENDOR_COLUMN)];
        columns.extend(Trend::ALL.iter().map(|t| Column::number(t.label())));

        let mut table = Table::new(columns);
        for (vendor, counts) in self.vendor_columns.iter().zip(&self.counts) {
            let mut cells = vec![Cell::from(vendor.as_str())];
            cells.extend(counts.iter().map(|c| Cell::Number(*c as f64)));
            table.push(cells);
        }
        table
    }
}
