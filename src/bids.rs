//! Bid and price analysis per (round, component).
//!
//! Vendors are ranked by price within each merged row. TOTAL rows are ranked
//! like any other row.

use crate::format::round1;
use crate::merge::{MergedTable, ROUND_COLUMN};
use crate::reshape::VENDOR_COLUMN;
use crate::table::{Cell, Column, ColumnKind, RowMarks, Table};

pub const FIRST_LOWEST: &str = "1st Lowest";
pub const FIRST_VENDOR: &str = "1st Vendor";
pub const SECOND_LOWEST: &str = "2nd Lowest";
pub const SECOND_VENDOR: &str = "2nd Vendor";
pub const GAP_PCT: &str = "Gap 1 to 2 (%)";
pub const MEDIAN_PRICE: &str = "Median Price";
pub const WINS_COLUMN: &str = "WINS";

/// Name of a vendor's deviation-from-median column.
pub fn to_median_column(vendor: &str) -> String {
    format!("{} to Median (%)", vendor)
}

/// A ranked bid: vendor column index and its price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rank {
    pub vendor: usize,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BidAnalysisRow {
    /// Index into [`BidAnalysis::rounds`].
    pub round: usize,
    pub descriptors: Vec<String>,
    pub prices: Vec<Option<f64>>,
    pub first: Option<Rank>,
    pub second: Option<Rank>,
    /// (2nd − 1st) / 1st × 100, one decimal. `None` if 1st is zero or there is no 2nd.
    pub gap_pct: Option<f64>,
    pub median: Option<f64>,
    /// Signed deviation of each vendor from the median, one decimal.
    pub to_median_pct: Vec<Option<f64>>,
    pub is_total: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BidAnalysis {
    pub rounds: Vec<String>,
    pub descriptor_columns: Vec<String>,
    pub vendor_columns: Vec<String>,
    pub rows: Vec<BidAnalysisRow>,
}

/// Statistical median; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Percentage change from `base` to `value`, one decimal. `None` when `base` is zero.
fn pct_of(value: f64, base: f64) -> Option<f64> {
    (base != 0.0).then(|| round1((value - base) / base * 100.0))
}

/// Rank vendors by price, lowest first. Ties keep column order.
pub fn rank_prices(prices: &[Option<f64>]) -> Vec<Rank> {
    let mut ranks: Vec<Rank> = prices
        .iter()
        .enumerate()
        .filter_map(|(vendor, price)| price.map(|price| Rank { vendor, price }))
        .collect();
    // sort_by is stable, so equal prices stay in column order
    ranks.sort_by(|a, b| a.price.total_cmp(&b.price));
    ranks
}

fn analyze_row(round: usize, descriptors: &[String], prices: &[Option<f64>], is_total: bool) -> BidAnalysisRow {
    let ranks = rank_prices(prices);
    let first = ranks.first().copied();
    let second = ranks.get(1).copied();

    let gap_pct = match (first, second) {
        (Some(a), Some(b)) => pct_of(b.price, a.price),
        _ => None,
    };

    let present: Vec<f64> = prices.iter().flatten().copied().collect();
    let median = median(&present);
    let to_median_pct = prices
        .iter()
        .map(|price| match (price, median) {
            (Some(p), Some(m)) => pct_of(*p, m),
            _ => None,
        })
        .collect();

    BidAnalysisRow {
        round,
        descriptors: descriptors.to_vec(),
        prices: prices.to_vec(),
        first,
        second,
        gap_pct,
        median,
        to_median_pct,
        is_total,
    }
}

/// Rank every merged row, TOTAL rows included.
pub fn analyze_bids(merged: &MergedTable) -> BidAnalysis {
    let rows = merged
        .rows
        .iter()
        .map(|row| analyze_row(row.round, &row.descriptors, &row.prices, row.is_total))
        .collect();

    BidAnalysis {
        rounds: merged.rounds.iter().map(|r| r.label.clone()).collect(),
        descriptor_columns: merged.descriptor_columns.clone(),
        vendor_columns: merged.vendor_columns.clone(),
        rows,
    }
}

impl BidAnalysis {
    /// `ROUND, <descriptors…>, <vendors…>, 1st Lowest, 1st Vendor, 2nd Lowest,
    /// 2nd Vendor, Gap 1 to 2 (%), Median Price, <vendor> to Median (%)…`.
    ///
    /// Each row marks the price cells of its 1st and 2nd vendor.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![Column::text(ROUND_COLUMN)];
        columns.extend(self.descriptor_columns.iter().map(Column::text));
        let vendor_offset = columns.len();
        columns.extend(self.vendor_columns.iter().map(Column::number));
        columns.extend([
            Column::number(FIRST_LOWEST),
            Column::text(FIRST_VENDOR),
            Column::number(SECOND_LOWEST),
            Column::text(SECOND_VENDOR),
            Column::new(GAP_PCT, ColumnKind::Percent),
            Column::number(MEDIAN_PRICE),
        ]);
        columns.extend(
            self.vendor_columns
                .iter()
                .map(|v| Column::new(to_median_column(v), ColumnKind::SignedPercent)),
        );

        let vendor_name = |rank: Option<Rank>| -> Cell {
            rank.map(|r| Cell::from(self.vendor_columns[r.vendor].as_str()))
                .unwrap_or(Cell::Empty)
        };

        let mut table = Table::new(columns);
        for row in &self.rows {
            let mut cells = vec![Cell::from(self.rounds[row.round].as_str())];
            cells.extend(row.descriptors.iter().map(|d| Cell::from(d.as_str())));
            cells.extend(row.prices.iter().map(|p| Cell::from(*p)));
            cells.push(Cell::from(row.first.map(|r| r.price)));
            cells.push(vendor_name(row.first));
            cells.push(Cell::from(row.second.map(|r| r.price)));
            cells.push(vendor_name(row.second));
            cells.push(Cell::from(row.gap_pct));
            cells.push(Cell::from(row.median));
            cells.extend(row.to_median_pct.iter().map(|p| Cell::from(*p)));

            let marks = RowMarks {
                first: row.first.map(|r| vendor_offset + r.vendor),
                second: row.second.map(|r| vendor_offset + r.vendor),
                ..RowMarks::default()
            };
            table.push_marked(cells, marks);
        }
        table
    }
}

/// Number of components each vendor wins (is the 1st vendor for) per round.
#[derive(Debug, Clone, PartialEq)]
pub struct WinningPerformance {
    pub rounds: Vec<String>,
    pub vendor_columns: Vec<String>,
    /// `wins[round][vendor]`.
    pub wins: Vec<Vec<usize>>,
}

/// Count first places per round and vendor, ignoring TOTAL rows.
pub fn winning_performance(analysis: &BidAnalysis) -> WinningPerformance {
    let mut wins = vec![vec![0usize; analysis.vendor_columns.len()]; analysis.rounds.len()];
    for row in analysis.rows.iter().filter(|r| !r.is_total) {
        if let Some(first) = row.first {
            wins[row.round][first.vendor] += 1;
        }
    }

    WinningPerformance {
        rounds: analysis.rounds.clone(),
        vendor_columns: analysis.vendor_columns.clone(),
        wins,
    }
}

impl WinningPerformance {
    /// `ROUND, VENDOR, WINS`, one row per round and vendor.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(vec![
            Column::text(ROUND_COLUMN),
            Column::text(VENDOR_COLUMN),
            Column::number(WINS_COLUMN),
        ]);
        for (round, counts) in self.rounds.iter().zip(&self.wins) {
            for (vendor, count) in self.vendor_columns.iter().zip(counts) {
                table.push(vec![
                    Cell::from(round.as_str()),
                    Cell::from(vendor.as_str()),
                    Cell::Number(*count as f64),
                ]);
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::merge::tests::{dummy_merged, round_table};

    fn row_for<'a>(analysis: &'a BidAnalysis, round: &str, desc: &str) -> &'a BidAnalysisRow {
        analysis
            .rows
            .iter()
            .find(|r| analysis.rounds[r.round] == round && r.descriptors[0] == desc)
            .unwrap()
    }

    #[test]
    fn test_rank_software_round_1() {
        let analysis = analyze_bids(&dummy_merged());
        let row = row_for(&analysis, "Round 1", "Software");

        assert_eq!(row.first, Some(Rank { vendor: 2, price: 11000.0 }));
        assert_eq!(row.second, Some(Rank { vendor: 0, price: 12000.0 }));
        assert_eq!(row.gap_pct, Some(9.1));
        assert_eq!(row.median, Some(12000.0));
        assert_eq!(row.to_median_pct, vec![Some(0.0), Some(12.5), Some(-8.3)]);
    }

    #[test]
    fn test_rank_hardware_round_4() {
        let analysis = analyze_bids(&dummy_merged());
        let row = row_for(&analysis, "Round 4", "Hardware");

        assert_eq!(row.first.unwrap().vendor, 0);
        assert_eq!(row.second.unwrap().vendor, 2);
        assert_eq!(row.gap_pct, Some(35.5));
        assert_eq!(row.median, Some(26510.0));
        assert_eq!(row.to_median_pct, vec![Some(-26.2), Some(5.0), Some(0.0)]);
    }

    #[test]
    fn test_total_rows_are_ranked() {
        let analysis = analyze_bids(&dummy_merged());
        let row = row_for(&analysis, "Round 1", "TOTAL");
        assert!(row.is_total);
        assert_eq!(row.first, Some(Rank { vendor: 2, price: 34000.0 }));
        assert_eq!(row.second, Some(Rank { vendor: 0, price: 37000.0 }));
    }

    #[test]
    fn test_ties_keep_column_order() {
        let ranks = rank_prices(&[Some(5.0), Some(3.0), Some(3.0), Some(4.0)]);
        let order: Vec<usize> = ranks.iter().map(|r| r.vendor).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_single_vendor_leaves_second_blank() {
        let merged = merge(vec![round_table("R1", &["A"], &[("x", [100.0])])]).unwrap();
        let analysis = analyze_bids(&merged);
        let row = &analysis.rows[0];
        assert_eq!(row.first, Some(Rank { vendor: 0, price: 100.0 }));
        assert_eq!(row.second, None);
        assert_eq!(row.gap_pct, None);
        assert_eq!(row.to_median_pct, vec![Some(0.0)]);

        let table = analysis.to_table();
        let second_vendor = table.column_index(SECOND_VENDOR).unwrap();
        assert_eq!(table.cell(0, second_vendor), Some(&Cell::Empty));
        assert_eq!(table.rows[0].marks.second, None);
    }

    #[test]
    fn test_zero_prices_give_blank_percentages() {
        let merged = merge(vec![round_table("R1", &["A", "B", "C"], &[("x", [0.0, 0.0, 10.0])])]).unwrap();
        let row = &analyze_bids(&merged).rows[0];
        assert_eq!(row.gap_pct, None);
        assert_eq!(row.median, Some(0.0));
        assert_eq!(row.to_median_pct, vec![None, None, None]);
    }

    #[test]
    fn test_missing_price_is_not_ranked() {
        let mut table = round_table("R1", &["A", "B", "C"], &[("x", [10.0, 20.0, 30.0])]);
        table.rows[0].prices[0] = None;
        let row = &analyze_bids(&merge(vec![table]).unwrap()).rows[0];
        assert_eq!(row.first.unwrap().vendor, 1);
        assert_eq!(row.median, Some(25.0));
        assert_eq!(row.to_median_pct[0], None);
        assert_eq!(row.to_median_pct[1], Some(-20.0));
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[7.0]), Some(7.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_table_columns_and_marks() {
        let table = analyze_bids(&dummy_merged()).to_table();
        assert_eq!(
            table.column_names(),
            vec![
                "ROUND",
                "TCO Component",
                "Vendor A",
                "Vendor B",
                "Vendor C",
                "1st Lowest",
                "1st Vendor",
                "2nd Lowest",
                "2nd Vendor",
                "Gap 1 to 2 (%)",
                "Median Price",
                "Vendor A to Median (%)",
                "Vendor B to Median (%)",
                "Vendor C to Median (%)",
            ]
        );

        // Round 1 Software: C first, A second
        let marks = table.rows[0].marks;
        assert_eq!(marks.first, Some(4));
        assert_eq!(marks.second, Some(2));
        assert!(!marks.total);
        assert_eq!(table.cell(0, 6), Some(&Cell::from("Vendor C")));
        assert!(table.rows[2].marks.total);
    }

    #[test]
    fn test_winning_performance() {
        let wins = winning_performance(&analyze_bids(&dummy_merged()));
        // Vendor C wins both components in rounds 1-3; round 4 is split A/C
        assert_eq!(wins.wins[0], vec![0, 0, 2]);
        assert_eq!(wins.wins[3], vec![1, 0, 1]);

        let table = wins.to_table();
        assert_eq!(table.len(), 12);
        assert_eq!(table.column_names(), vec!["ROUND", "VENDOR", "WINS"]);
        assert_eq!(table.cell(11, 2), Some(&Cell::Number(1.0)));
    }
}
