//! End-to-end tests: round files on disk to exported workbook.

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tco_compare::export::{
    BID_ANALYSIS, MERGE_DATA, MOVEMENT_ANALYSIS, PIVOT_TABLE, SHEET_NAMES, WINNING_PERFORMANCE,
};
use tco_compare::ingest::ingest;
use tco_compare::pipeline::{analyze_files, run_compare, CompareConfig};
use tco_compare::TcoError;

const VENDORS: [&str; 3] = ["Vendor A", "Vendor B", "Vendor C"];

/// Write one round as xlsx with its table at (`row0`, `col0`).
fn write_round_xlsx(
    path: &Path,
    row0: u32,
    col0: u16,
    header: &[&str],
    rows: &[(&str, Vec<f64>)],
) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, name) in header.iter().enumerate() {
        sheet.write_string(row0, col0 + c as u16, *name).unwrap();
    }
    for (r, (desc, prices)) in rows.iter().enumerate() {
        let row = row0 + 1 + r as u32;
        sheet.write_string(row, col0, *desc).unwrap();
        for (c, price) in prices.iter().enumerate() {
            sheet.write_number(row, col0 + 1 + c as u16, *price).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

fn header() -> Vec<&'static str> {
    let mut header = vec!["TCO Component"];
    header.extend(VENDORS);
    header
}

/// The four-round dataset: one floating table, one stray TOTAL row, one CSV round.
fn write_dummy_rounds(dir: &Path) -> Vec<PathBuf> {
    let r1 = dir.join("Round 1.xlsx");
    write_round_xlsx(
        &r1,
        0,
        0,
        &header(),
        &[
            ("Software", vec![12000.0, 13500.0, 11000.0]),
            ("Hardware", vec![25000.0, 24000.0, 23000.0]),
        ],
    );

    let r2 = dir.join("Round 2.xlsx");
    write_round_xlsx(
        &r2,
        3,
        2,
        &header(),
        &[
            ("Software", vec![9850.0, 10230.0, 9570.0]),
            ("Hardware", vec![18020.0, 17590.0, 16980.0]),
        ],
    );

    let r3 = dir.join("Round 3.xlsx");
    write_round_xlsx(
        &r3,
        0,
        0,
        &header(),
        &[
            ("Software", vec![14530.0, 15210.0, 13960.0]),
            ("Hardware", vec![31080.0, 29840.0, 28590.0]),
            ("TOTAL", vec![6000.0, 6800.0, 7600.0]),
        ],
    );

    let r4 = dir.join("Round 4.csv");
    std::fs::write(
        &r4,
        "TCO Component,Vendor A,Vendor B,Vendor C\n\
         Software,13420,12090,11560\n\
         Hardware,19570,27840,26510\n",
    )
    .unwrap();

    // Deliberately out of order
    vec![r3, r1, r4, r2]
}

fn open_sheet(path: &Path, name: &str) -> Range<Data> {
    let mut workbook = open_workbook_auto(path).unwrap();
    workbook.worksheet_range(name).unwrap()
}

fn text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.clone(),
        other => panic!("expected text at ({row}, {col}), got {other:?}"),
    }
}

fn number(range: &Range<Data>, row: u32, col: u32) -> f64 {
    match range.get_value((row, col)) {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        other => panic!("expected number at ({row}, {col}), got {other:?}"),
    }
}

fn is_blank(range: &Range<Data>, row: u32, col: u32) -> bool {
    matches!(range.get_value((row, col)), None | Some(Data::Empty))
}

fn compare(dir: &Path, inputs: Vec<PathBuf>, sheets: &[&str]) -> PathBuf {
    let output = dir.join("out").join("comparison.xlsx");
    let config = CompareConfig {
        inputs,
        output: output.clone(),
        sheets: sheets.iter().map(|s| s.to_string()).collect(),
        threads: None,
    };
    let summary = run_compare(&config).unwrap();
    assert!(summary.contains("Rounds: 4"));
    output
}

#[test]
fn test_full_workbook_sheet_order() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let output = compare(dir.path(), inputs, &[]);

    let workbook = open_workbook_auto(&output).unwrap();
    assert_eq!(workbook.sheet_names(), SHEET_NAMES.to_vec());
}

#[test]
fn test_selected_sheets_in_caller_order() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let output = compare(dir.path(), inputs, &[PIVOT_TABLE, MERGE_DATA]);

    let workbook = open_workbook_auto(&output).unwrap();
    assert_eq!(workbook.sheet_names(), vec![PIVOT_TABLE, MERGE_DATA]);
}

#[test]
fn test_merge_data_recomputes_totals() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let output = compare(dir.path(), inputs, &[MERGE_DATA]);
    let range = open_sheet(&output, MERGE_DATA);

    assert_eq!(text(&range, 0, 0), "ROUND");
    assert_eq!(text(&range, 1, 0), "Round 1");
    assert_eq!(text(&range, 1, 1), "Software");
    assert_eq!(number(&range, 1, 2), 12000.0);

    // Round 1 TOTAL
    assert_eq!(text(&range, 3, 1), "TOTAL");
    assert_eq!(number(&range, 3, 2), 37000.0);
    assert_eq!(number(&range, 3, 4), 34000.0);

    // Round 3 TOTAL ignores the supplied 6000/6800/7600
    assert_eq!(text(&range, 7, 0), "Round 3");
    assert_eq!(text(&range, 9, 1), "TOTAL");
    assert_eq!(number(&range, 9, 2), 14530.0 + 31080.0);

    // Round 4 came from CSV
    assert_eq!(text(&range, 12, 1), "TOTAL");
    assert_eq!(number(&range, 12, 3), 39930.0);
}

#[test]
fn test_exported_merge_data_reingests_losslessly() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let analysis = analyze_files(&inputs).unwrap();
    let output = compare(dir.path(), inputs, &[MERGE_DATA]);

    // The exported TOTAL rows are dropped again; every other value comes back unchanged
    let table = ingest(&output).unwrap();
    assert_eq!(table.descriptor_columns, vec!["ROUND", "TCO Component"]);
    assert_eq!(table.vendor_columns, VENDORS.to_vec());

    let merged = &analysis.merged;
    let expected: Vec<(Vec<String>, Vec<Option<f64>>)> = merged
        .rows
        .iter()
        .filter(|r| !r.is_total)
        .map(|r| {
            let mut descriptors = vec![merged.round_label(r.round).to_string()];
            descriptors.extend(r.descriptors.iter().cloned());
            (descriptors, r.prices.clone())
        })
        .collect();
    let actual: Vec<(Vec<String>, Vec<Option<f64>>)> = table
        .rows
        .iter()
        .map(|r| (r.descriptors.clone(), r.prices.clone()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_bid_analysis_values() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let output = compare(dir.path(), inputs, &[BID_ANALYSIS]);
    let range = open_sheet(&output, BID_ANALYSIS);

    assert_eq!(text(&range, 0, 9), "Gap 1 to 2 (%)");
    assert_eq!(text(&range, 1, 1), "Software");
    assert_eq!(number(&range, 1, 5), 11000.0);
    assert_eq!(text(&range, 1, 6), "Vendor C");
    assert_eq!(number(&range, 1, 7), 12000.0);
    assert_eq!(text(&range, 1, 8), "Vendor A");
    assert_eq!(number(&range, 1, 9), 9.1);
    assert_eq!(number(&range, 1, 10), 12000.0);
    assert_eq!(number(&range, 1, 11), 0.0);
    assert_eq!(number(&range, 1, 12), 12.5);
    assert_eq!(number(&range, 1, 13), -8.3);
}

#[test]
fn test_movement_values_and_total_blanks() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let output = compare(dir.path(), inputs, &[MOVEMENT_ANALYSIS]);
    let range = open_sheet(&output, MOVEMENT_ANALYSIS);

    // Vendor A Hardware
    assert_eq!(text(&range, 2, 0), "Vendor A");
    assert_eq!(text(&range, 2, 1), "Hardware");
    assert_eq!(number(&range, 2, 2), 25000.0);
    assert_eq!(number(&range, 2, 5), 19570.0);
    assert_eq!(number(&range, 2, 6), 5430.0);
    assert_eq!(number(&range, 2, 7), 21.7);
    assert_eq!(text(&range, 2, 8), "Fluctuating");

    // Vendor A TOTAL: prices only
    assert_eq!(text(&range, 3, 1), "TOTAL");
    assert_eq!(number(&range, 3, 2), 37000.0);
    for col in 6..=10 {
        assert!(is_blank(&range, 3, col), "column {col} should be blank");
    }
}

#[test]
fn test_winning_performance_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let output = compare(dir.path(), inputs, &[WINNING_PERFORMANCE]);
    let range = open_sheet(&output, WINNING_PERFORMANCE);

    assert_eq!(text(&range, 0, 2), "WINS");
    // Round 1: Vendor C wins both components
    assert_eq!(text(&range, 3, 1), "Vendor C");
    assert_eq!(number(&range, 3, 2), 2.0);
    assert_eq!(number(&range, 1, 2), 0.0);
}

#[test]
fn test_input_order_does_not_matter() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_dummy_rounds(dir.path());
    let mut reversed = inputs.clone();
    reversed.reverse();

    let a = analyze_files(&inputs).unwrap();
    let b = analyze_files(&reversed).unwrap();
    assert_eq!(a, b);

    let labels: Vec<&str> = a.merged.rounds.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["Round 1", "Round 2", "Round 3", "Round 4"]);
}

#[test]
fn test_reserved_column_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = write_dummy_rounds(dir.path());

    let bad = dir.path().join("Round 5.csv");
    std::fs::write(&bad, "No,Scope,Desc,Vendor A\n1,Infra,Servers,100\n").unwrap();
    inputs.push(bad);

    let output = dir.path().join("out.xlsx");
    let config = CompareConfig {
        inputs,
        output: output.clone(),
        sheets: Vec::new(),
        threads: None,
    };
    assert!(matches!(
        run_compare(&config),
        Err(TcoError::ReservedColumn { ref column, .. }) if column == "No"
    ));
    assert!(!output.exists());
}

#[test]
fn test_schema_mismatch_names_round() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = write_dummy_rounds(dir.path());

    let odd = dir.path().join("Round 5.csv");
    std::fs::write(&odd, "TCO Component,Vendor A,Vendor D\nSoftware,1,2\n").unwrap();
    inputs.push(odd);

    match analyze_files(&inputs) {
        Err(TcoError::SchemaMismatch { round, .. }) => assert_eq!(round, "Round 5"),
        other => panic!("expected schema mismatch, got {:?}", other.map(|_| ())),
    }
}
