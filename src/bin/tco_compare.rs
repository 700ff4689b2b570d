//! TCO Compare - round-by-round vendor price comparison
//!
//! Reads one price sheet per negotiation round, merges them, and writes the
//! analysis as a formatted workbook, or prints a single view to the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tco_compare::export::{write_table_csv, BID_ANALYSIS, SHEET_NAMES};
use tco_compare::format::render_table;
use tco_compare::pipeline::{analyze_files, run_compare, Analysis, CompareConfig};

#[derive(Parser)]
#[command(name = "tco-compare")]
#[command(about = "Compare vendor TCO prices across negotiation rounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge round files and export the analysis workbook
    Compare {
        /// Round files (.xlsx, .xls, .xlsm, .xlsb, .ods, .csv); the file name is the round label
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output xlsx file
        #[arg(short, long, default_value = "tco_comparison.xlsx")]
        output: PathBuf,

        /// Sheets to export, in order (default: all).
        /// Example: --sheets "Pivot Table,Bid & Price Analysis"
        #[arg(short, long, env = "TCO_SHEETS", value_delimiter = ',')]
        sheets: Vec<String>,

        /// Number of parallel threads for reading (default: number of CPU cores)
        #[arg(short, long, env = "TCO_THREADS")]
        threads: Option<usize>,
    },

    /// Print one analysis view as a text table
    Show {
        /// Round files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Sheet to show
        #[arg(short, long, default_value = BID_ANALYSIS)]
        sheet: String,
    },

    /// List the sheet names that can be exported
    Sheets,

    /// Write one analysis view as CSV (raw values)
    ExportCsv {
        /// Round files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Sheet to write
        #[arg(short, long)]
        sheet: String,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            inputs,
            output,
            sheets,
            threads,
        } => {
            let config = CompareConfig {
                inputs,
                output,
                sheets,
                threads,
            };
            let summary = run_compare(&config).context("Comparison failed")?;
            println!("{}", summary);
        }
        Commands::Show { inputs, sheet } => {
            let analysis = analyze_files(&inputs).context("Failed to analyze round files")?;
            let table = lookup(&analysis, &sheet)?;
            println!("{}", sheet);
            print!("{}", render_table(&table));
        }
        Commands::Sheets => {
            for name in SHEET_NAMES {
                println!("{}", name);
            }
        }
        Commands::ExportCsv {
            inputs,
            sheet,
            output,
        } => {
            let analysis = analyze_files(&inputs).context("Failed to analyze round files")?;
            let table = lookup(&analysis, &sheet)?;
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_table_csv(&table, BufWriter::new(file))?;
                    eprintln!("Wrote {} rows to {}", table.len(), path.display());
                }
                None => write_table_csv(&table, io::stdout().lock())?,
            }
        }
    }

    Ok(())
}

fn lookup(analysis: &Analysis, sheet: &str) -> Result<tco_compare::Table> {
    analysis.table(sheet).with_context(|| {
        format!(
            "Unknown sheet '{}' (available: {})",
            sheet,
            SHEET_NAMES.join(", ")
        )
    })
}
