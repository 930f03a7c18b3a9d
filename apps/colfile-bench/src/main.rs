//! Selective-column scan benchmark.
//!
//! Times `ParallelScanner::scan` against the naive columnar format and the
//! jsonl baseline for a given column count and split factor, averaged over
//! N samples.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::bail;
use clap::{Parser, Subcommand};

use colfile_core::{ParallelScanner, ScanConfig};
use colfile_types::{ColumnSpec, ColumnType, Schema};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time selective-column scans on both backends
    Run {
        /// Columnar file to scan (.naive)
        #[arg(long, default_value = "data/output/naive_test.naive")]
        naive: PathBuf,

        /// jsonl file to scan
        #[arg(long, default_value = "data/dummy/to_load.jsonl")]
        jsonl: PathBuf,

        /// Number of parallel scan partitions for the columnar backend
        #[arg(short, long, default_value_t = 1)]
        parallel_reads: usize,

        /// Number of leading demo-schema columns to read (1-5)
        #[arg(short, long, default_value_t = 5)]
        columns: usize,

        /// Samples to average over
        #[arg(short, long, default_value_t = 10)]
        samples: usize,
    },
}

/// The demo schema shared with colfile-tool's generator.
fn demo_schema() -> Schema {
    Schema::new(vec![
        ColumnSpec::new("column_int", ColumnType::Int64),
        ColumnSpec::new("column_float", ColumnType::Float32),
        ColumnSpec::new("column_float_2", ColumnType::Float64),
        ColumnSpec::new("column_string", ColumnType::String),
        ColumnSpec::new("column_bool", ColumnType::Bool),
    ])
}

fn time_scans(label: &str, scanner: &ParallelScanner, columns: &[String], samples: usize) {
    let mut total = 0.0f64;
    let mut rows = 0usize;
    for _ in 0..samples {
        let start = Instant::now();
        match scanner.scan(columns) {
            Ok(records) => rows = records.len(),
            Err(e) => {
                tracing::error!(error = %e, "scan failed");
                println!("File type: {}\n\tscan failed: {}", label, e);
                return;
            }
        }
        total += start.elapsed().as_secs_f64();
    }
    println!("File type: {}", label);
    println!("\trows: {}", rows);
    println!("\taverage time: {:.6}s", total / samples as f64);
    println!("\ttotal time: {:.6}s", total);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            naive,
            jsonl,
            parallel_reads,
            columns,
            samples,
        } => {
            let schema = demo_schema();
            if *columns == 0 || *columns > schema.len() {
                bail!("column count must be between 1 and {}", schema.len());
            }
            if *samples == 0 {
                bail!("sample count must be positive");
            }
            let selected: Vec<String> = schema.columns()[..*columns]
                .iter()
                .map(|c| c.name.clone())
                .collect();

            println!("Parallel readers: {}", parallel_reads);
            println!("Selected columns: {}", selected.join(", "));

            // The jsonl baseline first; it ignores the split factor.
            let jsonl_scanner = ParallelScanner::new(jsonl, ScanConfig::default())
                .with_text_schema(schema.clone());
            time_scans("JSON newline", &jsonl_scanner, &selected, *samples);

            let naive_scanner =
                ParallelScanner::new(naive, ScanConfig::with_parallel_reads(*parallel_reads));
            time_scans("Naive columnar", &naive_scanner, &selected, *samples);
        }
    }
    Ok(())
}
