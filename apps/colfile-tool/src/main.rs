//! CLI tool for columnar file management.
//!
//! Provides commands for:
//! - Generating dummy jsonl datasets
//! - Converting jsonl files to the naive columnar format
//! - Inspecting a columnar file's schema and contents

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rand::Rng;

use colfile_core::{ColumnFile, ColumnarStore, JsonlFile, ParallelScanner, ScanConfig};
use colfile_types::{ColumnSpec, ColumnType, Record, RecordBatch, Schema, Value};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dummy jsonl dataset with the demo schema
    Generate {
        /// Output jsonl path
        #[arg(short, long, default_value = "data/dummy/to_load.jsonl")]
        output: PathBuf,

        /// Number of rows to generate
        #[arg(short, long, default_value_t = 100_000)]
        rows: usize,
    },

    /// Convert a jsonl file (demo schema) into a naive columnar file
    Convert {
        /// Input jsonl path
        #[arg(short, long)]
        input: PathBuf,

        /// Output columnar path (.naive)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print a columnar file's schema and row count
    Inspect {
        /// Columnar file path (.naive)
        file: PathBuf,
    },

    /// Scan columns from a file and print the first rows
    Scan {
        /// File path (.naive or .jsonl)
        file: PathBuf,

        /// Columns to read (comma-separated)
        #[arg(short, long)]
        columns: String,

        /// Number of parallel scan partitions
        #[arg(short, long, default_value_t = 1)]
        parallel_reads: usize,

        /// Rows to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

/// Schema used by `generate` and expected by `convert`.
fn demo_schema() -> Schema {
    Schema::new(vec![
        ColumnSpec::new("column_int", ColumnType::Int64),
        ColumnSpec::new("column_float", ColumnType::Float32),
        ColumnSpec::new("column_float_2", ColumnType::Float64),
        ColumnSpec::new("column_string", ColumnType::String),
        ColumnSpec::new("column_bool", ColumnType::Bool),
    ])
}

fn generate(output: &PathBuf, rows: usize) -> anyhow::Result<()> {
    if rows == 0 {
        bail!("row count must be positive");
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut rng = rand::thread_rng();
    let records = (0..rows)
        .map(|_| {
            Record::new(vec![
                Value::Int64(rng.gen_range(0..1_000_000)),
                Value::Float32(rng.gen()),
                Value::Float64(rng.gen()),
                Value::String(format!("value-{}", rng.gen::<u32>())),
                Value::Bool(rng.gen()),
            ])
        })
        .collect();
    let batch = RecordBatch::new(demo_schema(), records)?;

    let mut file = JsonlFile::open(output, demo_schema())?;
    file.write(&batch)?;
    file.close()?;
    tracing::info!(path = %output.display(), rows, "dummy dataset written");
    println!("Wrote {} rows to {}", rows, output.display());
    Ok(())
}

fn convert(input: &PathBuf, output: &PathBuf) -> anyhow::Result<()> {
    let schema = demo_schema();
    let columns: Vec<String> = schema.columns().iter().map(|c| c.name.clone()).collect();

    let mut source = JsonlFile::open(input, schema.clone())?;
    let scanned = source.scan(&columns)?;
    source.close()?;
    if scanned.len() != schema.len() {
        bail!("input is missing demo schema columns");
    }

    let row_count = scanned.first().map_or(0, |c| c.values.len());
    let mut iters: Vec<_> = scanned.into_iter().map(|c| c.values.into_iter()).collect();
    let rows: Vec<Record> = (0..row_count)
        .map(|_| Record::new(iters.iter_mut().filter_map(|it| it.next()).collect()))
        .collect();
    let batch = RecordBatch::new(schema, rows)?;

    let mut target = ColumnFile::open(output)?;
    target.write(&batch)?;
    target.close()?;
    println!(
        "Converted {} rows from {} to {}",
        row_count,
        input.display(),
        output.display()
    );
    Ok(())
}

fn inspect(file: &PathBuf) -> anyhow::Result<()> {
    let handle = ColumnFile::open(file)?;
    match handle.metadata() {
        None => println!("{}: empty file, no schema", file.display()),
        Some(metadata) => {
            println!("{}", file.display());
            println!("  rows:    {}", metadata.row_count);
            println!("  columns: {}", metadata.column_count);
            for def in &metadata.columns {
                println!("    {:<24} {:<12?} offset {}", def.name, def.ty, def.offset);
            }
        }
    }
    Ok(())
}

fn scan(
    file: &PathBuf,
    columns: &str,
    parallel_reads: usize,
    limit: usize,
) -> anyhow::Result<()> {
    let requested: Vec<String> = columns
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if requested.is_empty() {
        bail!("no columns requested");
    }

    let scanner = ParallelScanner::new(file, ScanConfig::with_parallel_reads(parallel_reads))
        .with_text_schema(demo_schema());
    let records = scanner.scan(&requested)?;

    println!("{} rows", records.len());
    for record in records.iter().take(limit) {
        let cells: Vec<String> = record.values().iter().map(|v| v.to_string()).collect();
        println!("  {}", cells.join(" | "));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { output, rows } => generate(output, *rows),
        Commands::Convert { input, output } => convert(input, output),
        Commands::Inspect { file } => inspect(file),
        Commands::Scan {
            file,
            columns,
            parallel_reads,
            limit,
        } => scan(file, columns, *parallel_reads, *limit),
    }
}
