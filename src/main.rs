// src/main.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate a table of synthetic int/varchar columns and bulk-load it with COPY.
//!
//! Usage:
//!   # 10 million rows, 20 int columns into T20i
//!   load-column-data -r 10000000 -c 20 -d bench
//!
//!   # Mixed columns need an explicit table name
//!   load-column-data -t viivi -s 64 -n mixed --partition "c1 % 8"
//!
//!   # Write the script and COPY payload instead of connecting
//!   load-column-data -r 1000 -t varchar --dry-run --output T1v32.sql

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use tablegen::constants::*;
use tablegen::{
    load_table, ConnectionConfig, GeneratorConfig, PgTarget, ReadBoundary, ScriptTarget,
    StreamConfig, TablePlan, TypeSpec,
};

#[derive(Parser, Debug)]
#[command(name = "load-column-data")]
#[command(about = "Generate a table of synthetic columns and bulk-load it", long_about = None)]
struct Args {
    /// Number of rows to generate
    #[arg(short, long, default_value_t = DEFAULT_ROWS)]
    rows: u64,

    /// Number of columns (ignored for per-column type strings)
    #[arg(short, long, default_value_t = 1)]
    cols: usize,

    /// Column type: int, varchar, or one character per column such as "viivi"
    #[arg(short = 't', long = "type", default_value = "int")]
    column_type: String,

    /// Column names, comma separated (default: c0, c1, ...)
    #[arg(long, value_delimiter = ',')]
    colnames: Vec<String>,

    /// Maximum length of varchar columns
    #[arg(short, long, default_value_t = DEFAULT_VARCHAR_SIZE)]
    size: usize,

    /// Table name (required for per-column type strings)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Prefix for inferred table names (e.g. "TFunc", "SFunc")
    #[arg(short = 'p', long, default_value = DEFAULT_TABLE_PREFIX)]
    prefix: String,

    /// Partition expression for CREATE TABLE
    #[arg(long)]
    partition: Option<String>,

    /// Random seed; negative means non-deterministic
    #[arg(long, default_value_t = DEFAULT_SEED, allow_negative_numbers = true)]
    seed: i64,

    /// Database host
    #[arg(long, env = "VERTICA_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Database port
    #[arg(short = 'P', long, alias = "Port", env = "VERTICA_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Database user
    #[arg(short = 'U', long, alias = "User", env = "VERTICA_USER", default_value = DEFAULT_USER)]
    user: String,

    /// Database name
    #[arg(short = 'd', long, env = "VERTICA_DATABASE")]
    dbname: Option<String>,

    /// Database password
    #[arg(long, env = "VERTICA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Connection timeout in seconds
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Bytes requested from the row stream per COPY chunk
    #[arg(long, default_value_t = DEFAULT_READ_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    read_size: u64,

    /// Chunks buffered between generation and the network
    #[arg(long, default_value_t = DEFAULT_PREFETCH_DEPTH as u64, value_parser = clap::value_parser!(u64).range(1..))]
    prefetch: u64,

    /// End every COPY chunk on a row boundary
    #[arg(long)]
    row_aligned: bool,

    /// Write the SQL script and COPY payload instead of connecting
    #[arg(long)]
    dry_run: bool,

    /// Output file for --dry-run (default: stdout)
    #[arg(short, long, requires = "dry_run")]
    output: Option<PathBuf>,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Resolve the schema and table name before anything touches the database
fn build_plan(args: &Args) -> anyhow::Result<TablePlan> {
    let spec = TypeSpec::parse(&args.column_type, args.size)
        .with_context(|| format!("Invalid column type '{}'", args.column_type))?;

    // `--colnames ""` means the default names
    let names: &[String] = if args.colnames.iter().all(|name| name.trim().is_empty()) {
        &[]
    } else {
        &args.colnames
    };
    let schema = spec
        .schema(args.cols, args.size, names)
        .context("Invalid column definition")?;

    let table_name = match args.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => spec
            .infer_table_name(&args.prefix, args.cols, args.size)
            .context("Cannot infer a table name")?,
    };

    let plan = TablePlan::new(table_name, schema);
    Ok(match &args.partition {
        Some(expr) if !expr.trim().is_empty() => plan.with_partition(expr.trim()),
        _ => plan,
    })
}

fn connection_config(args: &Args) -> ConnectionConfig {
    ConnectionConfig {
        host: args.host.clone(),
        port: args.port,
        user: args.user.clone(),
        password: args.password.clone(),
        database: args.dbname.clone(),
        connect_timeout: args.connect_timeout.map(Duration::from_secs),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let plan = build_plan(&args)?;
    let generator = GeneratorConfig {
        total_rows: args.rows,
        seed: GeneratorConfig::seed_from_cli(args.seed),
        ..Default::default()
    };
    let stream = StreamConfig {
        read_size: args.read_size as usize,
        boundary: if args.row_aligned {
            ReadBoundary::RowAligned
        } else {
            ReadBoundary::Exact
        },
        prefetch_depth: args.prefetch as usize,
    };

    tracing::info!(
        "Table {}: {} columns ({}), {} rows",
        plan.table_name,
        plan.schema.len(),
        plan.schema.type_string(),
        args.rows
    );

    let metrics = if args.dry_run {
        let writer: Box<dyn Write + Send> = match &args.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout())),
        };
        let mut target = ScriptTarget::new(writer);
        load_table(&mut target, &plan, generator, stream)
            .await
            .context("Dry run failed")?
    } else {
        let connection = connection_config(&args);
        let mut target = PgTarget::connect(&connection)
            .await
            .with_context(|| format!("Failed to connect to {}:{}", connection.host, connection.port))?;
        load_table(&mut target, &plan, generator, stream)
            .await
            .with_context(|| format!("Failed to load table {}", plan.table_name))?
    };

    if let Some(path) = &args.output {
        eprintln!(
            "Wrote {} rows for {} to {}",
            metrics.rows_generated,
            plan.table_name,
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("load-column-data").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.rows, 100_000);
        assert_eq!(args.seed, 3_141_592);
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.table_name, "T1i");
        assert_eq!(plan.schema.len(), 1);
        assert!(plan.partition.is_none());
    }

    #[test]
    fn test_inferred_varchar_name() {
        let args = parse(&["-c", "1000", "-t", "varchar", "-s", "64", "-p", "SFunc"]);
        assert_eq!(build_plan(&args).unwrap().table_name, "SFunc1Kv64");
    }

    #[test]
    fn test_custom_types_need_a_name() {
        let args = parse(&["-t", "viivi"]);
        assert!(build_plan(&args).is_err());

        let args = parse(&["-t", "viivi", "-n", "mixed", "--partition", "c1 % 8"]);
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.table_name, "mixed");
        assert_eq!(plan.schema.type_string(), "viivi");
        assert_eq!(plan.partition.as_deref(), Some("c1 % 8"));
    }

    #[test]
    fn test_unknown_type_fails() {
        let args = parse(&["-t", "ix", "-n", "t"]);
        let err = build_plan(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown column type 'x'"));
    }

    #[test]
    fn test_negative_seed_and_names() {
        let args = parse(&["--seed", "-1", "-c", "2", "--colnames", "a,b", "-P", "5434"]);
        assert_eq!(GeneratorConfig::seed_from_cli(args.seed), None);
        let names: Vec<_> = build_plan(&args).unwrap().schema.column_names().map(String::from).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(connection_config(&args).port, 5434);
    }

    #[test]
    fn test_empty_colnames_use_defaults() {
        let args = parse(&["-c", "2", "--colnames", ""]);
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.create_sql(), "CREATE TABLE T2i (c0 int, c1 int)");
    }

    #[test]
    fn test_blank_colname_rejected_before_connecting() {
        let args = parse(&["-c", "3", "--colnames", "a,,b"]);
        let err = build_plan(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("Column name 1 is empty"));
    }

    #[test]
    fn test_output_requires_dry_run() {
        let result = Args::try_parse_from(["load-column-data", "--output", "x.sql"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_read_size_rejected() {
        let result = Args::try_parse_from(["load-column-data", "--read-size", "0"]);
        assert!(result.is_err());
    }
}
