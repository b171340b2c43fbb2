//! Protobuf Schema Compatibility CLI
//!
//! Compares a message or enum (or every top-level type, with `.`) between two
//! versions of a schema and prints the differences.
//!
//! Usage:
//!   proto-compat v1/ api.json v2/ api.json acme.User
//!   proto-compat v1/ api.pb v2/ api.pb . --by-number --format json
//!
//! Exit codes: 0 no differences, 1 differences found, 2 load or
//! configuration error, 3 requested type missing on either side.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use proto_compat::{
    compare_sources, render, render_summary, CompatConfig, DiffTree, MatchMode, OutputFormat,
    Source, Target,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXIT_NO_DIFF: u8 = 0;
const EXIT_DIFF: u8 = 1;
const EXIT_ERROR: u8 = 2;
const EXIT_NAME_MISSING: u8 = 3;

#[derive(Parser)]
#[command(name = "proto-compat")]
#[command(about = "Report structural differences between two protobuf schema versions")]
struct Cli {
    /// Directory holding the old schema
    root_a: PathBuf,

    /// Schema file of the old version, relative to ROOT_A
    file_a: String,

    /// Directory holding the new schema
    root_b: PathBuf,

    /// Schema file of the new version, relative to ROOT_B
    file_b: String,

    /// Fully-qualified message or enum name, or `.` for every top-level type
    name: String,

    /// Name of the type on the new side, when it was renamed
    #[arg(long)]
    b_name: Option<String>,

    /// Match fields and enum values by tag number instead of name
    #[arg(long)]
    by_number: bool,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Print "required by" notes
    #[arg(long)]
    notes: bool,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut config = CompatConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.by_number {
        config.compare.mode = MatchMode::ByNumber;
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }
    if cli.notes {
        config.report.show_notes = true;
    }

    let a = Source::open(&cli.root_a, &cli.file_a)
        .with_context(|| format!("loading {}", cli.root_a.join(&cli.file_a).display()))?;
    let b = Source::open(&cli.root_b, &cli.file_b)
        .with_context(|| format!("loading {}", cli.root_b.join(&cli.file_b).display()))?;

    let target = Target::parse(&cli.name, cli.b_name.as_deref());
    info!(mode = %config.compare.mode, compared = ?target, "Comparing schemas");

    let tree = compare_sources(&a, &b, &target, config.compare.mode);
    print!("{}", render(&tree, config.report.format, config.report.text_options())?);
    if config.report.format == OutputFormat::Json {
        println!();
    }

    if tree.summary().has_missing_names() {
        if let Target::Named { a: name_a, b: name_b } = &target {
            let found_a = suggest(&a, name_a, "old");
            let found_b = suggest(&b, name_b, "new");
            if found_a && found_b {
                eprintln!("{} and {} are not the same kind of type", name_a, name_b);
            }
        }
        return Ok(EXIT_NAME_MISSING);
    }

    eprintln!("{}", render_summary(&tree));
    Ok(exit_code(&tree))
}

fn exit_code(tree: &DiffTree) -> u8 {
    if tree.is_empty() {
        EXIT_NO_DIFF
    } else {
        EXIT_DIFF
    }
}

/// Point at similarly named types when `name` is not defined in `source`.
/// Returns whether the name exists.
fn suggest(source: &Source, name: &str, side: &str) -> bool {
    let pool = source.pool();
    if pool.find_message_by_name(name).is_some() || pool.find_enum_by_name(name).is_some() {
        return true;
    }

    eprintln!("{} not found in the {} schema ({})", name, side, source.path().display());
    let hits = pool.search(name, 5);
    if !hits.is_empty() {
        eprintln!("Did you mean:");
        for hit in hits {
            eprintln!("  {}", hit);
        }
    }
    false
}
