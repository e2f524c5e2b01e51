use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use deviceaudit_core::{
    count_users_with_valid_devices, export_records, extract_active_devices, DocumentStore,
    FileStorage, JsonExportSink, JsonLinesStorage, LogLevel, PipelineConfig, StderrSink,
    TextTableSink,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "deviceaudit")]
#[command(about = "DeviceAudit CLI - device and authenticator activity reports over user documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count users with at least one valid device
    Count {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Export recently active devices/authenticators as a flat table
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        /// Recency window in days
        #[arg(long)]
        days: Option<u32>,
        /// Write rows to this JSON file instead of printing a table
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the collections a store holds
    Collections {
        /// Store: a JSON file or a directory of <collection>.jsonl files
        #[arg(long)]
        store: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Store: a JSON file ({"collection": [docs...]}) or a directory of <collection>.jsonl files
    #[arg(long)]
    store: PathBuf,
    /// Collection holding user documents
    #[arg(long)]
    collection: Option<String>,
    /// JSON config file (collection, days_threshold, exclude_user_id_patterns)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let start = Local::now();
    println!("Started: {}", start.format("%Y-%m-%d %H:%M:%S"));

    match cli.command {
        Commands::Count { source } => run_count(&source)?,
        Commands::Extract {
            source,
            days,
            output,
        } => run_extract(&source, days, output.as_deref())?,
        Commands::Collections { store } => run_collections(&store)?,
    }

    let elapsed = Local::now() - start;
    println!("Completed in: {:.3}s", elapsed.num_milliseconds() as f64 / 1000.0);
    Ok(())
}

fn log_sink(source: &SourceArgs) -> Result<StderrSink> {
    let level = LogLevel::from_str(&source.log_level)
        .with_context(|| format!("Unknown log level: {}", source.log_level))?;
    Ok(StderrSink::new(level))
}

/// File config first, then command-line overrides
fn load_config(source: &SourceArgs, days: Option<u32>) -> Result<PipelineConfig> {
    let mut config = match &source.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(collection) = &source.collection {
        config = config.with_collection(collection.clone());
    }
    if let Some(days) = days {
        config = config.with_days_threshold(days);
    }
    config.validate().with_context(|| "Invalid configuration")?;
    Ok(config)
}

fn open_store(path: &Path) -> Result<Box<dyn DocumentStore>> {
    if path.is_dir() {
        let store = JsonLinesStorage::open(path)
            .with_context(|| format!("Failed to open store directory: {}", path.display()))?;
        Ok(Box::new(store))
    } else {
        let store = FileStorage::open(path)
            .with_context(|| format!("Failed to open store file: {}", path.display()))?;
        Ok(Box::new(store))
    }
}

fn run_collections(path: &Path) -> Result<()> {
    let store = open_store(path)?;
    let names = store
        .list_collections()
        .with_context(|| format!("Failed to list collections: {}", path.display()))?;

    println!("{} collection(s)", names.len());
    for name in &names {
        println!("  {}", name);
    }
    Ok(())
}

fn run_count(source: &SourceArgs) -> Result<()> {
    let sink = log_sink(source)?;
    let config = load_config(source, None)?;
    let store = open_store(&source.store)?;

    let summary = count_users_with_valid_devices(store.as_ref(), &config, &sink)
        .with_context(|| format!("Counting failed on collection '{}'", config.collection))?;

    println!("{}", summary.summary());
    Ok(())
}

fn run_extract(source: &SourceArgs, days: Option<u32>, output: Option<&Path>) -> Result<()> {
    let sink = log_sink(source)?;
    let config = load_config(source, days)?;
    let store = open_store(&source.store)?;

    let report = extract_active_devices(store.as_ref(), &config, &sink)
        .with_context(|| format!("Extraction failed on collection '{}'", config.collection))?;

    if report.is_empty() {
        println!("No matching records found.");
        return Ok(());
    }

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            let mut table = JsonExportSink::new(BufWriter::new(file));
            export_records(&report.records, &mut table)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            println!(
                "Exported → {}  ({} rows)",
                path.display(),
                report.records.len()
            );
        }
        None => {
            let mut table = TextTableSink::new(io::stdout().lock());
            export_records(&report.records, &mut table)
                .with_context(|| "Failed to print report")?;
        }
    }
    Ok(())
}
