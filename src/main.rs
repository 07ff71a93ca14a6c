//! Command-line entry point for slitcube.
//!
//! Extracts observation archives, assembles every dataset they contain, and
//! offers a few helpers for looking at archives and assembled cubes.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use slitcube::cli::{AssembleArgs, Command, InspectArgs, ListArgs, UnstackArgs};
use slitcube::cube::{SPATIAL_X_AXIS, TIME_AXIS};
use slitcube::fits::read_fits_layout;
use slitcube::io::fs::ensure_dir;
use slitcube::zip::{list_archive, percent_saved};
use slitcube::{Cli, SlitAssembler, SplitOutcome, extract_archive, scan_tree, split_time_series};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match &cli.command {
        Command::Assemble(args) => assemble(args).await,
        Command::Unstack(args) => unstack(args, cli.is_quiet()).await,
        Command::List(args) => list_files(args).await,
        Command::Inspect(args) => inspect(args).await,
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level chosen by `-q`.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Extract the archive, then assemble each dataset directory found in it.
///
/// A dataset that fails is logged and skipped so the rest of the batch still
/// gets written; the command fails at the end if any dataset did.
async fn assemble(args: &AssembleArgs) -> Result<()> {
    let options = args.options();
    options.validate()?;

    let archive = args.archive_path();
    let staging = args.staging_dir();
    extract_archive(&archive, &staging)
        .await
        .with_context(|| format!("Failed to extract {}", archive.display()))?;

    ensure_dir(&args.output).await?;

    let scan = tokio::task::spawn_blocking({
        let staging = staging.clone();
        move || scan_tree(&staging)
    })
    .await
    .context("Directory scan did not complete")?;
    if scan.datasets.is_empty() {
        warn!(staging = %staging.display(), "no dataset directories found");
    }

    let assembler = SlitAssembler::new(options);
    let mut failed = 0usize;
    for dataset in &scan.datasets {
        let base_name = dataset_base_name(dataset);
        if let Err(e) = assembler.assemble(dataset, &args.output, &base_name).await {
            error!(dataset = %dataset.display(), "assembly failed: {e}");
            failed += 1;
        }
    }

    if args.cleanup {
        tokio::fs::remove_dir_all(&staging)
            .await
            .with_context(|| format!("Failed to remove {}", staging.display()))?;
        info!(staging = %staging.display(), "removed staging directory");
    }

    if failed > 0 {
        bail!("{failed} of {} datasets failed to assemble", scan.datasets.len());
    }
    info!(datasets = scan.datasets.len(), "assembly complete");
    Ok(())
}

/// `<dataset dir name>.fits`, e.g. `20230615120000.fits`.
fn dataset_base_name(dataset: &Path) -> String {
    let name = dataset
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    format!("{name}.fits")
}

async fn unstack(args: &UnstackArgs, quiet: bool) -> Result<()> {
    let outcome = split_time_series(&args.file, &args.output_root(), args.limit)
        .await
        .with_context(|| format!("Failed to unstack {}", args.file.display()))?;

    if quiet {
        return Ok(());
    }
    match outcome {
        SplitOutcome::SourceMissing(path) => {
            eprintln!("Skipping: {} (not found)", path.display());
        }
        SplitOutcome::Split {
            directory,
            segments,
        } => {
            println!("Unstacked {segments} scans into {}", directory.display());
        }
    }
    Ok(())
}

/// List archive members.
///
/// - Simple format: one name per line
/// - Verbose format (`-v`): sizes, compression ratio and timestamps, plus totals
async fn list_files(args: &ListArgs) -> Result<()> {
    let entries = list_archive(&args.file).await?;

    if !args.verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {:>4}%  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            entry.saved_percent(),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {:>4}%  {:>21}  {} files ({})",
        total_uncompressed,
        total_compressed,
        percent_saved(total_compressed, total_uncompressed),
        "",
        file_count,
        format_size(total_uncompressed)
    );
    Ok(())
}

/// Print an assembled cube's layout; stacked cubes also list their scans.
async fn inspect(args: &InspectArgs) -> Result<()> {
    let (header, layout) = read_fits_layout(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let shape = layout.shape();

    println!("{}", args.file.display());
    println!("  shape: {shape:?}");
    match shape.len() {
        4 => println!("  raster with {} slit positions", shape[SPATIAL_X_AXIS]),
        5 => {
            println!(
                "  time series: {} scans of {} slit positions",
                shape[TIME_AXIS], shape[SPATIAL_X_AXIS]
            );
            for scan in 0..shape[TIME_AXIS] {
                println!("    scan {scan}");
            }
        }
        n => println!("  {n} axes (not an assembled cube)"),
    }
    if let Some(bytes) = layout.data_bytes() {
        println!("  size: {}", format_size(bytes as u64));
    }

    if args.verbose {
        println!();
        for card in header.cards() {
            println!("{}", String::from_utf8_lossy(card.image()).trim_end());
        }
    }
    Ok(())
}

/// Format a byte count with a binary unit.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
