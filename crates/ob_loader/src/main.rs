//! Batch CLI
//!
//! CSV snapshot logs → interval, lineup, stint and possession outputs

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "ob_loader")]
#[command(about = "Run interval analytics over snapshot logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Process a batch of contests and commit one output file per contest
    Run {
        /// Snapshot CSV file, or a directory of them
        #[arg(long)]
        snapshots: PathBuf,

        /// Contest manifest CSV
        #[arg(long)]
        manifest: PathBuf,

        /// Player biography CSV
        #[arg(long)]
        bios: Option<PathBuf>,

        /// YAML or JSON configuration (defaults to OB_CONFIG_PROFILE preset)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Worker threads (overrides config)
        #[arg(long)]
        workers: Option<usize>,

        /// Write the batch summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Verify the checksum and version of a committed contest file
    Verify {
        /// Committed `.obr` file
        #[arg(long)]
        file: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { snapshots, manifest, bios, config, out, workers, summary } => {
            let mut cfg = match &config {
                Some(path) => ob_core::AnalyticsConfig::load(path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
                None => ob_core::AnalyticsConfig::from_env_or_default(),
            };
            if let Some(workers) = workers {
                cfg.batch.workers = workers;
            }

            println!("🏀 Running interval analytics...");
            println!("   Snapshots: {}", snapshots.display());
            println!("   Manifest:  {}", manifest.display());
            println!("   Output:    {}", out.display());

            let teams = ob_loader::TeamDirectory::from_config(&cfg);
            let (contests, manifest_stats) = ob_loader::parse_contest_manifest(&manifest, &teams)?;
            let bio_index = match &bios {
                Some(path) => ob_loader::parse_bio_csv(path)?.0,
                None => ob_loader::BioIndex::default(),
            };
            let (inputs, parse_stats) = ob_loader::load_batch(&snapshots, &contests, &bio_index, &teams)?;
            println!(
                "   Loaded {} contests, {} snapshot rows ({} rows skipped, {} manifest rows skipped)",
                inputs.len(),
                parse_stats.parsed,
                parse_stats.failed,
                manifest_stats.failed
            );

            let runner = ob_core::BatchRunner::new(cfg)?;
            let sink = ob_core::FileSink::new(&out)?;
            let cancel = ob_core::CancellationToken::new();
            let result = runner.run(&inputs, &sink, &cancel)?;

            print_summary(&result);

            if let Some(path) = summary {
                std::fs::write(&path, serde_json::to_string_pretty(&result)?)?;
                println!("\n📄 Summary saved to: {}", path.display());
            }

            if !result.failed.is_empty() {
                anyhow::bail!("❌ {} contests failed", result.failed.len());
            }
        }

        Commands::Verify { file } => {
            println!("🔍 Verifying {}...", file.display());
            let output = ob_core::FileSink::load_from_path(&file)?;
            println!("✅ Checksum and version OK");
            println!("   Contest:     {}", output.contest_id);
            println!("   Intervals:   {}", output.interval_stats.len());
            println!("   Lineups:     {}", output.lineups.len());
            println!("   Stints:      {}", output.stints.len());
            println!("   Possessions: {}", output.possessions.len());
            println!("   Suspect:     {}", output.suspect_rows());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(summary: &ob_core::BatchSummary) {
    println!("\n✅ Batch finished");
    println!("   Processed:        {}", summary.processed.len());
    println!("   Failed:           {}", summary.failed.len());
    println!("   Skipped (suspect): {}", summary.skipped_suspect.len());
    println!("   Cancelled:        {}", summary.cancelled.len());
    println!("   Suspect rows:     {}", summary.suspect_rows);
    for failure in &summary.failed {
        println!("   ❌ {}", failure);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("ob_loader CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
