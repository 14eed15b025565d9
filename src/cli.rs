use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use crate::avatar::{AvatarGenerator, GenerationSummary, RoboHashClient, RobotSet};
use crate::config::{Config, load_config};
use crate::expiry::ExpiryTracker;

#[derive(Parser, Debug)]
#[command(name = "avatargen")]
#[command(about = "avatargen - generate RoboHash avatars that clean themselves up")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Number of avatars to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub number: usize,

    /// Output directory for avatars [default: avatars]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Delete avatars after this many days on a later run (0 keeps them forever) [default: 1]
    #[arg(long, value_name = "DAYS")]
    pub expires_in: Option<u32>,

    /// Delete ALL files in the output directory and forget tracked avatars before generating
    #[arg(long)]
    pub cleanup_all: bool,

    /// Image set: set1 (robots), set2 (monsters), set3 (robot heads), set4 (kittens)
    #[arg(long, value_name = "SET")]
    pub set: Option<RobotSet>,

    /// Tracking store location [default: .avatar_expiry.json]
    #[arg(long, value_name = "PATH")]
    pub tracking_file: Option<PathBuf>,

    /// Image service root URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Config file to load instead of ~/.avatargen/config.json
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose (DEBUG) logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Layers CLI flags on top of the loaded configuration
fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(ref output) = cli.output {
        config.output_dir = output.clone();
    }
    if let Some(days) = cli.expires_in {
        config.expires_in_days = days;
    }
    if let Some(set) = cli.set {
        config.robot_set = set;
    }
    if let Some(ref tracking_file) = cli.tracking_file {
        config.tracking_file = tracking_file.clone();
    }
    if let Some(ref base_url) = cli.base_url {
        config.base_url = base_url.clone();
    }
    config
}

/// Runs one invocation: cleanup phase, then generation, then persist the store
pub async fn run(cli: Cli) -> Result<GenerationSummary> {
    let config = apply_cli_overrides(load_config(cli.config.clone())?, &cli);

    let source = RoboHashClient::new(&config.base_url, config.robot_set, config.timeout_secs)
        .context("Failed to set up the image service client")?;
    let output_dir = std::path::absolute(&config.output_dir).with_context(|| {
        format!("Failed to resolve output directory: {:?}", config.output_dir)
    })?;
    let tracking_file = std::path::absolute(&config.tracking_file).with_context(|| {
        format!("Failed to resolve tracking file: {:?}", config.tracking_file)
    })?;

    let generator = AvatarGenerator::new(&output_dir, config.expires_in_days);
    generator
        .expiry_from(Utc::now())
        .context("Invalid avatar lifetime")?;

    let mut tracker = ExpiryTracker::load(tracking_file).await;
    tracing::debug!(
        store = %tracker.store_path().display(),
        entries = tracker.len(),
        empty = tracker.is_empty(),
        "Tracking store ready"
    );

    if cli.cleanup_all {
        println!("Deleting all avatars in '{}'...", output_dir.display());
        let report = tracker.clear_all(&output_dir).await;
        println!(
            "Cleanup complete. Deleted: {}, Skipped/Errors: {}.",
            report.deleted, report.failed
        );
    } else {
        println!("Checking for expired avatars...");
        let report = tracker.sweep(Utc::now()).await;
        if report.pruned() == 0 {
            println!("No expired avatars found to delete.");
        } else {
            println!(
                "Cleanup complete. Deleted {} expired avatar(s), {} already missing, {} failed.",
                report.deleted, report.missing, report.failed
            );
        }
    }
    println!("{}", "-".repeat(50));

    if cli.number == 0 {
        println!("No avatars requested.");
    } else {
        println!(
            "Generating {} avatar(s) in directory '{}'...",
            cli.number,
            generator.output_dir().display()
        );
    }

    let summary = generator
        .generate_batch(&source, cli.number, &mut tracker, |done, total, result| {
            match result {
                Ok(path) => println!("[{}/{}] Saved {}", done, total, path.display()),
                Err(e) => println!("[{}/{}] Failed: {}", done, total, e),
            }
        })
        .await;

    // The avatars are already on disk, so a store write failure only costs future cleanup
    if let Err(e) = tracker.save().await {
        tracing::error!(store = %tracker.store_path().display(), "Failed to save tracking store: {}", e);
    }

    println!("{}", "-".repeat(50));
    println!(
        "Avatar generation complete. Generated: {}, Failed: {}",
        summary.generated(),
        summary.failed
    );

    Ok(summary)
}
