use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use playlist_transfer::apple_music::AppleMusicClient;
use playlist_transfer::config::SessionConfig;
use playlist_transfer::models::{InsertMode, RunStats};
use playlist_transfer::pipeline::{collect_inputs, is_authorization_error, process_file, RunOptions};
use playlist_transfer::progress::{format_duration, init_tracing, is_log_only, set_log_only};

#[derive(Parser)]
#[command(name = "playlist-transfer")]
#[command(about = "Transfer Exportify playlist exports into Apple Music")]
struct Args {
    /// Exportify CSV file, or a directory of them
    input: PathBuf,

    /// What to do with each matched track
    #[arg(long, value_enum, default_value = "playlist")]
    mode: InsertMode,

    /// Directory holding token.dat, media_user_token.dat, cookies.dat, country_code.dat
    #[arg(long, default_value = ".")]
    credentials_dir: PathBuf,

    /// Storefront country code, overriding country_code.dat
    #[arg(long)]
    storefront: Option<String>,

    /// Resolve tracks and write reports without touching the library
    #[arg(long)]
    dry_run: bool,

    /// Hide progress bars and log periodic progress lines instead
    #[arg(long)]
    log_only: bool,

    /// Write run statistics as JSON to this file
    #[arg(long)]
    stats: Option<PathBuf>,
}

fn print_summary(stats: &RunStats, mode: InsertMode, dry_run: bool) {
    println!("\n{:=<60}", "");
    println!("Transfer complete!");
    println!("  Total tracks: {}", stats.total_records);
    println!("  Successfully processed: {}", stats.inserted);
    println!("  Already present: {}", stats.duplicates);
    println!("  Failed: {}", stats.failed());
    println!(
        "  Matched by ISRC / search: {} / {}",
        stats.isrc_matches, stats.search_matches
    );
    println!("  Success rate: {:.1}%", stats.success_rate());
    if dry_run {
        println!("  Dry run: nothing was {}", mode.action_label());
    } else {
        println!("  Tracks were {}", mode.action_label());
    }
    println!(
        "  Elapsed: {}",
        format_duration(std::time::Duration::from_secs_f64(stats.elapsed_seconds))
    );
    println!("{:=<60}", "");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    set_log_only(args.log_only);

    let start = Instant::now();
    let files = collect_inputs(&args.input)?;

    let config = SessionConfig::load(&args.credentials_dir, args.storefront.as_deref())
        .context("Failed to load Apple Music credentials")?;
    let client = AppleMusicClient::new(config);
    let storefront = client.storefront().to_string();

    let options = RunOptions {
        mode: args.mode,
        dry_run: args.dry_run,
    };

    let mut totals = RunStats::default();
    let mut skipped = 0usize;

    for file in &files {
        println!("\nProcessing {}", file.display());

        let outcome = match process_file(&client, file, options, &storefront) {
            Ok(outcome) => outcome,
            Err(err) if is_authorization_error(&err) => return Err(err),
            Err(err) if files.len() > 1 => {
                eprintln!("Skipping {}: {:#}", file.display(), err);
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        if is_log_only() {
            outcome.stats.log_phase(&file.display().to_string());
        }
        if let Some(report) = &outcome.report {
            println!(
                "{} tracks need attention, see {}",
                outcome.failed.len(),
                report.display()
            );
        }
        totals.merge(&outcome.stats);
    }

    totals.elapsed_seconds = start.elapsed().as_secs_f64();
    print_summary(&totals, args.mode, args.dry_run);
    if skipped > 0 {
        println!("Skipped {} of {} files", skipped, files.len());
    }

    if let Some(path) = &args.stats {
        totals
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    Ok(())
}
