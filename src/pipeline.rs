//! Per-file run loop: ingest, destination setup, resolve, insert, report.
//!
//! Records are processed strictly one at a time; the membership set is owned
//! here and lent to the insertion coordinator for each record.

use anyhow::{anyhow, bail, Context, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

use crate::catalog::{CatalogApi, CollectionApi, Destination};
use crate::error::CatalogError;
use crate::ingest::{read_records, EXPORT_TOOL_URL};
use crate::insertion::{InsertOutcome, InsertionCoordinator, Membership};
use crate::matcher::MatchEngine;
use crate::models::{Classification, FailedTrack, FailureReason, InsertMode, RunStats, SourceRecord};
use crate::progress::{create_progress_bar, create_spinner, log_progress};
use crate::report::write_report;

/// Progress message width, in characters
const LABEL_WIDTH: usize = 60;

/// Log-only progress interval, in records
const LOG_INTERVAL: u64 = 25;

#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    pub mode: InsertMode,
    /// Resolve and report only; no destination calls
    pub dry_run: bool,
}

/// Everything one input file produced.
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub stats: RunStats,
    pub failed: Vec<FailedTrack>,
    pub report: Option<PathBuf>,
}

// ============================================================================
// Inputs
// ============================================================================

/// The CSV at `input`, or every `.csv` directly inside it in sorted order.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input '{}' does not exist", input.display());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)
        .with_context(|| format!("Failed to read directory {}", input.display()))?
    {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        bail!("No .csv files found in {}", input.display());
    }
    Ok(files)
}

/// Playlist name for an export: file name up to the first '.', underscores
/// as spaces, first letter upper-cased and the rest lower-cased.
pub fn playlist_name_from_path(path: &Path) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let base = file_name.split('.').next().unwrap_or("").replace('_', " ");

    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Destination Setup
// ============================================================================

fn authorization_error(err: CatalogError) -> anyhow::Error {
    anyhow::Error::new(err).context(
        "Apple Music rejected the credentials. Refresh token.dat, \
media_user_token.dat and cookies.dat and try again.",
    )
}

/// Whether `err` came from rejected credentials, which dooms every later file.
pub fn is_authorization_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CatalogError>()
        .map_or(false, CatalogError::is_authorization_failure)
}

/// Resolve the destination for `mode` and load its current membership.
///
/// Like and library modes have no membership listing and start empty.
pub fn prepare_destination<C: CollectionApi + ?Sized>(
    client: &C,
    mode: InsertMode,
    playlist_name: &str,
) -> Result<(Destination, Membership)> {
    match mode {
        InsertMode::Like => Ok((Destination::Likes, Membership::new())),
        InsertMode::Library => Ok((Destination::Library, Membership::new())),
        InsertMode::Playlist => {
            let id = client.find_or_create_playlist(playlist_name).map_err(|err| {
                if err.is_authorization_failure() {
                    authorization_error(err)
                } else {
                    anyhow!("Failed to create playlist '{}': {}", playlist_name, err)
                }
            })?;

            let membership = match client.playlist_catalog_ids(&id) {
                Ok(ids) => Membership::from_ids(ids),
                Err(err) if err.is_authorization_failure() => {
                    return Err(authorization_error(err))
                }
                Err(err) => {
                    warn!(playlist = %id, error = %err, "could not load playlist tracks, assuming empty");
                    Membership::new()
                }
            };

            Ok((Destination::Playlist { id }, membership))
        }
    }
}

// ============================================================================
// Record Loop
// ============================================================================

/// Resolve and insert every record. `destination` is `None` in dry-run mode,
/// where resolved records count as inserted.
///
/// Stops with an error on the first rejected-credentials insertion.
pub fn process_records<C: CatalogApi + CollectionApi + ?Sized>(
    client: &C,
    records: &[SourceRecord],
    destination: Option<&Destination>,
    membership: &mut Membership,
    pb: &ProgressBar,
) -> Result<FileOutcome> {
    let engine = MatchEngine::new(client);
    let coordinator = destination.map(|dest| InsertionCoordinator::new(client, dest));

    let mut outcome = FileOutcome::default();
    outcome.stats.total_records = records.len();
    let total = records.len() as u64;

    for (i, record) in records.iter().enumerate() {
        pb.set_message(record.display_label(LABEL_WIDTH));

        let decision = engine.resolve(record);
        outcome.stats.record_decision(&decision);

        match decision.resolved_id.as_deref() {
            Some(resolved_id) => {
                let classification = match &coordinator {
                    None => Classification::Ok,
                    Some(coordinator) => {
                        let inserted = coordinator.insert(resolved_id, membership);
                        let classification = inserted.classification();
                        if let InsertOutcome::Error { song_id, error } = inserted {
                            if error.is_authorization_failure() {
                                pb.abandon();
                                return Err(authorization_error(error));
                            }
                            outcome.failed.push(FailedTrack {
                                record: record.clone(),
                                reason: FailureReason::InsertFailed {
                                    song_id,
                                    message: error.to_string(),
                                },
                                alternatives: Vec::new(),
                            });
                        }
                        classification
                    }
                };
                outcome.stats.record_classification(classification);
            }
            None => outcome.failed.push(FailedTrack {
                record: record.clone(),
                reason: FailureReason::Unresolved {
                    best_confidence: decision.confidence,
                },
                alternatives: decision.alternatives,
            }),
        }

        pb.inc(1);
        log_progress("tracks", i as u64 + 1, total, LOG_INTERVAL);
    }

    pb.finish_with_message("done");
    Ok(outcome)
}

/// Run one input file end to end.
pub fn process_file<C: CatalogApi + CollectionApi + ?Sized>(
    client: &C,
    path: &Path,
    options: RunOptions,
    storefront: &str,
) -> Result<FileOutcome> {
    let start = Instant::now();

    let records = read_records(path).with_context(|| {
        format!(
            "{} is not a usable playlist export (download CSV files from {})",
            path.display(),
            EXPORT_TOOL_URL
        )
    })?;

    let (destination, mut membership) = if options.dry_run {
        (None, Membership::new())
    } else {
        let name = playlist_name_from_path(path);
        let spinner = create_spinner(&format!("Preparing {:?} destination", options.mode));
        let prepared = prepare_destination(client, options.mode, &name);
        spinner.finish_and_clear();
        let (destination, membership) = prepared?;
        if let Destination::Playlist { id } = &destination {
            println!(
                "Playlist '{}' ({}) has {} tracks",
                name,
                id,
                membership.len()
            );
        }
        (Some(destination), membership)
    };

    let pb = create_progress_bar(records.len() as u64, "Starting...");
    let mut outcome = process_records(
        client,
        &records,
        destination.as_ref(),
        &mut membership,
        &pb,
    )?;
    outcome.stats.elapsed_seconds = start.elapsed().as_secs_f64();

    if !outcome.failed.is_empty() {
        outcome.report = Some(write_report(path, &outcome.failed, storefront)?);
    }

    Ok(outcome)
}
