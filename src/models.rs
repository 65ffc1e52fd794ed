//! Core data models for track resolution and insertion.
//!
//! This module contains the record, candidate and decision types that flow
//! through the matching pipeline, plus the per-run statistics.

use clap::ValueEnum;
use serde::Serialize;

// ============================================================================
// Input Models
// ============================================================================

/// One row of a source playlist export. Plain text, not yet normalized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub isrc: String,
}

impl SourceRecord {
    /// "Title by Artist", truncated for progress-bar messages.
    pub fn display_label(&self, max_chars: usize) -> String {
        let label = if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} by {}", self.title, self.artist)
        };
        if label.chars().count() <= max_chars {
            return label;
        }
        let keep = max_chars.saturating_sub(3);
        let mut truncated: String = label.chars().take(keep).collect();
        truncated.push_str("...");
        truncated
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

/// Raw catalog entry as returned by a search or ISRC lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSong {
    pub id: String,     // Destination catalog id (e.g., "1440857781")
    pub name: String,   // Track title as the catalog spells it
    pub artist: String, // Credited artist string
    pub album: String,  // Album / collection name
}

/// Per-field similarity of a candidate against the source record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FieldScores {
    pub title: f64,
    pub artist: f64,
    pub album: f64,
}

/// Scored search candidate. Lives only for one `MatchEngine::resolve` call,
/// except when carried out as an alternative.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub catalog_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub field_scores: FieldScores,
    pub composite_score: f64, // 0.0..=1.0
}

// ============================================================================
// Decision Models
// ============================================================================

/// How a decision was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    /// ISRC lookup with corroborating album/artist similarity
    Isrc,
    /// Text search, best composite score at or above the threshold
    HighConfidenceSearch,
    /// Nothing reached the threshold; no id resolved
    LowConfidence,
}

/// The matching engine's sole output per record.
///
/// `alternatives` never holds more than four entries. For a high-confidence
/// search it excludes the resolved candidate; for a low-confidence outcome it
/// includes the best candidate seen.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchDecision {
    pub resolved_id: Option<String>,
    pub confidence: f64,
    pub method: MatchMethod,
    pub alternatives: Vec<Candidate>,
}

impl MatchDecision {
    /// Authoritative ISRC match.
    pub fn isrc(catalog_id: String) -> Self {
        Self {
            resolved_id: Some(catalog_id),
            confidence: 1.0,
            method: MatchMethod::Isrc,
            alternatives: Vec::new(),
        }
    }

    /// No candidates at all.
    pub fn unresolved() -> Self {
        Self {
            resolved_id: None,
            confidence: 0.0,
            method: MatchMethod::LowConfidence,
            alternatives: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_id.is_some()
    }
}

// ============================================================================
// Insertion Models
// ============================================================================

/// Which destination collection the run writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Add to a library playlist named after the input file
    Playlist,
    /// Rate each track as loved
    Like,
    /// Add each track to the library
    Library,
}

impl InsertMode {
    /// Past-tense action for the run summary.
    pub fn action_label(self) -> &'static str {
        match self {
            InsertMode::Playlist => "added to playlist",
            InsertMode::Like => "liked",
            InsertMode::Library => "added to library",
        }
    }
}

/// Final per-record classification handed to the reporting side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Ok,
    Duplicate,
    Error,
}

// ============================================================================
// Failure Tracking
// ============================================================================

/// Why a record ended up in the failure report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FailureReason {
    /// Resolution finished below the confidence threshold (or found nothing)
    Unresolved { best_confidence: f64 },
    /// Resolved, but the destination did not accept the insertion
    InsertFailed { song_id: String, message: String },
}

/// Entry for the failure report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedTrack {
    pub record: SourceRecord,
    pub reason: FailureReason,
    pub alternatives: Vec<Candidate>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, serialized for `--stats` and `[STATS:*]` log lines.
#[derive(Default, Debug, Clone, Serialize)]
pub struct RunStats {
    pub total_records: usize,

    // Resolution
    pub isrc_matches: usize,
    pub search_matches: usize,
    pub unresolved: usize,

    // Insertion
    pub inserted: usize,
    pub duplicates: usize,
    pub insert_errors: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl RunStats {
    /// Records that ended OK, as a percentage of all records
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            100.0 * self.inserted as f64 / self.total_records as f64
        }
    }

    /// Records that ended neither OK nor DUPLICATE
    pub fn failed(&self) -> usize {
        self.unresolved + self.insert_errors
    }

    /// Count how a decision was reached
    pub fn record_decision(&mut self, decision: &MatchDecision) {
        match (decision.method, decision.is_resolved()) {
            (MatchMethod::Isrc, _) => self.isrc_matches += 1,
            (MatchMethod::HighConfidenceSearch, true) => self.search_matches += 1,
            _ => self.unresolved += 1,
        }
    }

    /// Count the insertion outcome of a resolved record
    pub fn record_classification(&mut self, classification: Classification) {
        match classification {
            Classification::Ok => self.inserted += 1,
            Classification::Duplicate => self.duplicates += 1,
            Classification::Error => self.insert_errors += 1,
        }
    }

    /// Fold another file's counters into this one
    pub fn merge(&mut self, other: &RunStats) {
        self.total_records += other.total_records;
        self.isrc_matches += other.isrc_matches;
        self.search_matches += other.search_matches;
        self.unresolved += other.unresolved;
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.insert_errors += other.insert_errors;
        self.elapsed_seconds += other.elapsed_seconds;
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
