//! Scoring functions for catalog matching.
//!
//! This module contains:
//! - Field similarity (normalized edit distance over normalized text)
//! - Weighted composite score for search candidates
//! - Acceptance rules for ISRC lookup results

use crate::models::{Candidate, CatalogSong, FieldScores, SourceRecord};
use crate::normalize::{normalize, strip_featured_artists};

// ============================================================================
// Score Thresholds
// ============================================================================

/// Minimum composite score for a search candidate to be resolved
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

pub const TITLE_WEIGHT: f64 = 0.5;
pub const ARTIST_WEIGHT: f64 = 0.3;
pub const ALBUM_WEIGHT: f64 = 0.2;

// ============================================================================
// Field Similarity
// ============================================================================

/// Similarity of two strings in `[0, 1]` after normalization.
///
/// Symmetric. Returns 0.0 when either side is empty, including when
/// normalization strips it down to nothing (e.g. "Official Video").
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_norm = normalize(a);
    let b_norm = normalize(b);
    if a_norm.is_empty() || b_norm.is_empty() {
        return 0.0;
    }
    if a_norm == b_norm {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a_norm, &b_norm)
}

/// Weighted blend: title is the strongest discriminator, album the weakest
/// (albums drift between singles, deluxe editions and compilations).
pub fn composite_score(title_sim: f64, artist_sim: f64, album_sim: f64) -> f64 {
    let score = TITLE_WEIGHT * title_sim + ARTIST_WEIGHT * artist_sim + ALBUM_WEIGHT * album_sim;
    score.clamp(0.0, 1.0)
}

/// Score every field of a catalog song against the source record.
/// Titles are compared with featured-artist credits removed on both sides.
pub fn score_fields(record: &SourceRecord, song: &CatalogSong) -> FieldScores {
    FieldScores {
        title: similarity(
            &strip_featured_artists(&record.title),
            &strip_featured_artists(&song.name),
        ),
        artist: similarity(&record.artist, &song.artist),
        album: similarity(&record.album, &song.album),
    }
}

/// Turn a raw catalog song into a scored candidate.
pub fn score_candidate(record: &SourceRecord, song: &CatalogSong) -> Candidate {
    let field_scores = score_fields(record, song);
    Candidate {
        catalog_id: song.id.clone(),
        title: song.name.clone(),
        artist: song.artist.clone(),
        album: song.album.clone(),
        composite_score: composite_score(
            field_scores.title,
            field_scores.artist,
            field_scores.album,
        ),
        field_scores,
    }
}

// ============================================================================
// ISRC Acceptance
// ============================================================================

/// Whether an ISRC lookup result belongs to the same release family.
///
/// Any of:
/// - both album and artist above 0.8
/// - album above 0.9 with artist above 0.6
/// - artist above 0.9 with album above 0.6
/// - normalized album names identical, whatever the artist score
pub fn isrc_candidate_accepted(album_score: f64, artist_score: f64, exact_album: bool) -> bool {
    (album_score > 0.8 && artist_score > 0.8)
        || (album_score > 0.9 && artist_score > 0.6)
        || (artist_score > 0.9 && album_score > 0.6)
        || exact_album
}
