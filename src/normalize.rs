//! Text normalization for cross-catalog track matching.
//! Used by the ISRC resolver, the search scorer and the report.
//!
//! CRITICAL: `normalize` must stay idempotent. Every decoration pattern is
//! anchored on a word that the same pass removes, so a second pass has
//! nothing left to strip. Run the tests after touching the tables.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Anything that is not a letter, a combining mark, a digit or whitespace.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s]").unwrap());

/// Decoration phrases stripped after punctuation removal (applied in order).
pub static DECORATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "official music video", "music video", "video"
        Regex::new(r"(?i)\b(?:official\s+)?(?:music\s+)?video\b").unwrap(),
        // "official audio", "audio"
        Regex::new(r"(?i)\b(?:official\s+)?audio\b").unwrap(),
        // "official lyric video" (only reachable when "video" survived the first pattern)
        Regex::new(r"(?i)\b(?:official\s+)?lyric\s+video\b").unwrap(),
        Regex::new(r"(?i)\bofficial\b").unwrap(),
        Regex::new(r"(?i)\blyrics\b").unwrap(),
        Regex::new(r"(?i)\bremix\b").unwrap(),
        // "ver", "ver.", "version"
        Regex::new(r"(?i)\bver(?:\.|sion)?\b").unwrap(),
        Regex::new(r"(?i)\bremaster(?:ed)?\b").unwrap(),
    ]
});

/// Featured-artist segments, bracketed first and then inline.
pub static FEATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "(feat. X)", "(feat.X)", "[ft. X]", "(featuring X)", "(with X)"
        Regex::new(
            r"(?i)\s*[\(\[]\s*(?:(?:feat|ft)\.\s*|(?:feat|ft|featuring|with)\s+)[^\)\]]*[\)\]]",
        )
        .unwrap(),
        // "Song feat. X", "Song feat.X", "Song ft X", "Song with X" up to the next bracket.
        // Without a dot the keyword needs trailing whitespace, so "Without" survives.
        Regex::new(r"(?i)\s+(?:(?:feat|ft)\.\s*|(?:feat|ft|featuring|with)\s+)[^\(\)\[\]]*")
            .unwrap(),
    ]
});

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
/// Used to filter out accents during normalization.
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Latin diacritics via NFKD decomposition, then lowercase.
/// e.g., "Beyoncé" → "beyonce", "Motörhead" → "motorhead"
pub fn fold_diacritics(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.to_lowercase()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Canonicalize free-text metadata for comparison.
///
/// Lowercases, folds diacritics, turns punctuation into spaces, strips
/// decoration phrases ("official video", "remastered", ...) and collapses
/// whitespace. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let folded = fold_diacritics(text);
    let mut result = NON_WORD.replace_all(&folded, " ").into_owned();

    for pattern in DECORATION_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").into_owned();
    }

    collapse_whitespace(&result)
}

/// Remove featured-artist credits from a title.
///
/// Applied to raw titles (before `normalize`) when building search queries
/// and when comparing titles. Inline credits need a preceding word, so a
/// title that *starts* with "With" is left alone. If stripping would leave
/// nothing, the trimmed input is returned.
pub fn strip_featured_artists(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut result = trimmed.to_string();
    for pattern in FEATURE_PATTERNS.iter() {
        result = pattern.replace_all(&result, " ").into_owned();
    }

    let result = collapse_whitespace(&result);
    if result.is_empty() {
        collapse_whitespace(trimmed)
    } else {
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================
