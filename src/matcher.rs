//! Track resolution: ISRC first, then degraded-specificity text search.
//!
//! Every search strategy is scored against the *original* record, never the
//! degraded query, so widening a query can raise recall without inflating
//! confidence.

use std::cmp::Ordering;

use tracing::debug;

use crate::catalog::CatalogApi;
use crate::isrc::IsrcResolver;
use crate::models::{Candidate, MatchDecision, MatchMethod, SourceRecord};
use crate::normalize::strip_featured_artists;
use crate::scoring::{score_candidate, HIGH_CONFIDENCE_THRESHOLD};
use crate::search::CatalogSearcher;

/// Candidates each strategy contributes to the alternatives pool
pub const POOL_PER_STRATEGY: usize = 4;

/// Alternatives kept next to a resolved match
pub const RESOLVED_ALTERNATIVES: usize = 3;

/// Alternatives kept for an unresolved record (best candidate included)
pub const UNRESOLVED_ALTERNATIVES: usize = 4;

// ============================================================================
// Search Strategies
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TitleForm {
    Full,
    WithoutFeatures,
}

/// Which record fields one search query carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchStrategy {
    pub title: TitleForm,
    pub artist: bool,
    pub album: bool,
}

impl SearchStrategy {
    const fn new(title: TitleForm, artist: bool, album: bool) -> Self {
        Self {
            title,
            artist,
            album,
        }
    }

    /// (title, artist, album) to send for this strategy.
    pub fn query_fields<'r>(
        &self,
        record: &'r SourceRecord,
        stripped_title: &'r str,
    ) -> (&'r str, &'r str, &'r str) {
        let title = match self.title {
            TitleForm::Full => record.title.as_str(),
            TitleForm::WithoutFeatures => stripped_title,
        };
        let artist = if self.artist { record.artist.as_str() } else { "" };
        let album = if self.album { record.album.as_str() } else { "" };
        (title, artist, album)
    }
}

/// Ordered from most to least specific.
pub const STRATEGIES: [SearchStrategy; 6] = [
    SearchStrategy::new(TitleForm::Full, true, true),
    SearchStrategy::new(TitleForm::WithoutFeatures, true, true),
    SearchStrategy::new(TitleForm::Full, true, false),
    SearchStrategy::new(TitleForm::WithoutFeatures, true, false),
    SearchStrategy::new(TitleForm::Full, false, true),
    SearchStrategy::new(TitleForm::WithoutFeatures, false, false),
];

// ============================================================================
// Match Engine
// ============================================================================

pub struct MatchEngine<'a, C: CatalogApi + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogApi + ?Sized> MatchEngine<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Resolve one record. Never fails; transport problems degrade to
    /// fewer candidates.
    pub fn resolve(&self, record: &SourceRecord) -> MatchDecision {
        if !record.isrc.trim().is_empty() {
            let resolver = IsrcResolver::new(self.catalog);
            if let Some(id) =
                resolver.resolve_by_isrc(&record.isrc, &record.album, &record.album_artist)
            {
                return MatchDecision::isrc(id);
            }
        }

        self.resolve_by_search(record)
    }

    fn resolve_by_search(&self, record: &SourceRecord) -> MatchDecision {
        let searcher = CatalogSearcher::new(self.catalog);
        let stripped_title = strip_featured_artists(&record.title);

        let mut best_overall: Option<Candidate> = None;
        let mut pool: Vec<Candidate> = Vec::new();

        for (index, strategy) in STRATEGIES.iter().enumerate() {
            let (title, artist, album) = strategy.query_fields(record, &stripped_title);
            let raw = searcher.search(title, artist, album);
            if raw.is_empty() {
                continue;
            }

            let mut scored: Vec<Candidate> =
                raw.iter().map(|song| score_candidate(record, song)).collect();
            sort_by_score(&mut scored);

            debug!(
                strategy = index + 1,
                candidates = scored.len(),
                top_score = scored[0].composite_score,
                "strategy scored"
            );

            let improves = best_overall
                .as_ref()
                .map_or(true, |best| scored[0].composite_score > best.composite_score);
            if improves {
                best_overall = Some(scored[0].clone());
            }

            for candidate in scored.into_iter().take(POOL_PER_STRATEGY) {
                if !pool.iter().any(|seen| seen.catalog_id == candidate.catalog_id) {
                    pool.push(candidate);
                }
            }
        }

        decide(best_overall, pool)
    }
}

/// Turn the best candidate and the alternatives pool into a decision.
pub fn decide(best: Option<Candidate>, mut pool: Vec<Candidate>) -> MatchDecision {
    let Some(best) = best else {
        return MatchDecision::unresolved();
    };

    sort_by_score(&mut pool);
    let others: Vec<Candidate> = pool
        .into_iter()
        .filter(|candidate| candidate.catalog_id != best.catalog_id)
        .collect();

    if best.composite_score >= HIGH_CONFIDENCE_THRESHOLD {
        MatchDecision {
            resolved_id: Some(best.catalog_id),
            confidence: best.composite_score,
            method: MatchMethod::HighConfidenceSearch,
            alternatives: others.into_iter().take(RESOLVED_ALTERNATIVES).collect(),
        }
    } else {
        let confidence = best.composite_score;
        let mut alternatives = Vec::with_capacity(UNRESOLVED_ALTERNATIVES);
        alternatives.push(best);
        alternatives.extend(others.into_iter().take(UNRESOLVED_ALTERNATIVES - 1));
        MatchDecision {
            resolved_id: None,
            confidence,
            method: MatchMethod::LowConfidence,
            alternatives,
        }
    }
}

/// Highest score first; ties keep their original order.
fn sort_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(Ordering::Equal)
    });
}
