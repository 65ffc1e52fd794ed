//! Exact-family matching by International Standard Recording Code.
//!
//! One ISRC can map to several catalog entries (single, album, compilation,
//! regional re-release). A result is accepted only when its album and artist
//! corroborate the source record; the first acceptable result in endpoint
//! order wins.

use tracing::{debug, warn};

use crate::catalog::CatalogApi;
use crate::normalize::normalize;
use crate::scoring::{isrc_candidate_accepted, similarity};

pub struct IsrcResolver<'a, C: CatalogApi + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogApi + ?Sized> IsrcResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Catalog id of the first ISRC result whose album/artist corroborate
    /// `album` and `album_artist`, or `None`.
    ///
    /// Transport failures are logged and reported as `None`; retrying is the
    /// transport's business.
    pub fn resolve_by_isrc(&self, isrc: &str, album: &str, album_artist: &str) -> Option<String> {
        let isrc = isrc.trim();
        if isrc.is_empty() {
            return None;
        }

        let results = match self.catalog.songs_by_isrc(isrc) {
            Ok(results) => results,
            Err(err) => {
                warn!(isrc, error = %err, "ISRC lookup failed");
                return None;
            }
        };
        if results.is_empty() {
            debug!(isrc, "ISRC lookup returned no results");
            return None;
        }

        let album_norm = normalize(album);
        for song in results {
            let album_score = similarity(&song.album, album);
            let artist_score = similarity(&song.artist, album_artist);
            let exact_album = normalize(&song.album) == album_norm;

            if isrc_candidate_accepted(album_score, artist_score, exact_album) {
                debug!(
                    isrc,
                    id = %song.id,
                    album_score,
                    artist_score,
                    exact_album,
                    "ISRC candidate accepted"
                );
                return Some(song.id);
            }
        }

        debug!(isrc, "no ISRC candidate corroborated album/artist");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{song, FakeCatalog};

    const ISRC: &str = "USABC1234567";

    #[test]
    fn test_empty_isrc_fails_fast() {
        let catalog = FakeCatalog::new();
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(resolver.resolve_by_isrc("", "Album", "Band"), None);
        assert_eq!(resolver.resolve_by_isrc("   ", "Album", "Band"), None);
        assert!(catalog.isrc_calls.borrow().is_empty());
    }

    #[test]
    fn test_zero_results_is_none() {
        let catalog = FakeCatalog::new();
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(resolver.resolve_by_isrc(ISRC, "Album", "Band"), None);
        assert_eq!(catalog.isrc_calls.borrow().len(), 1);
    }

    #[test]
    fn test_exact_album_rule_ignores_artist() {
        // Album matches after normalization, artist similarity is poor
        let catalog = FakeCatalog::new().with_isrc(
            ISRC,
            vec![song("100", "Song", "Completely Other", "The Album (Remastered)")],
        );
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(
            resolver.resolve_by_isrc(ISRC, "The Album", "Band"),
            Some("100".to_string())
        );
    }

    #[test]
    fn test_first_acceptable_result_wins() {
        let catalog = FakeCatalog::new().with_isrc(
            ISRC,
            vec![
                song("1", "Song", "Nobody", "Greatest Hits Vol 9"),
                song("2", "Song", "Band", "Album"),
                song("3", "Song", "Band", "Album"),
            ],
        );
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(
            resolver.resolve_by_isrc(ISRC, "Album", "Band"),
            Some("2".to_string())
        );
    }

    #[test]
    fn test_uncorroborated_results_are_rejected() {
        let catalog = FakeCatalog::new().with_isrc(
            ISRC,
            vec![song("1", "Song", "Karaoke Stars", "Party Hits 2020")],
        );
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(resolver.resolve_by_isrc(ISRC, "Album", "Band"), None);
    }

    #[test]
    fn test_missing_album_on_both_sides_counts_as_exact() {
        let catalog = FakeCatalog::new().with_isrc(ISRC, vec![song("1", "Song", "Other", "")]);
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(resolver.resolve_by_isrc(ISRC, "", "Band"), Some("1".to_string()));
    }

    #[test]
    fn test_transport_failure_is_none() {
        let catalog = FakeCatalog::new().with_isrc_status(500);
        let resolver = IsrcResolver::new(&catalog);
        assert_eq!(resolver.resolve_by_isrc(ISRC, "Album", "Band"), None);
    }
}
