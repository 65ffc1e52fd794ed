//! Free-text catalog search.

use tracing::{debug, warn};

use crate::catalog::CatalogApi;
use crate::models::CatalogSong;

/// Result limit for every text search
pub const SEARCH_LIMIT: usize = 10;

/// Join the non-empty fields with single spaces. URL encoding is left to the
/// transport.
pub fn build_query(title: &str, artist: &str, album: &str) -> String {
    [title, artist, album]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct CatalogSearcher<'a, C: CatalogApi + ?Sized> {
    catalog: &'a C,
    limit: usize,
}

impl<'a, C: CatalogApi + ?Sized> CatalogSearcher<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            limit: SEARCH_LIMIT,
        }
    }

    /// Raw candidates for one query. Never fails: transport errors and empty
    /// queries both yield an empty list.
    pub fn search(&self, title: &str, artist: &str, album: &str) -> Vec<CatalogSong> {
        let query = build_query(title, artist, album);
        if query.is_empty() {
            return Vec::new();
        }

        match self.catalog.search_songs(&query, self.limit) {
            Ok(songs) => {
                debug!(query = %query, results = songs.len(), "catalog search");
                songs
            }
            Err(err) => {
                warn!(query = %query, error = %err, "catalog search failed");
                Vec::new()
            }
        }
    }
}
