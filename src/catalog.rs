//! Catalog and collection abstractions consumed by the matching engine.
//!
//! The engine only talks to these traits; `apple_music` provides the real
//! implementation and tests substitute an in-memory fake.

use crate::error::CatalogError;
use crate::models::{CatalogSong, InsertMode};

/// Read-only lookups against the destination catalog.
pub trait CatalogApi {
    /// Public text search, at most `limit` songs in endpoint order.
    fn search_songs(&self, term: &str, limit: usize) -> Result<Vec<CatalogSong>, CatalogError>;

    /// Songs carrying the given ISRC in the configured storefront.
    fn songs_by_isrc(&self, isrc: &str) -> Result<Vec<CatalogSong>, CatalogError>;

    /// Storefront-equivalent id for `song_id`, if the catalog exposes one.
    fn equivalent_song_id(&self, song_id: &str) -> Result<Option<String>, CatalogError>;
}

/// Mutating operations on the user's library.
pub trait CollectionApi {
    /// Id of the library playlist called `name`, creating it when absent.
    fn find_or_create_playlist(&self, name: &str) -> Result<String, CatalogError>;

    /// Catalog ids of every track currently in the playlist.
    fn playlist_catalog_ids(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError>;

    fn add_to_playlist(&self, playlist_id: &str, song_id: &str) -> Result<(), CatalogError>;

    fn like_song(&self, song_id: &str) -> Result<(), CatalogError>;

    fn add_to_library(&self, song_id: &str) -> Result<(), CatalogError>;
}

/// Resolved insertion target for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Playlist { id: String },
    Likes,
    Library,
}

impl Destination {
    pub fn mode(&self) -> InsertMode {
        match self {
            Destination::Playlist { .. } => InsertMode::Playlist,
            Destination::Likes => InsertMode::Like,
            Destination::Library => InsertMode::Library,
        }
    }

    /// Issue the single insertion call this destination needs.
    pub fn insert<C: CollectionApi + ?Sized>(
        &self,
        api: &C,
        song_id: &str,
    ) -> Result<(), CatalogError> {
        match self {
            Destination::Playlist { id } => api.add_to_playlist(id, song_id),
            Destination::Likes => api.like_song(song_id),
            Destination::Library => api.add_to_library(song_id),
        }
    }
}
