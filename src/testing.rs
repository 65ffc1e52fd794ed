//! In-memory catalog used by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::catalog::{CatalogApi, CollectionApi};
use crate::error::CatalogError;
use crate::models::CatalogSong;

pub fn song(id: &str, name: &str, artist: &str, album: &str) -> CatalogSong {
    CatalogSong {
        id: id.to_string(),
        name: name.to_string(),
        artist: artist.to_string(),
        album: album.to_string(),
    }
}

/// Fake catalog keyed by exact search term / ISRC, recording every call.
#[derive(Default)]
pub struct FakeCatalog {
    search_results: HashMap<String, Vec<CatalogSong>>,
    failing_terms: HashSet<String>,
    isrc_results: HashMap<String, Vec<CatalogSong>>,
    isrc_status: Option<u16>,
    equivalents: HashMap<String, String>,
    failing_equivalents: bool,
    playlists: RefCell<Vec<(String, String)>>,
    playlist_members: HashMap<String, Vec<String>>,
    insert_status: Option<u16>,

    pub search_calls: RefCell<Vec<String>>,
    pub isrc_calls: RefCell<Vec<String>>,
    pub equivalent_calls: RefCell<Vec<String>>,
    pub insert_calls: RefCell<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: &str, songs: Vec<CatalogSong>) -> Self {
        self.search_results.insert(term.to_string(), songs);
        self
    }

    pub fn with_failing_search(mut self, term: &str) -> Self {
        self.failing_terms.insert(term.to_string());
        self
    }

    pub fn with_isrc(mut self, isrc: &str, songs: Vec<CatalogSong>) -> Self {
        self.isrc_results.insert(isrc.to_string(), songs);
        self
    }

    pub fn with_isrc_status(mut self, status: u16) -> Self {
        self.isrc_status = Some(status);
        self
    }

    pub fn with_equivalent(mut self, from: &str, to: &str) -> Self {
        self.equivalents.insert(from.to_string(), to.to_string());
        self
    }

    pub fn with_failing_equivalents(mut self) -> Self {
        self.failing_equivalents = true;
        self
    }

    pub fn with_playlist(mut self, name: &str, id: &str, members: &[&str]) -> Self {
        self.playlists
            .get_mut()
            .push((name.to_string(), id.to_string()));
        self.playlist_members.insert(
            id.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn rejecting_inserts(mut self, status: u16) -> Self {
        self.insert_status = Some(status);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls.borrow().len()
            + self.isrc_calls.borrow().len()
            + self.equivalent_calls.borrow().len()
            + self.insert_calls.borrow().len()
    }

    fn record_insert(&self, label: String) -> Result<(), CatalogError> {
        self.insert_calls.borrow_mut().push(label);
        match self.insert_status {
            Some(status) => Err(CatalogError::from_status(status)),
            None => Ok(()),
        }
    }
}

impl CatalogApi for FakeCatalog {
    fn search_songs(&self, term: &str, limit: usize) -> Result<Vec<CatalogSong>, CatalogError> {
        self.search_calls.borrow_mut().push(term.to_string());
        if self.failing_terms.contains(term) {
            return Err(CatalogError::Transport("connection reset".to_string()));
        }
        Ok(self
            .search_results
            .get(term)
            .map(|songs| songs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn songs_by_isrc(&self, isrc: &str) -> Result<Vec<CatalogSong>, CatalogError> {
        self.isrc_calls.borrow_mut().push(isrc.to_string());
        if let Some(status) = self.isrc_status {
            return Err(CatalogError::from_status(status));
        }
        Ok(self.isrc_results.get(isrc).cloned().unwrap_or_default())
    }

    fn equivalent_song_id(&self, song_id: &str) -> Result<Option<String>, CatalogError> {
        self.equivalent_calls.borrow_mut().push(song_id.to_string());
        if self.failing_equivalents {
            return Err(CatalogError::Transport("connection reset".to_string()));
        }
        Ok(self.equivalents.get(song_id).cloned())
    }
}

impl CollectionApi for FakeCatalog {
    fn find_or_create_playlist(&self, name: &str) -> Result<String, CatalogError> {
        let mut playlists = self.playlists.borrow_mut();
        if let Some((_, id)) = playlists.iter().find(|(existing, _)| existing == name) {
            return Ok(id.clone());
        }
        let id = format!("p.{}", playlists.len() + 1);
        playlists.push((name.to_string(), id.clone()));
        Ok(id)
    }

    fn playlist_catalog_ids(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .playlist_members
            .get(playlist_id)
            .cloned()
            .unwrap_or_default())
    }

    fn add_to_playlist(&self, playlist_id: &str, song_id: &str) -> Result<(), CatalogError> {
        self.record_insert(format!("playlist:{}:{}", playlist_id, song_id))
    }

    fn like_song(&self, song_id: &str) -> Result<(), CatalogError> {
        self.record_insert(format!("like:{}", song_id))
    }

    fn add_to_library(&self, song_id: &str) -> Result<(), CatalogError> {
        self.record_insert(format!("library:{}", song_id))
    }
}
