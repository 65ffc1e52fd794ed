//! Apple Music transport: public iTunes search plus the authenticated
//! catalog/library API, over a blocking `ureq` agent.
//!
//! URL building and response decoding are plain functions so they can be
//! tested without a network.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::catalog::{CatalogApi, CollectionApi};
use crate::config::SessionConfig;
use crate::error::CatalogError;
use crate::models::CatalogSong;

pub const WEB_ORIGIN: &str = "https://music.apple.com";

/// Description given to playlists this tool creates
pub const PLAYLIST_DESCRIPTION: &str = "Created by playlist-transfer";

/// Statuses the library API uses for a successful write
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

// ============================================================================
// URL Builders
// ============================================================================

pub fn search_url(search_base: &str, storefront: &str, term: &str, limit: usize) -> String {
    format!(
        "{}/search?country={}&media=music&entity=song&limit={}&term={}",
        search_base.trim_end_matches('/'),
        storefront,
        limit,
        urlencoding::encode(term)
    )
}

pub fn isrc_url(api_base: &str, storefront: &str, isrc: &str) -> String {
    format!(
        "{}/v1/catalog/{}/songs?filter[isrc]={}",
        api_base.trim_end_matches('/'),
        storefront,
        urlencoding::encode(isrc)
    )
}

pub fn equivalents_url(api_base: &str, storefront: &str, song_id: &str) -> String {
    format!(
        "{}/v1/catalog/{}/songs?filter[equivalents]={}",
        api_base.trim_end_matches('/'),
        storefront,
        urlencoding::encode(song_id)
    )
}

pub fn library_playlists_url(api_base: &str) -> String {
    format!("{}/v1/me/library/playlists", api_base.trim_end_matches('/'))
}

pub fn playlist_tracks_url(api_base: &str, playlist_id: &str) -> String {
    format!(
        "{}/v1/me/library/playlists/{}/tracks",
        api_base.trim_end_matches('/'),
        urlencoding::encode(playlist_id)
    )
}

pub fn rating_url(api_base: &str, song_id: &str) -> String {
    format!(
        "{}/v1/me/ratings/songs/{}",
        api_base.trim_end_matches('/'),
        urlencoding::encode(song_id)
    )
}

pub fn library_url(api_base: &str) -> String {
    format!("{}/v1/me/library", api_base.trim_end_matches('/'))
}

/// Absolute URL for a pagination `next` link (the API returns paths).
pub fn resolve_next(api_base: &str, next: &str) -> String {
    if next.starts_with("http://") || next.starts_with("https://") {
        next.to_string()
    } else {
        format!(
            "{}/{}",
            api_base.trim_end_matches('/'),
            next.trim_start_matches('/')
        )
    }
}

// ============================================================================
// Response Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    track_id: Option<u64>,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    collection_name: String,
}

/// `{"data": [...], "next": "..."}` envelope used by the authenticated API.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SongResource {
    id: String,
    #[serde(default)]
    attributes: SongAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SongAttributes {
    name: String,
    artist_name: String,
    album_name: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    id: String,
    #[serde(default)]
    attributes: PlaylistAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlaylistAttributes {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LibraryTrackResource {
    #[serde(default)]
    attributes: LibraryTrackAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LibraryTrackAttributes {
    play_params: Option<PlayParams>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayParams {
    catalog_id: Option<String>,
}

// ============================================================================
// Decoders
// ============================================================================

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, CatalogError> {
    serde_json::from_str(body).map_err(|err| CatalogError::Decode(err.to_string()))
}

/// iTunes search results, in endpoint order. Entries without a track id are
/// skipped.
pub fn decode_search(body: &str) -> Result<Vec<CatalogSong>, CatalogError> {
    let response: SearchResponse = decode(body)?;
    Ok(response
        .results
        .into_iter()
        .filter_map(|result| {
            Some(CatalogSong {
                id: result.track_id?.to_string(),
                name: result.track_name,
                artist: result.artist_name,
                album: result.collection_name,
            })
        })
        .collect())
}

/// Catalog song resources (ISRC and equivalents lookups).
pub fn decode_songs(body: &str) -> Result<Vec<CatalogSong>, CatalogError> {
    let page: Page<SongResource> = decode(body)?;
    Ok(page
        .data
        .into_iter()
        .map(|song| CatalogSong {
            id: song.id,
            name: song.attributes.name,
            artist: song.attributes.artist_name,
            album: song.attributes.album_name,
        })
        .collect())
}

/// (id, name) of every playlist on one page, plus the next page link.
pub fn decode_playlists(body: &str) -> Result<(Vec<(String, String)>, Option<String>), CatalogError> {
    let page: Page<PlaylistResource> = decode(body)?;
    let playlists = page
        .data
        .into_iter()
        .map(|playlist| (playlist.id, playlist.attributes.name))
        .collect();
    Ok((playlists, page.next))
}

/// Id of the playlist returned by a create call.
pub fn decode_created_playlist(body: &str) -> Result<String, CatalogError> {
    let page: Page<PlaylistResource> = decode(body)?;
    page.data
        .into_iter()
        .next()
        .map(|playlist| playlist.id)
        .ok_or_else(|| CatalogError::Decode("create playlist returned no data".to_string()))
}

/// Catalog ids of one page of playlist tracks, plus the next page link.
/// Library-only uploads carry no catalog id and are skipped.
pub fn decode_playlist_tracks(body: &str) -> Result<(Vec<String>, Option<String>), CatalogError> {
    let page: Page<LibraryTrackResource> = decode(body)?;
    let ids = page
        .data
        .into_iter()
        .filter_map(|track| track.attributes.play_params?.catalog_id)
        .collect();
    Ok((ids, page.next))
}

fn check_success(status: u16) -> Result<(), CatalogError> {
    if SUCCESS_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CatalogError::from_status(status))
    }
}

fn map_ureq_error(err: ureq::Error) -> CatalogError {
    match err {
        ureq::Error::Status(status, _) => CatalogError::from_status(status),
        ureq::Error::Transport(transport) => CatalogError::Transport(transport.to_string()),
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct AppleMusicClient {
    agent: ureq::Agent,
    config: SessionConfig,
}

impl AppleMusicClient {
    pub fn new(config: SessionConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self { agent, config }
    }

    pub fn storefront(&self) -> &str {
        &self.config.storefront
    }

    fn api_base(&self) -> &str {
        &self.config.endpoints.api_base
    }

    fn authed(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &self.config.bearer_token)
            .set("media-user-token", &self.config.media_user_token)
            .set("Cookie", &self.config.cookies)
            .set("Origin", WEB_ORIGIN)
            .set("Referer", &format!("{}/", WEB_ORIGIN))
            .set("Accept", "application/json")
    }

    /// GET and return the body of a success response.
    fn get_body(&self, request: ureq::Request) -> Result<String, CatalogError> {
        let response = request.call().map_err(map_ureq_error)?;
        check_success(response.status())?;
        response
            .into_string()
            .map_err(|err| CatalogError::Decode(err.to_string()))
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        body: serde_json::Value,
    ) -> Result<ureq::Response, CatalogError> {
        let response = self
            .authed(method, url)
            .send_json(body)
            .map_err(map_ureq_error)?;
        check_success(response.status())?;
        Ok(response)
    }

    fn find_playlist(&self, name: &str) -> Result<Option<String>, CatalogError> {
        let mut url = library_playlists_url(self.api_base());
        loop {
            let body = self.get_body(self.authed("GET", &url))?;
            let (playlists, next) = decode_playlists(&body)?;
            if let Some((id, _)) = playlists.into_iter().find(|(_, existing)| existing == name) {
                return Ok(Some(id));
            }
            match next {
                Some(next) => url = resolve_next(self.api_base(), &next),
                None => return Ok(None),
            }
        }
    }
}

impl CatalogApi for AppleMusicClient {
    fn search_songs(&self, term: &str, limit: usize) -> Result<Vec<CatalogSong>, CatalogError> {
        let url = search_url(&self.config.endpoints.search_base, self.storefront(), term, limit);
        let body = self.get_body(self.agent.get(&url))?;
        let mut songs = decode_search(&body)?;
        songs.truncate(limit);
        Ok(songs)
    }

    fn songs_by_isrc(&self, isrc: &str) -> Result<Vec<CatalogSong>, CatalogError> {
        let url = isrc_url(self.api_base(), self.storefront(), isrc);
        let body = self.get_body(self.authed("GET", &url))?;
        decode_songs(&body)
    }

    fn equivalent_song_id(&self, song_id: &str) -> Result<Option<String>, CatalogError> {
        let url = equivalents_url(self.api_base(), self.storefront(), song_id);
        let body = self.get_body(self.authed("GET", &url))?;
        Ok(decode_songs(&body)?.into_iter().next().map(|song| song.id))
    }
}

impl CollectionApi for AppleMusicClient {
    fn find_or_create_playlist(&self, name: &str) -> Result<String, CatalogError> {
        match self.find_playlist(name) {
            Ok(Some(id)) => {
                debug!(name, id = %id, "reusing existing playlist");
                return Ok(id);
            }
            Ok(None) => {}
            Err(err) if err.is_authorization_failure() => return Err(err),
            Err(err) => warn!(name, error = %err, "playlist listing failed, creating"),
        }

        let body = json!({
            "attributes": {
                "name": name,
                "description": PLAYLIST_DESCRIPTION,
            }
        });
        let response = self.send("POST", &library_playlists_url(self.api_base()), body)?;
        let text = response
            .into_string()
            .map_err(|err| CatalogError::Decode(err.to_string()))?;
        decode_created_playlist(&text)
    }

    fn playlist_catalog_ids(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError> {
        let mut ids = Vec::new();
        let mut url = playlist_tracks_url(self.api_base(), playlist_id);
        loop {
            let body = match self.get_body(self.authed("GET", &url)) {
                Ok(body) => body,
                // New or empty playlists have no tracks resource
                Err(CatalogError::Status { status: 404 }) => break,
                Err(err) => return Err(err),
            };
            let (page_ids, next) = decode_playlist_tracks(&body)?;
            ids.extend(page_ids);
            match next {
                Some(next) => url = resolve_next(self.api_base(), &next),
                None => break,
            }
        }
        Ok(ids)
    }

    fn add_to_playlist(&self, playlist_id: &str, song_id: &str) -> Result<(), CatalogError> {
        let url = playlist_tracks_url(self.api_base(), playlist_id);
        self.send("POST", &url, json!({ "data": [{ "id": song_id, "type": "songs" }] }))?;
        Ok(())
    }

    fn like_song(&self, song_id: &str) -> Result<(), CatalogError> {
        let url = rating_url(self.api_base(), song_id);
        self.send("PUT", &url, json!({ "type": "rating", "attributes": { "value": 1 } }))?;
        Ok(())
    }

    fn add_to_library(&self, song_id: &str) -> Result<(), CatalogError> {
        let url = library_url(self.api_base());
        self.send("POST", &url, json!({ "data": [{ "id": song_id, "type": "songs" }] }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const API: &str = "https://amp-api.music.apple.com";

    #[test]
    fn test_search_url_encodes_term() {
        assert_eq!(
            search_url("https://itunes.apple.com", "de", "Song (feat. X) Band & Co", 10),
            "https://itunes.apple.com/search?country=de&media=music&entity=song&limit=10\
&term=Song%20%28feat.%20X%29%20Band%20%26%20Co"
        );
    }

    #[test]
    fn test_catalog_urls() {
        assert_eq!(
            isrc_url(API, "us", "USABC1234567"),
            "https://amp-api.music.apple.com/v1/catalog/us/songs?filter[isrc]=USABC1234567"
        );
        assert_eq!(
            equivalents_url(API, "us", "1440857781"),
            "https://amp-api.music.apple.com/v1/catalog/us/songs?filter[equivalents]=1440857781"
        );
        assert_eq!(
            playlist_tracks_url(API, "p.abc"),
            "https://amp-api.music.apple.com/v1/me/library/playlists/p.abc/tracks"
        );
        assert_eq!(
            rating_url(API, "42"),
            "https://amp-api.music.apple.com/v1/me/ratings/songs/42"
        );
        assert_eq!(library_url(&format!("{}/", API)), format!("{}/v1/me/library", API));
    }

    #[test]
    fn test_resolve_next() {
        assert_eq!(
            resolve_next(API, "/v1/me/library/playlists/p.1/tracks?offset=100"),
            "https://amp-api.music.apple.com/v1/me/library/playlists/p.1/tracks?offset=100"
        );
        assert_eq!(resolve_next(API, "https://other/x"), "https://other/x");
    }

    #[test]
    fn test_decode_search() {
        let body = r#"{
            "resultCount": 3,
            "results": [
                {"wrapperType": "track", "trackId": 1440857781, "trackName": "Song",
                 "artistName": "Band", "collectionName": "Album"},
                {"wrapperType": "collection", "collectionName": "No Track Id"},
                {"trackId": 7, "trackName": "Other", "artistName": "Singer"}
            ]
        }"#;
        let songs = decode_search(body).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].id, "1440857781");
        assert_eq!(songs[0].album, "Album");
        assert_eq!(songs[1].album, "");
    }

    #[test]
    fn test_decode_songs() {
        let body = r#"{"data": [
            {"id": "100", "type": "songs",
             "attributes": {"name": "Song", "artistName": "Band", "albumName": "Album"}},
            {"id": "200", "type": "songs"}
        ]}"#;
        let songs = decode_songs(body).unwrap();
        assert_eq!(songs[0].artist, "Band");
        assert_eq!(songs[1].id, "200");
        assert_eq!(songs[1].name, "");

        assert!(decode_songs("{}").unwrap().is_empty());
        assert!(matches!(decode_songs("not json"), Err(CatalogError::Decode(_))));
    }

    #[test]
    fn test_decode_playlists_and_created() {
        let body = r#"{"data": [
            {"id": "p.1", "attributes": {"name": "Road trip"}},
            {"id": "p.2", "attributes": {"name": "Focus"}}
        ], "next": "/v1/me/library/playlists?offset=2"}"#;
        let (playlists, next) = decode_playlists(body).unwrap();
        assert_eq!(playlists[1], ("p.2".to_string(), "Focus".to_string()));
        assert_eq!(next.as_deref(), Some("/v1/me/library/playlists?offset=2"));

        assert_eq!(
            decode_created_playlist(r#"{"data": [{"id": "p.9", "attributes": {}}]}"#).unwrap(),
            "p.9"
        );
        assert!(decode_created_playlist(r#"{"data": []}"#).is_err());
    }

    #[test]
    fn test_decode_playlist_tracks_skips_uploads() {
        let body = r#"{"data": [
            {"id": "i.1", "attributes": {"playParams": {"id": "i.1", "catalogId": "100"}}},
            {"id": "i.2", "attributes": {"playParams": {"id": "i.2"}}},
            {"id": "i.3", "attributes": {}}
        ]}"#;
        let (ids, next) = decode_playlist_tracks(body).unwrap();
        assert_eq!(ids, vec!["100".to_string()]);
        assert!(next.is_none());
    }

    #[test]
    fn test_success_statuses() {
        assert!(check_success(200).is_ok());
        assert!(check_success(201).is_ok());
        assert!(check_success(204).is_ok());
        assert!(check_success(202).is_err());
        assert!(matches!(
            check_success(403),
            Err(CatalogError::Unauthorized { status: 403 })
        ));
    }
}
