//! # Snapshot Catalog Module
//!
//! An in-memory [`Catalog`] backed by a JSON snapshot of a catalog account:
//! artists, albums, tracks, playlists, top lists per time range, recent plays
//! and saved tracks. It lets every pipeline run offline.
//!
//! Writes (playlist creation, additions, renames) change the in-memory copy
//! only. Individual operations can be made to fail on purpose with
//! [`SnapshotCatalog::fail_on`] to rehearse partial outages.
//!
//! ## Snapshot format
//!
//! ```json
//! {
//!   "user_id": "me",
//!   "artists": [{"id": "a1", "name": "Artist", "genres": ["indie rock"]}],
//!   "albums": [{"id": "al1", "name": "LP", "album_type": "album",
//!               "release_date": "2019-04-01", "artist_id": "a1",
//!               "track_ids": ["t1"]}],
//!   "tracks": [{"id": "t1", "name": "Song", "popularity": 61,
//!               "release_date": "2019-04-01", "album_type": "album",
//!               "album_name": "LP", "artist": {"id": "a1", "name": "Artist"},
//!               "duration_ms": 201000}],
//!   "playlists": [{"id": "p1", "name": "Mix", "owner_id": "me", "track_ids": ["t1"]}],
//!   "top_tracks": {"short_term": ["t1"]},
//!   "top_artists": {"medium_term": ["a1"]},
//!   "recent_track_ids": [],
//!   "saved_track_ids": []
//! }
//! ```

use crate::catalog::{
    Album, AlbumFilter, AlbumSummary, AlbumType, Artist, Catalog, CatalogError, Page, Playlist,
    SearchQuery, SearchResults, TimeRange, Track, TrackRef, YearRange, BULK_LOOKUP_LIMIT,
    PLAYLIST_ADD_LIMIT,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of tracks returned by an artist top-tracks lookup.
const ARTIST_TOP_TRACKS: usize = 10;

/// Album as stored in a snapshot, referencing tracks by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: AlbumType,
    #[serde(default)]
    pub release_date: String,
    pub artist_id: String,
    #[serde(default)]
    pub track_ids: Vec<String>,
}

/// Serializable contents of a catalog account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub user_id: String,
    pub artists: Vec<Artist>,
    pub albums: Vec<AlbumRecord>,
    pub tracks: Vec<Track>,
    pub playlists: Vec<Playlist>,
    pub top_tracks: HashMap<TimeRange, Vec<String>>,
    pub top_artists: HashMap<TimeRange, Vec<String>>,
    pub recent_track_ids: Vec<String>,
    pub saved_track_ids: Vec<String>,
}

impl Snapshot {
    fn artist(&self, id: &str) -> Option<&Artist> {
        self.artists.iter().find(|a| a.id == id)
    }

    fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn release_year(date: &str) -> Option<u16> {
        date.get(..4)?.parse().ok()
    }

    fn tracks_by_genre(&self, genre: &str, years: &YearRange, limit: usize) -> Vec<Track> {
        let genre = genre.to_lowercase();
        self.tracks
            .iter()
            .filter(|t| {
                t.artist_id()
                    .and_then(|id| self.artist(id))
                    .is_some_and(|a| a.genres.iter().any(|g| g.to_lowercase() == genre))
            })
            .filter(|t| Self::release_year(&t.release_date).is_some_and(|y| years.contains(y)))
            .take(limit)
            .cloned()
            .collect()
    }

    fn artists_by_name(&self, name: &str, limit: usize) -> Vec<Artist> {
        let needle = name.trim().to_lowercase();
        let exact = self.artists.iter().filter(|a| a.name.to_lowercase() == needle);
        let partial = self.artists.iter().filter(|a| {
            let candidate = a.name.to_lowercase();
            candidate != needle && candidate.contains(&needle)
        });
        exact.chain(partial).take(limit).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FailPoint {
    operation: String,
    key: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    snapshot: Snapshot,
    fail_points: Vec<FailPoint>,
    calls: HashMap<&'static str, usize>,
    created: usize,
}

impl State {
    /// Count the call and trip any matching fail point.
    fn enter(&mut self, operation: &'static str, key: Option<&str>) -> Result<(), CatalogError> {
        *self.calls.entry(operation).or_insert(0) += 1;
        let tripped = self.fail_points.iter().any(|fp| {
            fp.operation == operation && (fp.key.is_none() || fp.key.as_deref() == key)
        });
        if tripped {
            debug!("Injected failure for {operation} ({key:?})");
            return Err(CatalogError::Unavailable(format!("injected failure in {operation}")));
        }
        Ok(())
    }
}

/// Offline catalog over a [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotCatalog {
    state: Mutex<State>,
}

impl SnapshotCatalog {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(State {
                snapshot,
                ..State::default()
            }),
        }
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        info!(
            "Loaded catalog snapshot {} ({} artists, {} albums, {} tracks, {} playlists)",
            path.display(),
            snapshot.artists.len(),
            snapshot.albums.len(),
            snapshot.tracks.len(),
            snapshot.playlists.len()
        );
        Ok(Self::new(snapshot))
    }

    /// Make `operation` fail, for every key or only for `key`.
    ///
    /// Operation names are the [`Catalog`] method names. Keys are the id the
    /// call is about (album id, artist id, playlist id), the genre for a
    /// genre search, or the name for an artist search.
    pub fn fail_on(&self, operation: &str, key: Option<&str>) {
        self.lock().fail_points.push(FailPoint {
            operation: operation.to_string(),
            key: key.map(str::to_string),
        });
    }

    /// How many times `operation` has been called.
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Total number of catalog calls made so far.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Current playlists, including any created during this session.
    pub fn playlists(&self) -> Vec<Playlist> {
        self.lock().snapshot.playlists.clone()
    }

    pub fn playlist(&self, id: &str) -> Option<Playlist> {
        self.lock().snapshot.playlists.iter().find(|p| p.id == id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Catalog for SnapshotCatalog {
    fn search(&self, query: &SearchQuery, limit: usize) -> Result<SearchResults, CatalogError> {
        let mut state = self.lock();
        match query {
            SearchQuery::Artist(name) => {
                state.enter("search", Some(name))?;
                Ok(SearchResults {
                    artists: state.snapshot.artists_by_name(name, limit),
                    tracks: Vec::new(),
                })
            }
            SearchQuery::TracksByGenre { genre, years } => {
                state.enter("search", Some(genre))?;
                Ok(SearchResults {
                    artists: Vec::new(),
                    tracks: state.snapshot.tracks_by_genre(genre, years, limit),
                })
            }
        }
    }

    fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        let mut state = self.lock();
        state.enter("get_track", Some(id))?;
        state
            .snapshot
            .track(id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("track", id))
    }

    fn get_artist(&self, id: &str) -> Result<Artist, CatalogError> {
        let mut state = self.lock();
        state.enter("get_artist", Some(id))?;
        state
            .snapshot
            .artist(id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("artist", id))
    }

    fn get_album(&self, id: &str) -> Result<Album, CatalogError> {
        let mut state = self.lock();
        state.enter("get_album", Some(id))?;
        let snapshot = &state.snapshot;
        let record = snapshot
            .albums
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| CatalogError::not_found("album", id))?;
        let tracks = record
            .track_ids
            .iter()
            .map(|tid| {
                snapshot
                    .track(tid)
                    .map(|t| TrackRef { id: t.id.clone(), name: t.name.clone() })
                    .ok_or_else(|| CatalogError::not_found("track", tid.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Album {
            id: record.id.clone(),
            name: record.name.clone(),
            album_type: record.album_type,
            release_date: record.release_date.clone(),
            tracks,
        })
    }

    fn get_artist_albums(
        &self,
        artist_id: &str,
        filter: AlbumFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Page<AlbumSummary>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_artist_albums", Some(artist_id))?;
        let matching: Vec<AlbumSummary> = state
            .snapshot
            .albums
            .iter()
            .filter(|a| a.artist_id == artist_id && filter.admits(a.album_type))
            .map(|a| AlbumSummary {
                id: a.id.clone(),
                name: a.name.clone(),
                album_type: a.album_type,
                release_date: a.release_date.clone(),
            })
            .collect();
        let items: Vec<_> = matching.iter().skip(offset).take(limit).cloned().collect();
        Ok(Page {
            has_more: offset + items.len() < matching.len(),
            items,
        })
    }

    fn get_artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_artist_top_tracks", Some(artist_id))?;
        let mut tracks: Vec<Track> = state
            .snapshot
            .tracks
            .iter()
            .filter(|t| t.artist_id() == Some(artist_id))
            .cloned()
            .collect();
        tracks.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
        tracks.truncate(ARTIST_TOP_TRACKS);
        Ok(tracks)
    }

    fn bulk_get_tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        let mut state = self.lock();
        state.enter("bulk_get_tracks", None)?;
        check_bulk_size(ids.len(), BULK_LOOKUP_LIMIT)?;
        Ok(ids.iter().filter_map(|id| state.snapshot.track(id).cloned()).collect())
    }

    fn bulk_get_artists(&self, ids: &[String]) -> Result<Vec<Artist>, CatalogError> {
        let mut state = self.lock();
        state.enter("bulk_get_artists", None)?;
        check_bulk_size(ids.len(), BULK_LOOKUP_LIMIT)?;
        Ok(ids.iter().filter_map(|id| state.snapshot.artist(id).cloned()).collect())
    }

    fn get_top_tracks(&self, range: TimeRange, limit: usize) -> Result<Vec<Track>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_top_tracks", Some(range.as_str()))?;
        let snapshot = &state.snapshot;
        Ok(snapshot
            .top_tracks
            .get(&range)
            .map(|ids| ids.iter().filter_map(|id| snapshot.track(id).cloned()).take(limit).collect())
            .unwrap_or_default())
    }

    fn get_top_artists(&self, range: TimeRange, limit: usize) -> Result<Vec<Artist>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_top_artists", Some(range.as_str()))?;
        let snapshot = &state.snapshot;
        Ok(snapshot
            .top_artists
            .get(&range)
            .map(|ids| ids.iter().filter_map(|id| snapshot.artist(id).cloned()).take(limit).collect())
            .unwrap_or_default())
    }

    fn get_recent_track_ids(&self, limit: usize) -> Result<Vec<String>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_recent_track_ids", None)?;
        Ok(state.snapshot.recent_track_ids.iter().take(limit).cloned().collect())
    }

    fn get_saved_track_ids(&self, limit: usize) -> Result<Vec<String>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_saved_track_ids", None)?;
        Ok(state.snapshot.saved_track_ids.iter().take(limit).cloned().collect())
    }

    fn current_user_id(&self) -> Result<String, CatalogError> {
        let mut state = self.lock();
        state.enter("current_user_id", None)?;
        Ok(state.snapshot.user_id.clone())
    }

    fn get_user_playlists(&self, limit: usize, offset: usize) -> Result<Page<Playlist>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_user_playlists", None)?;
        let all = &state.snapshot.playlists;
        let items: Vec<Playlist> = all.iter().skip(offset).take(limit).cloned().collect();
        Ok(Page {
            has_more: offset + items.len() < all.len(),
            items,
        })
    }

    fn get_playlist_track_ids(&self, playlist_id: &str, limit: usize) -> Result<Vec<String>, CatalogError> {
        let mut state = self.lock();
        state.enter("get_playlist_track_ids", Some(playlist_id))?;
        state
            .snapshot
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .map(|p| p.track_ids.iter().take(limit).cloned().collect())
            .ok_or_else(|| CatalogError::not_found("playlist", playlist_id))
    }

    fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<Playlist, CatalogError> {
        let mut state = self.lock();
        state.enter("create_playlist", Some(name))?;
        state.created += 1;
        let playlist = Playlist {
            id: format!("snapshot-playlist-{}", state.created),
            name: name.to_string(),
            owner_id: state.snapshot.user_id.clone(),
            track_ids: Vec::new(),
        };
        debug!("Created playlist '{name}' ({description}, public: {public})");
        state.snapshot.playlists.push(playlist.clone());
        Ok(playlist)
    }

    fn add_tracks(&self, playlist_id: &str, ids: &[String]) -> Result<(), CatalogError> {
        let mut state = self.lock();
        state.enter("add_tracks", Some(playlist_id))?;
        check_bulk_size(ids.len(), PLAYLIST_ADD_LIMIT)?;
        let playlist = state
            .snapshot
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| CatalogError::not_found("playlist", playlist_id))?;
        playlist.track_ids.extend_from_slice(ids);
        Ok(())
    }

    fn rename_playlist(&self, playlist_id: &str, name: &str) -> Result<(), CatalogError> {
        let mut state = self.lock();
        state.enter("rename_playlist", Some(playlist_id))?;
        let playlist = state
            .snapshot
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| CatalogError::not_found("playlist", playlist_id))?;
        playlist.name = name.to_string();
        Ok(())
    }
}

fn check_bulk_size(len: usize, ceiling: usize) -> Result<(), CatalogError> {
    if len > ceiling {
        return Err(CatalogError::Service {
            status: 400,
            message: format!("too many ids: {len} (maximum {ceiling})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{artist, track, TrackExt};

    fn catalog() -> SnapshotCatalog {
        SnapshotCatalog::new(Snapshot {
            user_id: "me".into(),
            artists: vec![
                artist("a1", "The Band", &["indie rock"]),
                artist("a2", "Band of Horses", &["indie folk"]),
            ],
            tracks: vec![
                track("t1", "Old", 20, "a1").released("2009-01-01"),
                track("t2", "New", 80, "a1").released("2021-05-05"),
                track("t3", "Folk", 40, "a2").released("2021-05-05"),
            ],
            ..Snapshot::default()
        })
    }

    #[test]
    fn test_artist_search_prefers_exact_match() {
        let catalog = catalog();
        let found = catalog.search(&SearchQuery::Artist("band of horses".into()), 5).unwrap();
        assert_eq!(found.artists[0].id, "a2");

        let found = catalog.search(&SearchQuery::Artist("band".into()), 5).unwrap();
        assert_eq!(found.artists.len(), 2);
    }

    #[test]
    fn test_genre_search_filters_by_year() {
        let catalog = catalog();
        let query = SearchQuery::TracksByGenre {
            genre: "indie rock".into(),
            years: YearRange { start: 2015, end: 2025 },
        };
        let found = catalog.search(&query, 20).unwrap();
        assert_eq!(found.tracks.len(), 1);
        assert_eq!(found.tracks[0].id, "t2");
    }

    #[test]
    fn test_bulk_ceiling_enforced() {
        let catalog = catalog();
        let ids: Vec<String> = (0..51).map(|i| format!("t{i}")).collect();
        assert!(catalog.bulk_get_tracks(&ids).is_err());
        assert_eq!(catalog.bulk_get_tracks(&ids[..3]).unwrap().len(), 2);
    }

    #[test]
    fn test_fail_points_and_call_counts() {
        let catalog = catalog();
        catalog.fail_on("get_artist", Some("a2"));

        assert!(catalog.get_artist("a1").is_ok());
        assert!(matches!(catalog.get_artist("a2"), Err(CatalogError::Unavailable(_))));
        assert!(matches!(catalog.get_artist("zz"), Err(CatalogError::NotFound { .. })));
        assert_eq!(catalog.calls("get_artist"), 3);
        assert_eq!(catalog.total_calls(), 3);
    }

    #[test]
    fn test_playlist_writes() {
        let catalog = catalog();
        let created = catalog.create_playlist("Mix", "desc", true).unwrap();
        catalog.add_tracks(&created.id, &["t1".into(), "t2".into()]).unwrap();
        catalog.rename_playlist(&created.id, "Renamed").unwrap();

        let stored = catalog.playlist(&created.id).unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.owner_id, "me");
        assert_eq!(stored.track_ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"user_id": "me", "top_artists": {"medium_term": ["a1"]},
                "tracks": [{"id": "t1", "name": "Song"}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.top_artists[&TimeRange::MediumTerm], vec!["a1"]);
        assert_eq!(snapshot.tracks[0].popularity(), 0);
        assert_eq!(snapshot.tracks[0].album_type, AlbumType::Album);
    }
}
