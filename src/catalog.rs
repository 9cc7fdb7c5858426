//! # Catalog Module
//!
//! Entity snapshots returned by the remote catalog and the [`Catalog`] trait
//! every pipeline talks to. The trait is narrow and synchronous:
//! one method per catalog call, each of which may fail with a [`CatalogError`].
//!
//! Nothing in this module caches. A `Track` or `Playlist` is whatever the
//! catalog said at the moment of the call and is never written back locally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest id list accepted by the bulk lookup calls.
pub const BULK_LOOKUP_LIMIT: usize = 50;

/// Largest id list accepted by a single add-to-playlist call.
pub const PLAYLIST_ADD_LIMIT: usize = 100;

/// Popularity assumed for a seed whose catalog entry carries none.
pub const DEFAULT_SEED_POPULARITY: u8 = 50;

/// Errors raised by a catalog call.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested entity does not exist
    #[error("{kind} '{id}' not found in catalog")]
    NotFound { kind: &'static str, id: String },

    /// The service answered with an error status
    #[error("catalog service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The service could not be reached or refused the call
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A local snapshot file could not be read
    #[error("failed to read catalog snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// A local snapshot file is not valid JSON for the snapshot schema
    #[error("invalid catalog snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }
}

/// Release grouping reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumType {
    #[default]
    Album,
    Single,
    Compilation,
}

/// Which release groups an artist-albums listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumFilter {
    AlbumsOnly,
    AlbumsAndSingles,
}

impl AlbumFilter {
    pub fn admits(self, album_type: AlbumType) -> bool {
        match self {
            Self::AlbumsOnly => album_type == AlbumType::Album,
            Self::AlbumsAndSingles => matches!(album_type, AlbumType::Album | AlbumType::Single),
        }
    }
}

/// Listening-history window understood by the top-items calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }

    /// Human label for the window.
    pub fn label(self) -> &'static str {
        match self {
            Self::ShortTerm => "Last 4 Weeks",
            Self::MediumTerm => "Last 6 Months",
            Self::LongTerm => "All Time",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(Self::ShortTerm),
            "medium_term" => Ok(Self::MediumTerm),
            "long_term" => Ok(Self::LongTerm),
            other => Err(format!(
                "Invalid time_range: {other}. Must be 'short_term', 'medium_term', or 'long_term'."
            )),
        }
    }
}

/// Inclusive release-year window for genre searches, e.g. `2015-2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: u16,
    pub end: u16,
}

impl YearRange {
    pub fn contains(&self, year: u16) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self { start: 2015, end: 2025 }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid year_range: '{s}'. Expected 'YYYY-YYYY', e.g. '2015-2025'.");
        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let start: u16 = start.trim().parse().map_err(|_| invalid())?;
        let end: u16 = end.trim().parse().map_err(|_| invalid())?;
        if start > end {
            return Err(format!("Invalid year_range: '{s}'. Start year is after end year."));
        }
        Ok(Self { start, end })
    }
}

/// Reference to an artist embedded in a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Immutable track snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    /// Raw popularity as reported; use [`Track::popularity`] for ranking.
    #[serde(default, rename = "popularity")]
    pub raw_popularity: Option<i64>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub album_type: AlbumType,
    #[serde(default)]
    pub album_name: String,
    /// Primary (first credited) artist, when the catalog reports one.
    #[serde(default)]
    pub artist: Option<ArtistRef>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl Track {
    /// Popularity clamped to `0..=100`, absent values counting as 0.
    pub fn popularity(&self) -> u8 {
        self.raw_popularity.map_or(0, clamp_popularity)
    }

    pub fn artist_id(&self) -> Option<&str> {
        self.artist.as_ref().map(|a| a.id.as_str())
    }

    pub fn artist_name(&self) -> Option<&str> {
        self.artist.as_ref().map(|a| a.name.as_str())
    }
}

/// Clamp a catalog popularity value into `0..=100`.
pub fn clamp_popularity(raw: i64) -> u8 {
    // Lossless after the clamp.
    raw.clamp(0, 100) as u8
}

/// Artist with its free-text genre tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Artist {
    /// First `n` genre tags in catalog order.
    pub fn leading_genres(&self, n: usize) -> Vec<String> {
        self.genres.iter().take(n).cloned().collect()
    }
}

/// Album entry as listed on an artist page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: AlbumType,
    #[serde(default)]
    pub release_date: String,
}

/// Track listing entry inside an album; carries no popularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: String,
    pub name: String,
}

/// Full album with its track listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: AlbumType,
    pub release_date: String,
    pub tracks: Vec<TrackRef>,
}

/// Playlist header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub track_ids: Vec<String>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

/// Query accepted by [`Catalog::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Artists by free-text name
    Artist(String),
    /// Tracks tagged with a genre and released within a year window
    TracksByGenre { genre: String, years: YearRange },
}

/// Results of a search; only the list matching the query kind is filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
}

/// The remote music catalog.
///
/// Implementations must be shareable across worker threads because the
/// discography pipeline fans per-album calls out over a bounded pool.
pub trait Catalog: Sync {
    fn search(&self, query: &SearchQuery, limit: usize) -> Result<SearchResults, CatalogError>;

    fn get_track(&self, id: &str) -> Result<Track, CatalogError>;
    fn get_artist(&self, id: &str) -> Result<Artist, CatalogError>;
    fn get_album(&self, id: &str) -> Result<Album, CatalogError>;

    fn get_artist_albums(
        &self,
        artist_id: &str,
        filter: AlbumFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Page<AlbumSummary>, CatalogError>;

    fn get_artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError>;

    /// At most [`BULK_LOOKUP_LIMIT`] ids per call.
    fn bulk_get_tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError>;
    /// At most [`BULK_LOOKUP_LIMIT`] ids per call.
    fn bulk_get_artists(&self, ids: &[String]) -> Result<Vec<Artist>, CatalogError>;

    fn get_top_tracks(&self, range: TimeRange, limit: usize) -> Result<Vec<Track>, CatalogError>;
    fn get_top_artists(&self, range: TimeRange, limit: usize) -> Result<Vec<Artist>, CatalogError>;
    fn get_recent_track_ids(&self, limit: usize) -> Result<Vec<String>, CatalogError>;
    fn get_saved_track_ids(&self, limit: usize) -> Result<Vec<String>, CatalogError>;

    fn current_user_id(&self) -> Result<String, CatalogError>;
    fn get_user_playlists(&self, limit: usize, offset: usize) -> Result<Page<Playlist>, CatalogError>;
    fn get_playlist_track_ids(&self, playlist_id: &str, limit: usize) -> Result<Vec<String>, CatalogError>;

    fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<Playlist, CatalogError>;
    /// At most [`PLAYLIST_ADD_LIMIT`] ids per call.
    fn add_tracks(&self, playlist_id: &str, ids: &[String]) -> Result<(), CatalogError>;
    fn rename_playlist(&self, playlist_id: &str, name: &str) -> Result<(), CatalogError>;
}

/// Strip a `catalog:track:` style URI down to its bare id.
pub fn track_id_from_uri(value: &str) -> &str {
    value.rsplit(':').next().unwrap_or(value)
}
