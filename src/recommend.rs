//! # Recommendation Engine
//!
//! Builds a ranked list of tracks the listener probably doesn't know yet,
//! anchored on a seed artist, seed track, or their own listening history.
//!
//! ## Stages
//!
//! 1. **Seed resolution**: derive up to three seed genres and a seed popularity.
//! 2. **Exclusions**: recent plays and saved tracks, both best-effort.
//! 3. **Genre candidates**: a track search per seed genre, at most three
//!    accepted tracks per artist.
//! 4. **Top-artist match** (artist and track seeds only): top tracks of the
//!    listener's own top artists that share a seed genre, no artist cap.
//! 5. **Ranking**: closest popularity to the seed first, then truncation.
//!
//! Stages run in order and never revisit an earlier stage. Every working set
//! (seen ids, exclusions, per-artist counts) lives for one call only.

use crate::catalog::{
    clamp_popularity, track_id_from_uri, ArtistRef, Catalog, CatalogError, SearchQuery, TimeRange,
    Track, YearRange, DEFAULT_SEED_POPULARITY,
};
use crate::outcome::{
    CurationError, EmptyReason, Failures, Outcome, RequiredStep, Step, StepFailure,
};
use crate::publish::{publish_playlist, PlaylistSummary};
use crate::tally::Tally;
use log::{debug, info};
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LIMIT: usize = 30;
pub const MAX_LIMIT: usize = 50;

const SEED_GENRES: usize = 3;
const HISTORY_ARTISTS: usize = 10;
const RECENT_PLAYS: usize = 50;
const SAVED_TRACKS: usize = 100;
const GENRE_SEARCH_LIMIT: usize = 20;
const PER_ARTIST_CAP: usize = 3;
const TOP_ARTIST_POOL: usize = 20;
const MATCHING_ARTISTS: usize = 5;
const TRACKS_PER_MATCH: usize = 3;

/// What the recommendations are anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedType {
    Artist,
    Track,
    ListeningHistory,
}

impl SeedType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Track => "track",
            Self::ListeningHistory => "listening_history",
        }
    }

    fn needs_value(self) -> bool {
        !matches!(self, Self::ListeningHistory)
    }
}

impl fmt::Display for SeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedType {
    type Err = CurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(Self::Artist),
            "track" => Ok(Self::Track),
            "listening_history" => Ok(Self::ListeningHistory),
            other => Err(CurationError::invalid(format!(
                "Invalid seed_type: {other}. Must be 'artist', 'track', or 'listening_history'."
            ))),
        }
    }
}

impl Serialize for SeedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Arguments for [`discover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverRequest {
    pub seed_type: SeedType,
    /// Artist name or track id/URI; ignored for listening-history seeds.
    pub seed_value: Option<String>,
    pub year_range: YearRange,
    pub limit: usize,
    pub create_playlist: bool,
}

impl DiscoverRequest {
    pub fn new(seed_type: SeedType, seed_value: Option<String>) -> Self {
        Self {
            seed_type,
            seed_value,
            year_range: YearRange::default(),
            limit: DEFAULT_LIMIT,
            create_playlist: false,
        }
    }

    /// Check the request and clamp the limit, before any catalog call.
    pub fn validate(mut self) -> Result<Self, CurationError> {
        self.seed_value = self
            .seed_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if self.seed_type.needs_value() && self.seed_value.is_none() {
            return Err(CurationError::invalid(format!(
                "seed_value is required for seed_type '{}'.",
                self.seed_type
            )));
        }
        if self.limit == 0 {
            return Err(CurationError::invalid("limit must be at least 1."));
        }
        self.limit = self.limit.min(MAX_LIMIT);
        Ok(self)
    }
}

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// Genre search for this seed genre
    Genre(String),
    /// Top tracks of one of the listener's matching top artists
    TopArtistMatch,
}

impl CandidateSource {
    pub fn label(&self) -> &str {
        match self {
            Self::Genre(genre) => genre,
            Self::TopArtistMatch => "top_artist_match",
        }
    }
}

impl Serialize for CandidateSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A track under consideration for the final list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateTrack {
    pub name: String,
    #[serde(rename = "artist")]
    pub artist_name: String,
    #[serde(rename = "id")]
    pub track_id: String,
    pub popularity: u8,
    #[serde(skip)]
    pub artist_id: Option<String>,
    pub source: CandidateSource,
}

impl CandidateTrack {
    fn from_track(track: &Track, source: CandidateSource) -> Self {
        Self {
            name: track.name.clone(),
            artist_name: track.artist_name().unwrap_or("Unknown").to_string(),
            track_id: track.id.clone(),
            popularity: track.popularity(),
            artist_id: track.artist_id().map(str::to_string),
            source,
        }
    }
}

/// Resolved anchor for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub genres: Vec<String>,
    pub popularity: u8,
    pub artist_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoverReport {
    pub seed_type: SeedType,
    pub seed_value: String,
    pub seed_genres: Vec<String>,
    pub year_range: String,
    pub recommendations: Vec<CandidateTrack>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_created: Option<PlaylistSummary>,
    pub failures: Vec<StepFailure>,
}

/// Accumulates accepted candidates under the seen/exclusion/artist rules.
struct CandidatePool<'a> {
    exclusions: &'a HashSet<String>,
    seen: HashSet<String>,
    per_artist: HashMap<String, usize>,
    accepted: Vec<CandidateTrack>,
}

impl<'a> CandidatePool<'a> {
    fn new(exclusions: &'a HashSet<String>) -> Self {
        Self {
            exclusions,
            seen: HashSet::new(),
            per_artist: HashMap::new(),
            accepted: Vec::new(),
        }
    }

    fn is_fresh(&self, track: &Track) -> bool {
        !self.seen.contains(&track.id) && !self.exclusions.contains(&track.id)
    }

    /// Genre-search admission: fresh and under the per-artist cap.
    fn offer_capped(&mut self, track: &Track, genre: &str) -> bool {
        if !self.is_fresh(track) {
            return false;
        }
        if let Some(artist_id) = track.artist_id() {
            if self.per_artist.get(artist_id).copied().unwrap_or(0) >= PER_ARTIST_CAP {
                debug!("Artist cap reached, dropping '{}' ({})", track.name, track.id);
                return false;
            }
            *self.per_artist.entry(artist_id.to_string()).or_insert(0) += 1;
        }
        self.accept(track, CandidateSource::Genre(genre.to_string()));
        true
    }

    /// Top-artist admission: fresh only.
    fn offer_uncapped(&mut self, track: &Track) -> bool {
        if !self.is_fresh(track) {
            return false;
        }
        self.accept(track, CandidateSource::TopArtistMatch);
        true
    }

    fn accept(&mut self, track: &Track, source: CandidateSource) {
        self.seen.insert(track.id.clone());
        self.accepted.push(CandidateTrack::from_track(track, source));
    }
}

/// Order candidates by closeness to the seed popularity and keep `limit`.
///
/// The sort is stable, so equal distances keep stage and genre order.
pub fn rank_candidates(
    mut candidates: Vec<CandidateTrack>,
    seed_popularity: u8,
    limit: usize,
) -> Vec<CandidateTrack> {
    candidates.sort_by_key(|c| c.popularity.abs_diff(seed_popularity));
    candidates.truncate(limit);
    candidates
}

/// Resolve the seed genres and popularity.
pub fn resolve_seed<C: Catalog + ?Sized>(
    catalog: &C,
    request: &DiscoverRequest,
) -> Result<Outcome<Seed>, CurationError> {
    let value = request.seed_value.as_deref().unwrap_or_default();
    let seed = match request.seed_type {
        SeedType::Artist => {
            let found = catalog
                .search(&SearchQuery::Artist(value.to_string()), 1)
                .during(Step::SeedResolution)?;
            let Some(hit) = found.artists.into_iter().next() else {
                return Ok(Outcome::Empty(EmptyReason::ArtistNotFound(value.to_string())));
            };
            let artist = catalog.get_artist(&hit.id).during(Step::SeedResolution)?;
            Seed {
                genres: artist.leading_genres(SEED_GENRES),
                popularity: DEFAULT_SEED_POPULARITY,
                artist_name: Some(hit.name),
            }
        }
        SeedType::Track => {
            let track_id = track_id_from_uri(value);
            let track = match catalog.get_track(track_id) {
                Ok(track) => track,
                Err(CatalogError::NotFound { .. }) => {
                    return Ok(Outcome::Empty(EmptyReason::TrackNotFound(track_id.to_string())));
                }
                Err(source) => {
                    return Err(CurationError::Catalog { step: Step::SeedResolution, source });
                }
            };
            let popularity = track
                .raw_popularity
                .map_or(DEFAULT_SEED_POPULARITY, clamp_popularity);
            match track.artist_id() {
                Some(artist_id) => {
                    let artist = catalog.get_artist(artist_id).during(Step::SeedResolution)?;
                    Seed {
                        genres: artist.leading_genres(SEED_GENRES),
                        popularity,
                        artist_name: Some(artist.name),
                    }
                }
                None => Seed {
                    genres: Vec::new(),
                    popularity,
                    artist_name: None,
                },
            }
        }
        SeedType::ListeningHistory => {
            let artists = catalog
                .get_top_artists(TimeRange::MediumTerm, HISTORY_ARTISTS)
                .during(Step::SeedResolution)?;
            let tally: Tally<&str> = artists
                .iter()
                .flat_map(|a| a.genres.iter().map(String::as_str))
                .collect();
            Seed {
                genres: tally
                    .top(SEED_GENRES)
                    .into_iter()
                    .map(|(genre, _)| genre.to_string())
                    .collect(),
                popularity: DEFAULT_SEED_POPULARITY,
                artist_name: None,
            }
        }
    };

    info!(
        "Seed {}: artist {:?}, popularity {}, genres {:?}",
        request.seed_type, seed.artist_name, seed.popularity, seed.genres
    );
    if seed.genres.is_empty() {
        return Ok(Outcome::Empty(EmptyReason::NoSeedGenres));
    }
    Ok(Outcome::Ready(seed))
}

/// Recent plays ∪ saved tracks. Either half may fail independently.
fn collect_exclusions<C: Catalog + ?Sized>(catalog: &C, failures: &mut Failures) -> HashSet<String> {
    let mut exclusions = HashSet::new();
    if let Some(ids) = failures.best_effort(Step::RecentPlays, "recent plays", || {
        catalog.get_recent_track_ids(RECENT_PLAYS)
    }) {
        exclusions.extend(ids);
    }
    if let Some(ids) = failures.best_effort(Step::SavedLibrary, "saved tracks", || {
        catalog.get_saved_track_ids(SAVED_TRACKS)
    }) {
        exclusions.extend(ids);
    }
    debug!("Excluding {} known tracks", exclusions.len());
    exclusions
}

fn gather_genre_candidates<C: Catalog + ?Sized>(
    catalog: &C,
    seed: &Seed,
    years: YearRange,
    pool: &mut CandidatePool<'_>,
    failures: &mut Failures,
) {
    for genre in &seed.genres {
        let query = SearchQuery::TracksByGenre { genre: genre.clone(), years };
        let Some(found) = failures.best_effort(Step::GenreSearch, genre, || {
            catalog.search(&query, GENRE_SEARCH_LIMIT)
        }) else {
            continue;
        };
        let accepted = found.tracks.iter().filter(|t| pool.offer_capped(t, genre)).count();
        debug!("Genre '{genre}': {accepted} of {} tracks accepted", found.tracks.len());
    }
}

fn gather_top_artist_matches<C: Catalog + ?Sized>(
    catalog: &C,
    seed: &Seed,
    pool: &mut CandidatePool<'_>,
    failures: &mut Failures,
) {
    let Some(top_artists) = failures.best_effort(Step::TopArtistMatch, "top artists", || {
        catalog.get_top_artists(TimeRange::MediumTerm, TOP_ARTIST_POOL)
    }) else {
        return;
    };

    let matching = top_artists
        .iter()
        .filter(|a| a.genres.iter().any(|g| seed.genres.contains(g)))
        .take(MATCHING_ARTISTS);

    for artist in matching {
        let Some(tracks) = failures.best_effort(Step::ArtistTopTracks, &artist.name, || {
            catalog.get_artist_top_tracks(&artist.id)
        }) else {
            continue;
        };
        for track in tracks.iter().take(TRACKS_PER_MATCH) {
            // Attribute to the matched artist, whatever the track's credit says.
            let credited = Track {
                artist: Some(ArtistRef {
                    id: artist.id.clone(),
                    name: artist.name.clone(),
                }),
                ..track.clone()
            };
            pool.offer_uncapped(&credited);
        }
    }
}

/// Run the whole recommendation pipeline.
pub fn discover<C: Catalog + ?Sized>(
    catalog: &C,
    request: DiscoverRequest,
) -> Result<Outcome<DiscoverReport>, CurationError> {
    let request = request.validate()?;
    info!("Discover: seed {} {:?}", request.seed_type, request.seed_value);

    let seed = match resolve_seed(catalog, &request)? {
        Outcome::Ready(seed) => seed,
        Outcome::Empty(reason) => return Ok(Outcome::Empty(reason)),
    };

    let mut failures = Failures::new();
    let exclusions = collect_exclusions(catalog, &mut failures);
    let mut pool = CandidatePool::new(&exclusions);

    gather_genre_candidates(catalog, &seed, request.year_range, &mut pool, &mut failures);
    if request.seed_type != SeedType::ListeningHistory {
        gather_top_artist_matches(catalog, &seed, &mut pool, &mut failures);
    }

    let candidates = pool.accepted;
    let total = candidates.len();
    let recommendations = rank_candidates(candidates, seed.popularity, request.limit);
    info!("Generated {} recommendations from {total} candidates", recommendations.len());

    let playlist_created = if request.create_playlist && !recommendations.is_empty() {
        let name = format!("Discover: {}", seed.artist_name.as_deref().unwrap_or("My Genres"));
        let description = format!(
            "Recommendations based on {}: {}",
            request.seed_type,
            request.seed_value.as_deref().unwrap_or("listening history")
        );
        let ids: Vec<String> = recommendations.iter().map(|c| c.track_id.clone()).collect();
        Some(publish_playlist(catalog, &name, &description, &ids)?)
    } else {
        None
    };

    Ok(Outcome::Ready(DiscoverReport {
        seed_type: request.seed_type,
        seed_value: request
            .seed_value
            .clone()
            .unwrap_or_else(|| "listening_history".to_string()),
        seed_genres: seed.genres,
        year_range: request.year_range.to_string(),
        count: recommendations.len(),
        recommendations,
        playlist_created,
        failures: failures.into_vec(),
    }))
}
