//! # Discography Pipeline
//!
//! Turns an artist's whole catalog into three playlists:
//!
//! - **Best of**: the 20 most popular songs.
//! - **Deep Cuts**: obscure album tracks that didn't make Best of, least
//!   popular first.
//! - **Through the Years**: every song once, oldest release first.
//!
//! Albums are fetched independently on the [`WorkerPool`]; their tracks are
//! concatenated back in listing order before deduplication, so the outcome
//! never depends on which fetch finishes first.

use crate::bulk::{self, WorkerPool, PAGE_SIZE};
use crate::catalog::{
    AlbumFilter, AlbumSummary, AlbumType, Catalog, CatalogError, SearchQuery, Track,
    BULK_LOOKUP_LIMIT,
};
use crate::dedup::dedupe;
use crate::outcome::{
    CurationError, EmptyReason, Failures, Outcome, RequiredStep, Step, StepFailure,
};
use crate::publish::{publish_playlist, PlaylistSummary};
use log::{debug, info};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_DEEP_CUTS_MAX_POPULARITY: u8 = 40;

const BEST_OF_SIZE: usize = 20;
const DEEP_CUTS_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepDiveRequest {
    pub artist_name: String,
    pub include_singles: bool,
    /// Tracks strictly below this popularity qualify as deep cuts.
    pub deep_cuts_max_popularity: u8,
}

impl DeepDiveRequest {
    pub fn new(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            include_singles: true,
            deep_cuts_max_popularity: DEFAULT_DEEP_CUTS_MAX_POPULARITY,
        }
    }

    pub fn validate(mut self) -> Result<Self, CurationError> {
        self.artist_name = self.artist_name.trim().to_string();
        if self.artist_name.is_empty() {
            return Err(CurationError::invalid("artist_name is required."));
        }
        if self.deep_cuts_max_popularity > 100 {
            return Err(CurationError::invalid(format!(
                "deep_cuts_max_popularity must be between 0 and 100, got {}.",
                self.deep_cuts_max_popularity
            )));
        }
        Ok(self)
    }

    fn album_filter(&self) -> AlbumFilter {
        if self.include_singles {
            AlbumFilter::AlbumsAndSingles
        } else {
            AlbumFilter::AlbumsOnly
        }
    }
}

/// The three track selections derived from one deduplicated discography.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscographySplit {
    pub best_of: Vec<Track>,
    pub deep_cuts: Vec<Track>,
    pub chronological: Vec<Track>,
}

impl DiscographySplit {
    /// Split `unique` (already deduplicated) into the three selections.
    ///
    /// Deep cuts are filtered against the Best of ids computed from the same
    /// slice, so the two never overlap.
    pub fn from_unique(unique: &[Track], deep_cuts_max_popularity: u8) -> Self {
        let mut best_of = unique.to_vec();
        best_of.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
        best_of.truncate(BEST_OF_SIZE);

        let best_ids: HashSet<&str> = best_of.iter().map(|t| t.id.as_str()).collect();
        let mut deep_cuts: Vec<Track> = unique
            .iter()
            .filter(|t| {
                t.popularity() < deep_cuts_max_popularity
                    && t.album_type == AlbumType::Album
                    && !best_ids.contains(t.id.as_str())
            })
            .cloned()
            .collect();
        deep_cuts.sort_by_key(Track::popularity);
        deep_cuts.truncate(DEEP_CUTS_SIZE);

        let mut chronological = unique.to_vec();
        chronological.sort_by(|a, b| a.release_date.cmp(&b.release_date));

        Self { best_of, deep_cuts, chronological }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepDiveStats {
    pub total_albums_analyzed: usize,
    pub total_tracks_analyzed: usize,
    pub albums_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepDiveReport {
    pub artist: ArtistSummary,
    pub playlists_created: Vec<PlaylistSummary>,
    pub stats: DeepDiveStats,
    pub failures: Vec<StepFailure>,
}

/// Fetch one album with full metadata for each of its tracks.
///
/// Release date and album type come from the album itself, the album name
/// from the artist's listing. Tracks the bulk lookup doesn't return are
/// dropped.
fn fetch_album_tracks<C: Catalog + ?Sized>(
    catalog: &C,
    summary: &AlbumSummary,
) -> Result<Vec<Track>, CatalogError> {
    let album = catalog.get_album(&summary.id)?;
    let ids: Vec<String> = album.tracks.iter().map(|t| t.id.clone()).collect();
    let full = bulk::batch(&ids, BULK_LOOKUP_LIMIT, |chunk| catalog.bulk_get_tracks(chunk))?;
    let mut by_id: HashMap<String, Track> = full.into_iter().map(|t| (t.id.clone(), t)).collect();

    let tracks: Vec<Track> = album
        .tracks
        .iter()
        .filter_map(|listed| {
            let Some(track) = by_id.remove(&listed.id) else {
                debug!("No metadata for track {} on album {}", listed.id, album.id);
                return None;
            };
            Some(Track {
                name: listed.name.clone(),
                release_date: album.release_date.clone(),
                album_type: album.album_type,
                album_name: summary.name.clone(),
                ..track
            })
        })
        .collect();

    debug!("Album '{}' ({}): {} tracks", summary.name, album.release_date, tracks.len());
    Ok(tracks)
}

/// Run the deep dive for one artist and create its three playlists.
pub fn deep_dive<C: Catalog + ?Sized>(
    catalog: &C,
    workers: &WorkerPool,
    request: DeepDiveRequest,
) -> Result<Outcome<DeepDiveReport>, CurationError> {
    let request = request.validate()?;
    info!("Deep dive into '{}'", request.artist_name);

    let found = catalog
        .search(&SearchQuery::Artist(request.artist_name.clone()), 1)
        .during(Step::ArtistLookup)?;
    let Some(artist) = found.artists.into_iter().next() else {
        return Ok(Outcome::Empty(EmptyReason::ArtistNotFound(request.artist_name)));
    };
    info!("Found artist: {} ({})", artist.name, artist.id);

    let filter = request.album_filter();
    let albums = bulk::paginate(PAGE_SIZE, |offset, limit| {
        catalog.get_artist_albums(&artist.id, filter, limit, offset)
    })
    .during(Step::AlbumListing)?;
    info!("Found {} releases for {}", albums.len(), artist.name);

    let fetched = workers.map_ordered(&albums, |summary| fetch_album_tracks(catalog, summary));

    let mut failures = Failures::new();
    let mut all_tracks = Vec::new();
    for (summary, result) in albums.iter().zip(fetched) {
        match result {
            Ok(tracks) => all_tracks.extend(tracks),
            Err(e) => failures.record(Step::AlbumTracks, &summary.name, &e),
        }
    }
    info!("Collected {} tracks", all_tracks.len());

    let unique = dedupe(&all_tracks);
    let split = DiscographySplit::from_unique(&unique, request.deep_cuts_max_popularity);

    let name = &artist.name;
    let ids = |tracks: &[Track]| -> Vec<String> { tracks.iter().map(|t| t.id.clone()).collect() };
    let playlists_created = vec![
        publish_playlist(
            catalog,
            &format!("Best of {name}"),
            &format!("Top 20 most popular tracks by {name}"),
            &ids(&split.best_of),
        )?,
        publish_playlist(
            catalog,
            &format!("{name}: Deep Cuts"),
            &format!("Hidden gems and lesser-known tracks by {name}"),
            &ids(&split.deep_cuts),
        )?,
        publish_playlist(
            catalog,
            &format!("{name}: Through the Years"),
            &format!("Complete discography of {name} in chronological order"),
            &ids(&split.chronological),
        )?,
    ];

    let stats = DeepDiveStats {
        total_albums_analyzed: albums.len(),
        total_tracks_analyzed: unique.len(),
        albums_failed: failures.count(Step::AlbumTracks),
    };
    Ok(Outcome::Ready(DeepDiveReport {
        artist: ArtistSummary { name: artist.name, id: artist.id },
        playlists_created,
        stats,
        failures: failures.into_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{album, artist, track};
    use crate::snapshot::{Snapshot, SnapshotCatalog};

    /// Two albums and a single; "Hit" appears on both an album and the single.
    fn discography() -> Snapshot {
        Snapshot {
            user_id: "me".into(),
            artists: vec![artist("ar1", "The Subjects", &["indie rock"])],
            albums: vec![
                album("al1", "ar1", AlbumType::Album, "2012-03-01", &["t1", "t2", "t3"]),
                album("al2", "ar1", AlbumType::Album, "2016-09-09", &["t4", "t5"]),
                album("s1", "ar1", AlbumType::Single, "2014-01-01", &["t6"]),
            ],
            tracks: vec![
                track("t1", "Hit", 50, "ar1"),
                track("t2", "Quiet One", 12, "ar1"),
                track("t3", "Middle", 45, "ar1"),
                track("t4", "Late Bloomer", 30, "ar1"),
                track("t5", "Closer", 8, "ar1"),
                track("t6", "HIT", 75, "ar1"),
            ],
            ..Snapshot::default()
        }
    }

    fn workers() -> WorkerPool {
        WorkerPool::new(4).unwrap()
    }

    fn run(catalog: &SnapshotCatalog, request: DeepDiveRequest) -> DeepDiveReport {
        deep_dive(catalog, &workers(), request).unwrap().ready().unwrap()
    }

    fn playlist_ids(catalog: &SnapshotCatalog, summary: &PlaylistSummary) -> Vec<String> {
        catalog.playlist(&summary.id).unwrap().track_ids
    }

    #[test]
    fn test_validation() {
        assert!(DeepDiveRequest::new("  ").validate().is_err());
        let mut request = DeepDiveRequest::new("x");
        request.deep_cuts_max_popularity = 101;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_creates_three_playlists() {
        let catalog = SnapshotCatalog::new(discography());
        let report = run(&catalog, DeepDiveRequest::new("The Subjects"));

        let names: Vec<_> = report.playlists_created.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Best of The Subjects", "The Subjects: Deep Cuts", "The Subjects: Through the Years"]
        );
        assert_eq!(report.stats.total_albums_analyzed, 3);
        assert_eq!(report.stats.total_tracks_analyzed, 5);
        assert_eq!(report.stats.albums_failed, 0);
    }

    #[test]
    fn test_rerelease_deduplicated_to_most_popular() {
        let catalog = SnapshotCatalog::new(discography());
        let report = run(&catalog, DeepDiveRequest::new("The Subjects"));

        let best = playlist_ids(&catalog, &report.playlists_created[0]);
        assert_eq!(best, vec!["t6", "t3", "t4", "t2", "t5"]);
    }

    #[test]
    fn test_chronological_uses_album_release_dates() {
        let catalog = SnapshotCatalog::new(discography());
        let report = run(&catalog, DeepDiveRequest::new("The Subjects"));

        let chrono = playlist_ids(&catalog, &report.playlists_created[2]);
        assert_eq!(chrono, vec!["t2", "t3", "t6", "t4", "t5"]);
    }

    #[test]
    fn test_split_keeps_best_of_and_deep_cuts_disjoint() {
        let unique: Vec<Track> = (0..30)
            .map(|i| track(&format!("t{i}"), &format!("Song {i}"), i, "ar1"))
            .collect();
        let split = DiscographySplit::from_unique(&unique, 40);

        assert_eq!(split.best_of.len(), 20);
        // Only t0..t9 remain outside Best of, all under the threshold.
        assert_eq!(split.deep_cuts.len(), 10);
        let best: HashSet<_> = split.best_of.iter().map(|t| &t.id).collect();
        assert!(split.deep_cuts.iter().all(|t| !best.contains(&t.id)));
        assert!(split.deep_cuts.windows(2).all(|w| w[0].popularity() <= w[1].popularity()));
        assert_eq!(split.chronological.len(), 30);
    }

    #[test]
    fn test_deep_cuts_exclude_singles_and_popular_tracks() {
        let mut unique: Vec<Track> = (0..25)
            .map(|i| track(&format!("p{i}"), &format!("Popular {i}"), 90, "ar1"))
            .collect();
        let mut single = track("s", "Single", 5, "ar1");
        single.album_type = AlbumType::Single;
        unique.push(single);
        unique.push(track("h", "At Threshold", 40, "ar1"));
        unique.push(track("d", "Deep", 39, "ar1"));

        let split = DiscographySplit::from_unique(&unique, 40);

        let ids: Vec<_> = split.deep_cuts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d"]);
    }

    #[test]
    fn test_album_failure_skipped_and_counted() {
        let catalog = SnapshotCatalog::new(discography());
        catalog.fail_on("get_album", Some("al2"));

        let report = run(&catalog, DeepDiveRequest::new("The Subjects"));

        assert_eq!(report.stats.total_albums_analyzed, 3);
        assert_eq!(report.stats.albums_failed, 1);
        assert_eq!(report.stats.total_tracks_analyzed, 3);
        assert_eq!(report.failures[0].step, Step::AlbumTracks);
        assert!(report.failures[0].detail.starts_with("Album al2"));
    }

    #[test]
    fn test_albums_only_skips_singles() {
        let catalog = SnapshotCatalog::new(discography());
        let mut request = DeepDiveRequest::new("The Subjects");
        request.include_singles = false;

        let report = run(&catalog, request);

        assert_eq!(report.stats.total_albums_analyzed, 2);
        let best = playlist_ids(&catalog, &report.playlists_created[0]);
        assert_eq!(best[0], "t1");
    }

    #[test]
    fn test_fan_out_does_not_change_result() {
        let sequential = SnapshotCatalog::new(discography());
        let parallel = SnapshotCatalog::new(discography());

        let a = deep_dive(&sequential, &WorkerPool::new(1).unwrap(), DeepDiveRequest::new("The Subjects"))
            .unwrap()
            .ready()
            .unwrap();
        let b = deep_dive(&parallel, &WorkerPool::new(8).unwrap(), DeepDiveRequest::new("The Subjects"))
            .unwrap()
            .ready()
            .unwrap();

        assert_eq!(a, b);
        for (x, y) in a.playlists_created.iter().zip(&b.playlists_created) {
            assert_eq!(playlist_ids(&sequential, x), playlist_ids(&parallel, y));
        }
    }

    #[test]
    fn test_unknown_artist_is_empty() {
        let catalog = SnapshotCatalog::new(discography());
        let outcome = deep_dive(&catalog, &workers(), DeepDiveRequest::new("Nobody")).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(catalog.calls("create_playlist"), 0);
    }

    #[test]
    fn test_album_listing_failure_aborts() {
        let catalog = SnapshotCatalog::new(discography());
        catalog.fail_on("get_artist_albums", None);
        let result = deep_dive(&catalog, &workers(), DeepDiveRequest::new("The Subjects"));
        assert!(matches!(result, Err(CurationError::Catalog { step: Step::AlbumListing, .. })));
    }
}
