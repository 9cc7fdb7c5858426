//! # Listening Stats
//!
//! Summarizes what the listener played most in one time window: ranked top
//! tracks and artists, total listening time of the top tracks, and a
//! percentage breakdown of the artists' genres. Optionally saves the top
//! tracks as a monthly recap playlist.

use crate::catalog::{Artist, Catalog, TimeRange, Track};
use crate::outcome::{CurationError, Outcome, RequiredStep, Step, StepFailure};
use crate::publish::{publish_playlist, PlaylistSummary};
use crate::tally::Tally;
use chrono::{Local, NaiveDate};
use log::{debug, info};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const DEFAULT_TOP_COUNT: usize = 10;
pub const MAX_TOP_COUNT: usize = 50;

/// Items fetched per list before truncating to the requested count.
const FETCH_SIZE: usize = 50;
const BREAKDOWN_BUCKETS: usize = 5;
const GENRES_PER_ARTIST: usize = 3;
const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopMusicRequest {
    pub time_range: TimeRange,
    pub top_count: usize,
    pub create_playlist: bool,
    /// Month the recap playlist is named after.
    pub recap_date: NaiveDate,
}

impl TopMusicRequest {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            top_count: DEFAULT_TOP_COUNT,
            create_playlist: false,
            recap_date: Local::now().date_naive(),
        }
    }

    pub fn validate(mut self) -> Result<Self, CurationError> {
        if self.top_count == 0 {
            return Err(CurationError::invalid("top_count must be at least 1."));
        }
        self.top_count = self.top_count.min(MAX_TOP_COUNT);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTrack {
    pub rank: usize,
    pub name: String,
    pub artist: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedArtist {
    pub rank: usize,
    pub name: String,
    pub genres: Vec<String>,
}

/// Genre buckets with integer percentages, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreBreakdown(Vec<(String, u32)>);

impl GenreBreakdown {
    pub fn get(&self, bucket: &str) -> Option<u32> {
        self.0.iter().find(|(b, _)| b == bucket).map(|(_, p)| *p)
    }

    pub fn entries(&self) -> &[(String, u32)] {
        &self.0
    }
}

impl Serialize for GenreBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (bucket, percent) in &self.0 {
            map.serialize_entry(bucket, percent)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListeningStats {
    pub top_tracks_analyzed: usize,
    pub top_artists_analyzed: usize,
    pub estimated_top_tracks_duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopMusicReport {
    pub time_range: TimeRange,
    pub period_label: &'static str,
    pub top_tracks: Vec<RankedTrack>,
    pub top_artists: Vec<RankedArtist>,
    pub genre_breakdown: GenreBreakdown,
    pub stats: ListeningStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recap_playlist: Option<PlaylistSummary>,
    pub failures: Vec<StepFailure>,
}

/// Coarse bucket for a genre tag: its first word, `other` when blank.
pub fn genre_bucket(tag: &str) -> &str {
    tag.split_whitespace().next().unwrap_or("other")
}

/// Top buckets by occurrence, as rounded percentages of all tags.
///
/// Ties keep the bucket seen first. Halves round to even.
pub fn genre_breakdown<S: AsRef<str>>(tags: &[S]) -> GenreBreakdown {
    let tally: Tally<&str> = tags.iter().map(|t| genre_bucket(t.as_ref())).collect();
    let total = tally.total().max(1) as f64;
    GenreBreakdown(
        tally
            .top(BREAKDOWN_BUCKETS)
            .into_iter()
            .map(|(bucket, count)| {
                let percent = (count as f64 / total * 100.0).round_ties_even();
                (bucket.to_string(), percent as u32)
            })
            .collect(),
    )
}

/// Total duration in hours, to one decimal.
///
/// Rounds the hour value itself rather than `hours * 10`, so 0.35 h (stored
/// just below 0.35) comes out as 0.3.
pub fn duration_hours(tracks: &[Track]) -> f64 {
    let total_ms: u64 = tracks.iter().map(|t| t.duration_ms).sum();
    let hours = total_ms as f64 / MS_PER_HOUR;
    format!("{hours:.1}").parse().unwrap_or(hours)
}

/// Recap playlist name for the month containing `date`, e.g.
/// `My Top Tracks - Oct 2026`.
pub fn recap_playlist_name(date: NaiveDate) -> String {
    format!("My Top Tracks - {}", date.format("%b %Y"))
}

fn rank_tracks(tracks: &[Track]) -> Vec<RankedTrack> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| RankedTrack {
            rank: i + 1,
            name: t.name.clone(),
            artist: t.artist_name().unwrap_or("Unknown").to_string(),
            id: t.id.clone(),
        })
        .collect()
}

fn rank_artists(artists: &[Artist]) -> Vec<RankedArtist> {
    artists
        .iter()
        .enumerate()
        .map(|(i, a)| RankedArtist {
            rank: i + 1,
            name: a.name.clone(),
            genres: a.leading_genres(GENRES_PER_ARTIST),
        })
        .collect()
}

/// Build the listening summary for one time window.
pub fn top_music<C: Catalog + ?Sized>(
    catalog: &C,
    request: TopMusicRequest,
) -> Result<Outcome<TopMusicReport>, CurationError> {
    let request = request.validate()?;
    let range = request.time_range;
    info!("Top music for {} ({})", range.label(), range);

    let mut tracks = catalog.get_top_tracks(range, FETCH_SIZE).during(Step::TopItems)?;
    let mut artists = catalog.get_top_artists(range, FETCH_SIZE).during(Step::TopItems)?;
    info!("Fetched {} top tracks, {} top artists", tracks.len(), artists.len());

    let fetched = (tracks.len(), artists.len());
    tracks.truncate(request.top_count);
    artists.truncate(request.top_count);

    let tags: Vec<&str> = artists
        .iter()
        .flat_map(|a| a.genres.iter().map(String::as_str))
        .collect();
    let breakdown = genre_breakdown(&tags);
    debug!("Genre breakdown over {} tags: {:?}", tags.len(), breakdown.entries());

    let recap_playlist = if request.create_playlist && !tracks.is_empty() {
        let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        Some(publish_playlist(
            catalog,
            &recap_playlist_name(request.recap_date),
            &format!("Your top tracks for {}", range.label()),
            &ids,
        )?)
    } else {
        None
    };

    Ok(Outcome::Ready(TopMusicReport {
        time_range: range,
        period_label: range.label(),
        top_tracks: rank_tracks(&tracks),
        top_artists: rank_artists(&artists),
        genre_breakdown: breakdown,
        stats: ListeningStats {
            top_tracks_analyzed: fetched.0,
            top_artists_analyzed: fetched.1,
            estimated_top_tracks_duration_hours: duration_hours(&tracks),
        },
        recap_playlist,
        failures: Vec::new(),
    }))
}
