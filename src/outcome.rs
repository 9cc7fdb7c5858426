//! Pipeline results, errors and best-effort bookkeeping.
//!
//! A pipeline call ends in one of three ways:
//! - `Err(CurationError)` for bad input or a failed required catalog call,
//! - `Ok(Outcome::Empty(_))` when there is simply nothing to curate,
//! - `Ok(Outcome::Ready(report))` otherwise.
//!
//! Sub-steps that are allowed to fail go through [`Failures::best_effort`],
//! which logs the error and records it so the report says exactly which
//! steps were skipped.

use crate::catalog::CatalogError;
use log::warn;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that abort a pipeline.
#[derive(Debug, Error)]
pub enum CurationError {
    /// Request rejected before any catalog call was made
    #[error("{0}")]
    InvalidInput(String),

    /// A catalog call the pipeline cannot do without failed
    #[error("catalog call failed during {step}: {source}")]
    Catalog {
        step: Step,
        #[source]
        source: CatalogError,
    },

    /// The per-album worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl CurationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Attach the failing step to a catalog error on a required path.
pub trait RequiredStep<T> {
    fn during(self, step: Step) -> Result<T, CurationError>;
}

impl<T> RequiredStep<T> for Result<T, CatalogError> {
    fn during(self, step: Step) -> Result<T, CurationError> {
        self.map_err(|source| CurationError::Catalog { step, source })
    }
}

/// Named pipeline steps, used in error messages and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    SeedResolution,
    RecentPlays,
    SavedLibrary,
    GenreSearch,
    TopArtistMatch,
    ArtistTopTracks,
    PlaylistCreation,
    PlaylistPopulation,
    ArtistLookup,
    AlbumListing,
    AlbumTracks,
    PlaylistListing,
    PlaylistSample,
    GenreLookup,
    PlaylistRename,
    TopItems,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SeedResolution => "seed resolution",
            Self::RecentPlays => "recent plays",
            Self::SavedLibrary => "saved library",
            Self::GenreSearch => "genre search",
            Self::TopArtistMatch => "top artist match",
            Self::ArtistTopTracks => "artist top tracks",
            Self::PlaylistCreation => "playlist creation",
            Self::PlaylistPopulation => "playlist population",
            Self::ArtistLookup => "artist lookup",
            Self::AlbumListing => "album listing",
            Self::AlbumTracks => "album tracks",
            Self::PlaylistListing => "playlist listing",
            Self::PlaylistSample => "playlist sample",
            Self::GenreLookup => "genre lookup",
            Self::PlaylistRename => "playlist rename",
            Self::TopItems => "top items",
        };
        f.write_str(name)
    }
}

/// One skipped best-effort step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: Step,
    pub detail: String,
}

/// Accumulates best-effort failures over one pipeline invocation.
#[derive(Debug, Default, Clone)]
pub struct Failures(Vec<StepFailure>);

impl Failures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op`; on error log it, record it under `step` and return `None`.
    pub fn best_effort<T>(
        &mut self,
        step: Step,
        subject: &str,
        op: impl FnOnce() -> Result<T, CatalogError>,
    ) -> Option<T> {
        match op() {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(step, subject, &e);
                None
            }
        }
    }

    pub fn record(&mut self, step: Step, subject: &str, error: &CatalogError) {
        warn!("Skipping {step} for '{subject}': {error}");
        self.0.push(StepFailure {
            step,
            detail: format!("{subject}: {error}"),
        });
    }

    pub fn count(&self, step: Step) -> usize {
        self.0.iter().filter(|f| f.step == step).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<StepFailure> {
        self.0
    }
}

/// Why a pipeline produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    ArtistNotFound(String),
    TrackNotFound(String),
    NoSeedGenres,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtistNotFound(name) => write!(f, "Artist '{name}' not found."),
            Self::TrackNotFound(id) => write!(f, "Track '{id}' not found."),
            Self::NoSeedGenres => {
                f.write_str("Could not determine genres for recommendations. Try a different seed.")
            }
        }
    }
}

/// Successful pipeline result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    Empty(EmptyReason),
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}
