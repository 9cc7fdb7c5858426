//! One entry point per curation pipeline, sharing a catalog, the taxonomy
//! and the album worker pool.

use crate::bulk::WorkerPool;
use crate::catalog::Catalog;
use crate::config::CurationConfig;
use crate::discography::{self, DeepDiveReport, DeepDiveRequest};
use crate::librarian::{self, LibrarianReport, LibrarianRequest};
use crate::outcome::{CurationError, Outcome};
use crate::recommend::{self, DiscoverReport, DiscoverRequest};
use crate::stats::{self, TopMusicReport, TopMusicRequest};
use crate::taxonomy::Taxonomy;
use log::debug;

/// High-level curator over a [`Catalog`].
///
/// Holds no per-invocation state: every call starts from scratch.
pub struct Curator<C: Catalog> {
    catalog: C,
    taxonomy: Taxonomy,
    workers: WorkerPool,
}

impl<C: Catalog> Curator<C> {
    pub fn new(catalog: C, config: &CurationConfig) -> Result<Self, CurationError> {
        let workers = WorkerPool::new(config.fan_out)?;
        debug!(
            "Curator ready: fan-out {}, {} genre categories",
            workers.fan_out(),
            config.taxonomy.len()
        );
        Ok(Self {
            catalog,
            taxonomy: config.taxonomy.clone(),
            workers,
        })
    }

    /// Curator with the default config.
    pub fn with_defaults(catalog: C) -> Result<Self, CurationError> {
        Self::new(catalog, &CurationConfig::default())
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Recommend tracks similar to a seed.
    pub fn discover(&self, request: DiscoverRequest) -> Result<Outcome<DiscoverReport>, CurationError> {
        recommend::discover(&self.catalog, request)
    }

    /// Build Best of, Deep Cuts and Through the Years playlists for an artist.
    pub fn deep_dive(&self, request: DeepDiveRequest) -> Result<Outcome<DeepDiveReport>, CurationError> {
        discography::deep_dive(&self.catalog, &self.workers, request)
    }

    /// Categorize the listener's playlists.
    pub fn organize(&self, request: LibrarianRequest) -> Result<Outcome<LibrarianReport>, CurationError> {
        librarian::organize(&self.catalog, &self.taxonomy, request)
    }

    /// Summarize top tracks, artists and genres.
    pub fn top_music(&self, request: TopMusicRequest) -> Result<Outcome<TopMusicReport>, CurationError> {
        stats::top_music(&self.catalog, request)
    }
}
