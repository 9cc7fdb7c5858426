//! Music curation over a remote catalog: recommendations, artist deep dives,
//! playlist categorization and listening stats.
//!
//! Core modules:
//! - [`recommend`] - Seed-anchored recommendations with exclusions and diversity caps
//! - [`discography`] - Best of / Deep Cuts / Through the Years playlists
//! - [`librarian`] - Genre-prefixed playlist renames
//! - [`stats`] - Top tracks, top artists and genre breakdowns
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Catalog data model and the [`Catalog`](catalog::Catalog) trait
//! - [`snapshot`] - Offline catalog loaded from a JSON snapshot
//! - [`bulk`] - Pagination, chunked lookups and the bounded worker pool
//! - [`dedup`] - Collapsing re-releases to one canonical track
//! - [`taxonomy`] - Genre categories and the classifier
//! - [`tally`] - Insertion-ordered frequency counting
//! - [`publish`] - Creating and filling playlists
//! - [`outcome`] - Errors, empty results and best-effort bookkeeping
//! - [`config`] - Config file and defaults
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use curator::recommend::{DiscoverRequest, SeedType};
//! use curator::snapshot::SnapshotCatalog;
//! use curator::{Curator, Outcome};
//! use std::path::Path;
//!
//! let catalog = SnapshotCatalog::load(Path::new("catalog.json"))?;
//! let curator = Curator::with_defaults(catalog)?;
//!
//! let request = DiscoverRequest::new(SeedType::Artist, Some("Radiohead".into()));
//! match curator.discover(request)? {
//!     Outcome::Ready(report) => println!("{} recommendations", report.count),
//!     Outcome::Empty(reason) => println!("{reason}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Model
//!
//! Bad requests fail before any catalog call. Optional sub-steps (exclusion
//! lookups, per-genre searches, per-album fetches, renames) are skipped on
//! failure and listed in the report's `failures`. Anything else aborts the
//! pipeline with a [`CurationError`] naming the step. "Not found" is a normal
//! [`Outcome::Empty`], not an error.

pub mod bulk;
pub mod catalog;
pub mod config;
pub mod dedup;
pub mod discography;
pub mod librarian;
pub mod outcome;
pub mod pipeline;
pub mod publish;
pub mod recommend;
pub mod snapshot;
pub mod stats;
pub mod tally;
pub mod taxonomy;

#[cfg(test)]
mod fixtures;

pub use catalog::{Catalog, CatalogError};
pub use outcome::{CurationError, EmptyReason, Outcome};
pub use pipeline::Curator;
