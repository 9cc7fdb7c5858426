//! # Muse Curator
//!
//! Command-line front end for the curation pipelines. Every pipeline runs
//! against a catalog snapshot and prints its report as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Recommendations from an artist, saved as a playlist
//! curator --catalog catalog.json discover artist "Radiohead" --create-playlist
//!
//! # Three playlists from a whole discography
//! curator --catalog catalog.json deep-dive "Radiohead"
//!
//! # Preview genre prefixes for your playlists
//! curator --catalog catalog.json organize
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to follow each pipeline stage.

mod cli;
mod completion;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use curator::config::CurationConfig;
use curator::discography::DeepDiveRequest;
use curator::librarian::LibrarianRequest;
use curator::recommend::DiscoverRequest;
use curator::snapshot::SnapshotCatalog;
use curator::stats::TopMusicRequest;
use curator::{Curator, Outcome};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Print a report as pretty JSON, or the reason there is nothing to show.
fn print_outcome<T: Serialize>(outcome: Outcome<T>) -> Result<()> {
    match outcome {
        Outcome::Ready(report) => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        }
        Outcome::Empty(reason) => println!("{reason}"),
    }
    Ok(())
}

fn load_config(config_file: Option<&Path>, catalog: Option<PathBuf>) -> Result<CurationConfig> {
    let config = match config_file {
        Some(path) => CurationConfig::from_file(path)?,
        None => CurationConfig::load()?,
    };
    Ok(config.with_catalog_path(catalog))
}

fn open_curator(config: &CurationConfig) -> Result<Curator<SnapshotCatalog>> {
    let path = config.require_catalog_path()?;
    let catalog = SnapshotCatalog::load(path)
        .with_context(|| format!("Failed to load catalog snapshot {}", path.display()))?;
    Ok(Curator::new(catalog, config)?)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli::Args { catalog, config, command } = cli::Args::parse();
    let open = || -> Result<Curator<SnapshotCatalog>> {
        let config = load_config(config.as_deref(), catalog.clone())?;
        open_curator(&config)
    };

    match command {
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
        cli::Command::Discover { seed_type, seed_value, year_range, limit, create_playlist } => {
            info!("Discover from {seed_type:?} {seed_value:?}");
            let request = DiscoverRequest {
                year_range,
                limit,
                create_playlist,
                ..DiscoverRequest::new(seed_type.into(), seed_value)
            };
            print_outcome(open()?.discover(request)?)?;
        }
        cli::Command::DeepDive { artist_name, albums_only, deep_cuts_max_popularity } => {
            let request = DeepDiveRequest {
                include_singles: !albums_only,
                deep_cuts_max_popularity,
                ..DeepDiveRequest::new(artist_name)
            };
            print_outcome(open()?.deep_dive(request)?)?;
        }
        cli::Command::Organize { apply, style } => {
            let request = LibrarianRequest {
                dry_run: !apply,
                style: style.into(),
            };
            print_outcome(open()?.organize(request)?)?;
        }
        cli::Command::Top { time_range, top_count, create_playlist } => {
            let request = TopMusicRequest {
                top_count,
                create_playlist,
                ..TopMusicRequest::new(time_range.into())
            };
            print_outcome(open()?.top_music(request)?)?;
        }
    }

    Ok(())
}
