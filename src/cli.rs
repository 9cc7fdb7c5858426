//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `curator` binary.
//!
//! ## Commands
//!
//! - `discover`: Recommend tracks from an artist, a track, or listening history
//! - `deep-dive`: Build Best of, Deep Cuts and Through the Years playlists
//! - `organize`: Prefix your playlists with a genre category
//! - `top`: Top tracks, top artists and genre breakdown for a time window
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! curator --catalog catalog.json discover artist "Radiohead" --limit 20
//! curator --catalog catalog.json deep-dive "Björk" --albums-only
//! curator --catalog catalog.json organize --apply --style text
//! curator --catalog catalog.json top --time-range long-term --create-playlist
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use curator::catalog::{TimeRange, YearRange};
use curator::librarian::CategoryStyle;
use curator::recommend::SeedType;
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum SeedArg {
    /// Anchor on an artist name
    Artist,
    /// Anchor on a track id or URI
    Track,
    /// Anchor on your medium-term top artists
    ListeningHistory,
}

impl From<SeedArg> for SeedType {
    fn from(arg: SeedArg) -> Self {
        match arg {
            SeedArg::Artist => SeedType::Artist,
            SeedArg::Track => SeedType::Track,
            SeedArg::ListeningHistory => SeedType::ListeningHistory,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum StyleArg {
    /// `🎸 Rock/Road Trip`
    Emoji,
    /// `[Rock] Road Trip`
    Text,
}

impl From<StyleArg> for CategoryStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Emoji => CategoryStyle::Emoji,
            StyleArg::Text => CategoryStyle::Text,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum RangeArg {
    /// Last 4 weeks
    ShortTerm,
    /// Last 6 months
    MediumTerm,
    /// All time
    LongTerm,
}

impl From<RangeArg> for TimeRange {
    fn from(arg: RangeArg) -> Self {
        match arg {
            RangeArg::ShortTerm => TimeRange::ShortTerm,
            RangeArg::MediumTerm => TimeRange::MediumTerm,
            RangeArg::LongTerm => TimeRange::LongTerm,
        }
    }
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "curator")]
#[command(about = "Muse Curator - recommendations, deep dives and playlist housekeeping")]
#[command(version)]
pub struct Args {
    /// Catalog snapshot (JSON); overrides catalog_path from the config file
    #[arg(long, global = true, env = "CURATOR_CATALOG", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Recommend tracks you probably don't know yet
    ///
    /// Seeds genres from an artist, a track, or your listening history,
    /// searches those genres within a release-year window, and ranks the
    /// results by how close their popularity is to the seed's. Tracks you
    /// recently played or saved are never suggested.
    Discover {
        /// What to anchor recommendations on
        #[arg(value_enum)]
        seed_type: SeedArg,

        /// Artist name or track id/URI (not needed for listening-history)
        seed_value: Option<String>,

        /// Release years to search, e.g. 2015-2025
        #[arg(long, default_value = "2015-2025")]
        year_range: YearRange,

        /// Maximum number of recommendations (at most 50)
        #[arg(short, long, default_value_t = curator::recommend::DEFAULT_LIMIT)]
        limit: usize,

        /// Save the recommendations as a playlist
        #[arg(long)]
        create_playlist: bool,
    },

    /// Build three playlists from an artist's whole discography
    ///
    /// Creates "Best of <artist>" (top 20 by popularity), "<artist>: Deep Cuts"
    /// (obscure album tracks) and "<artist>: Through the Years" (everything,
    /// oldest first). Re-releases of the same song are collapsed.
    DeepDive {
        /// Artist to dive into
        #[arg(value_hint = clap::ValueHint::Other)]
        artist_name: String,

        /// Skip singles when collecting releases
        #[arg(long)]
        albums_only: bool,

        /// Tracks below this popularity count as deep cuts (0-100)
        #[arg(long, default_value_t = curator::discography::DEFAULT_DEEP_CUTS_MAX_POPULARITY)]
        deep_cuts_max_popularity: u8,
    },

    /// Prefix your playlists with a detected genre category
    ///
    /// Only lists the proposed renames unless --apply is given. Playlists
    /// that already start with a category label are left alone.
    Organize {
        /// Actually rename playlists
        #[arg(long)]
        apply: bool,

        /// How the category is written into the name
        #[arg(long, value_enum, default_value = "emoji")]
        style: StyleArg,
    },

    /// Show your top tracks, top artists and genre breakdown
    Top {
        /// Listening window
        #[arg(long, value_enum, default_value = "short-term")]
        time_range: RangeArg,

        /// How many tracks and artists to list (at most 50)
        #[arg(short = 'n', long, default_value_t = curator::stats::DEFAULT_TOP_COUNT)]
        top_count: usize,

        /// Save the top tracks as a monthly recap playlist
        #[arg(long)]
        create_playlist: bool,
    },

    /// Generate shell completions
    ///
    /// Outputs shell completion script for the specified shell.
    /// Redirect output to appropriate completion directory.
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
