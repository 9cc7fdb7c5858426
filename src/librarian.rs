//! # Playlist Librarian
//!
//! Sorts the listener's own playlists into genre categories by prefixing
//! their names, e.g. `Road Trip` becomes `🎸 Rock/Road Trip` (emoji style) or
//! `[Rock] Road Trip` (text style).
//!
//! Each playlist is classified from the genres of the artists behind its
//! first tracks. Playlists already carrying a category label, playlists
//! that can't be sampled, and playlists whose genres match nothing are left
//! alone and counted as skipped. A dry run only proposes the renames.

use crate::bulk::{self, PAGE_SIZE};
use crate::catalog::{Catalog, CatalogError, Playlist, BULK_LOOKUP_LIMIT};
use crate::outcome::{CurationError, Failures, Outcome, RequiredStep, Step, StepFailure};
use crate::taxonomy::{GenreCategory, Taxonomy};
use log::{debug, info};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Tracks sampled from the top of each playlist.
const SAMPLE_SIZE: usize = 30;

/// How a category is written into a playlist name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryStyle {
    #[default]
    Emoji,
    Text,
}

impl CategoryStyle {
    pub fn rename(self, category: &GenreCategory, name: &str) -> String {
        match self {
            Self::Emoji => format!("{}/{name}", category.label),
            Self::Text => format!("[{}] {name}", category.plain_name()),
        }
    }
}

impl fmt::Display for CategoryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emoji => f.write_str("emoji"),
            Self::Text => f.write_str("text"),
        }
    }
}

impl FromStr for CategoryStyle {
    type Err = CurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emoji" => Ok(Self::Emoji),
            "text" => Ok(Self::Text),
            other => Err(CurationError::invalid(format!(
                "Invalid category_style: {other}. Must be 'emoji' or 'text'."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibrarianRequest {
    pub dry_run: bool,
    pub style: CategoryStyle,
}

impl Default for LibrarianRequest {
    fn default() -> Self {
        Self {
            dry_run: true,
            style: CategoryStyle::Emoji,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistChange {
    pub playlist_id: String,
    pub original_name: String,
    pub new_name: String,
    pub detected_category: String,
    pub applied: bool,
}

/// Categorized playlist counts, serialized as an object in taxonomy order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySummary(Vec<(String, usize)>);

impl CategorySummary {
    pub fn get(&self, label: &str) -> Option<usize> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, n)| *n)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }
}

impl Serialize for CategorySummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarianReport {
    pub playlists_analyzed: usize,
    pub playlists_categorized: usize,
    pub playlists_skipped: usize,
    pub dry_run: bool,
    pub changes: Vec<PlaylistChange>,
    pub category_summary: CategorySummary,
    pub failures: Vec<StepFailure>,
}

/// Genres of every distinct primary artist among `track_ids`.
fn sample_genres<C: Catalog + ?Sized>(catalog: &C, track_ids: &[String]) -> Result<Vec<String>, CatalogError> {
    let tracks = bulk::batch(track_ids, BULK_LOOKUP_LIMIT, |chunk| catalog.bulk_get_tracks(chunk))?;

    let mut seen = HashSet::new();
    let artist_ids: Vec<String> = tracks
        .iter()
        .filter_map(|t| t.artist_id())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect();
    if artist_ids.is_empty() {
        return Ok(Vec::new());
    }

    let artists = bulk::batch(&artist_ids, BULK_LOOKUP_LIMIT, |chunk| catalog.bulk_get_artists(chunk))?;
    Ok(artists.into_iter().flat_map(|a| a.genres).collect())
}

/// Classify every owned playlist and propose (or apply) category renames.
pub fn organize<C: Catalog + ?Sized>(
    catalog: &C,
    taxonomy: &Taxonomy,
    request: LibrarianRequest,
) -> Result<Outcome<LibrarianReport>, CurationError> {
    info!("Organizing playlists ({} style, dry run: {})", request.style, request.dry_run);

    let playlists = bulk::paginate(PAGE_SIZE, |offset, limit| catalog.get_user_playlists(limit, offset))
        .during(Step::PlaylistListing)?;
    let user_id = catalog.current_user_id().during(Step::PlaylistListing)?;
    let owned: Vec<Playlist> = playlists.into_iter().filter(|p| p.owner_id == user_id).collect();
    info!("Found {} user-owned playlists", owned.len());

    let mut failures = Failures::new();
    let mut counts = vec![0usize; taxonomy.len()];
    let mut changes = Vec::new();
    let mut skipped = 0;

    for playlist in &owned {
        if taxonomy.is_categorized(&playlist.name) {
            debug!("'{}' is already categorized", playlist.name);
            skipped += 1;
            continue;
        }

        let Some(sample) = failures.best_effort(Step::PlaylistSample, &playlist.name, || {
            catalog.get_playlist_track_ids(&playlist.id, SAMPLE_SIZE)
        }) else {
            skipped += 1;
            continue;
        };

        let Some(genres) = failures.best_effort(Step::GenreLookup, &playlist.name, || {
            sample_genres(catalog, &sample)
        }) else {
            skipped += 1;
            continue;
        };

        let classification = taxonomy.classify(&genres);
        let Some(category) = classification.category else {
            debug!("No category for '{}' ({} genres)", playlist.name, genres.len());
            skipped += 1;
            continue;
        };

        let new_name = request.style.rename(category, &playlist.name);
        let applied = !request.dry_run
            && failures
                .best_effort(Step::PlaylistRename, &playlist.name, || {
                    catalog.rename_playlist(&playlist.id, &new_name)
                })
                .is_some();
        debug!("'{}' -> '{new_name}' (score {})", playlist.name, classification.score);

        if let Some(slot) = taxonomy.position(&category.label) {
            counts[slot] += 1;
        }
        changes.push(PlaylistChange {
            playlist_id: playlist.id.clone(),
            original_name: playlist.name.clone(),
            new_name,
            detected_category: category.label.clone(),
            applied,
        });
    }

    let category_summary = CategorySummary(
        taxonomy
            .categories()
            .iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .map(|(c, n)| (c.label.clone(), n))
            .collect(),
    );
    info!("Categorized {} playlists, skipped {skipped}", changes.len());

    Ok(Outcome::Ready(LibrarianReport {
        playlists_analyzed: owned.len(),
        playlists_categorized: changes.len(),
        playlists_skipped: skipped,
        dry_run: request.dry_run,
        changes,
        category_summary,
        failures: failures.into_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{artist, track};
    use crate::snapshot::{Snapshot, SnapshotCatalog};

    fn playlist(id: &str, name: &str, owner: &str, tracks: &[&str]) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: name.to_string(),
            owner_id: owner.to_string(),
            track_ids: tracks.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn library() -> Snapshot {
        Snapshot {
            user_id: "me".into(),
            artists: vec![
                artist("rock", "Rockers", &["hard rock", "grunge"]),
                artist("jazz", "Cats", &["bebop"]),
                artist("folk", "Pickers", &["sea shanty"]),
            ],
            tracks: vec![
                track("r1", "Riff", 60, "rock"),
                track("r2", "Solo", 55, "rock"),
                track("j1", "Blue", 40, "jazz"),
                track("f1", "Heave", 20, "folk"),
            ],
            playlists: vec![
                playlist("p1", "Road Trip", "me", &["r1", "r2", "j1"]),
                playlist("p2", "🎸 Rock/My Mix", "me", &["j1"]),
                playlist("p3", "Late Night", "me", &["j1"]),
                playlist("p4", "Shanties", "me", &["f1"]),
                playlist("p5", "Someone Else's", "them", &["r1"]),
                playlist("p6", "Empty", "me", &[]),
            ],
            ..Snapshot::default()
        }
    }

    fn organize_with(catalog: &SnapshotCatalog, request: LibrarianRequest) -> LibrarianReport {
        organize(catalog, &Taxonomy::default(), request).unwrap().ready().unwrap()
    }

    #[test]
    fn test_dry_run_proposes_without_renaming() {
        let catalog = SnapshotCatalog::new(library());
        let report = organize_with(&catalog, LibrarianRequest::default());

        assert_eq!(report.playlists_analyzed, 5);
        assert_eq!(report.playlists_categorized, 2);
        assert_eq!(report.playlists_skipped, 3);
        assert_eq!(report.changes[0].new_name, "🎸 Rock/Road Trip");
        assert_eq!(report.changes[1].new_name, "🎷 Jazz/Late Night");
        assert!(report.changes.iter().all(|c| !c.applied));
        assert_eq!(catalog.calls("rename_playlist"), 0);
        assert_eq!(catalog.playlist("p1").unwrap().name, "Road Trip");
    }

    #[test]
    fn test_already_categorized_skipped_without_sampling() {
        let catalog = SnapshotCatalog::new(library());
        catalog.fail_on("get_playlist_track_ids", Some("p2"));

        let report = organize_with(&catalog, LibrarianRequest::default());

        assert!(report.changes.iter().all(|c| c.playlist_id != "p2"));
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_text_style_and_applied_renames() {
        let catalog = SnapshotCatalog::new(library());
        let request = LibrarianRequest {
            dry_run: false,
            style: CategoryStyle::Text,
        };

        let report = organize_with(&catalog, request);

        assert_eq!(report.changes[0].new_name, "[Rock] Road Trip");
        assert!(report.changes.iter().all(|c| c.applied));
        assert_eq!(catalog.playlist("p3").unwrap().name, "[Jazz] Late Night");
    }

    #[test]
    fn test_rename_failure_marks_change_unapplied() {
        let catalog = SnapshotCatalog::new(library());
        catalog.fail_on("rename_playlist", Some("p1"));
        let request = LibrarianRequest {
            dry_run: false,
            ..LibrarianRequest::default()
        };

        let report = organize_with(&catalog, request);

        assert!(!report.changes[0].applied);
        assert!(report.changes[1].applied);
        assert_eq!(report.failures[0].step, Step::PlaylistRename);
    }

    #[test]
    fn test_sample_and_genre_failures_count_as_skipped() {
        let catalog = SnapshotCatalog::new(library());
        catalog.fail_on("get_playlist_track_ids", Some("p1"));
        catalog.fail_on("bulk_get_artists", None);

        let report = organize_with(&catalog, LibrarianRequest::default());

        assert_eq!(report.playlists_categorized, 0);
        assert_eq!(report.playlists_skipped, 5);
        let steps: Vec<_> = report.failures.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![Step::PlaylistSample, Step::GenreLookup, Step::GenreLookup]);
    }

    #[test]
    fn test_category_summary_in_taxonomy_order() {
        let catalog = SnapshotCatalog::new(library());
        let report = organize_with(&catalog, LibrarianRequest::default());

        let labels: Vec<_> = report.category_summary.labels().collect();
        assert_eq!(labels, vec!["🎸 Rock", "🎷 Jazz"]);
        assert_eq!(report.category_summary.get("🎷 Jazz"), Some(1));

        let json = serde_json::to_string(&report.category_summary).unwrap();
        assert_eq!(json, r#"{"🎸 Rock":1,"🎷 Jazz":1}"#);
    }

    #[test]
    fn test_playlist_listing_failure_aborts() {
        let catalog = SnapshotCatalog::new(library());
        catalog.fail_on("get_user_playlists", None);
        let result = organize(&catalog, &Taxonomy::default(), LibrarianRequest::default());
        assert!(matches!(result, Err(CurationError::Catalog { step: Step::PlaylistListing, .. })));
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("text".parse::<CategoryStyle>().unwrap(), CategoryStyle::Text);
        assert!("fancy".parse::<CategoryStyle>().is_err());
    }
}
