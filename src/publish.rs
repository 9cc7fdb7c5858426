//! Create a playlist and fill it, honoring the per-call add ceiling.

use crate::bulk;
use crate::catalog::{Catalog, PLAYLIST_ADD_LIMIT};
use crate::outcome::{CurationError, RequiredStep, Step};
use log::info;
use serde::Serialize;

/// A playlist written back to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSummary {
    pub name: String,
    pub id: String,
    pub track_count: usize,
}

/// Create `name` and add `track_ids` in order.
///
/// The playlist is created even when there is nothing to add. Creation and
/// population are separate calls: if an add fails the playlist stays behind
/// partially filled and the error is returned.
pub fn publish_playlist<C: Catalog + ?Sized>(
    catalog: &C,
    name: &str,
    description: &str,
    track_ids: &[String],
) -> Result<PlaylistSummary, CurationError> {
    let playlist = catalog
        .create_playlist(name, description, true)
        .during(Step::PlaylistCreation)?;

    bulk::for_each_chunk(track_ids, PLAYLIST_ADD_LIMIT, |chunk| {
        catalog.add_tracks(&playlist.id, chunk)
    })
    .during(Step::PlaylistPopulation)?;

    info!("Created playlist '{}' ({}) with {} tracks", playlist.name, playlist.id, track_ids.len());
    Ok(PlaylistSummary {
        name: playlist.name,
        id: playlist.id,
        track_count: track_ids.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Snapshot, SnapshotCatalog};

    #[test]
    fn test_adds_in_chunks_of_one_hundred() {
        let catalog = SnapshotCatalog::new(Snapshot::default());
        let ids: Vec<String> = (0..230).map(|i| format!("t{i}")).collect();

        let summary = publish_playlist(&catalog, "Everything", "all of it", &ids).unwrap();

        assert_eq!(summary.track_count, 230);
        assert_eq!(catalog.calls("add_tracks"), 3);
        assert_eq!(catalog.playlist(&summary.id).unwrap().track_ids, ids);
    }

    #[test]
    fn test_empty_playlist_still_created() {
        let catalog = SnapshotCatalog::new(Snapshot::default());
        let summary = publish_playlist(&catalog, "Nothing", "", &[]).unwrap();
        assert_eq!(summary.track_count, 0);
        assert_eq!(catalog.calls("create_playlist"), 1);
        assert_eq!(catalog.calls("add_tracks"), 0);
    }

    #[test]
    fn test_population_failure_leaves_playlist_behind() {
        let catalog = SnapshotCatalog::new(Snapshot::default());
        catalog.fail_on("add_tracks", None);
        let ids = vec!["t1".to_string()];

        let err = publish_playlist(&catalog, "Half", "", &ids).unwrap_err();

        assert!(matches!(err, CurationError::Catalog { step: Step::PlaylistPopulation, .. }));
        assert_eq!(catalog.playlists().len(), 1);
    }
}
