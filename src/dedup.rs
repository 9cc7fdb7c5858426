//! Collapse re-releases of the same song to one canonical track.

use crate::catalog::Track;
use log::debug;
use std::collections::HashMap;

/// Case-insensitive title key shared by every release of a song.
pub fn dedup_key(track: &Track) -> String {
    track.name.to_lowercase()
}

/// Keep one track per [`dedup_key`], preferring the highest popularity.
///
/// Single left-to-right pass: a later track replaces the kept one only when
/// strictly more popular, so the first seen wins exact ties. The result lists
/// keys in order of first appearance; callers sort as they need.
pub fn dedupe(tracks: &[Track]) -> Vec<Track> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(tracks.len());
    let mut best: Vec<&Track> = Vec::new();

    for track in tracks {
        match slots.get(&dedup_key(track)) {
            Some(&slot) => {
                if track.popularity() > best[slot].popularity() {
                    best[slot] = track;
                }
            }
            None => {
                slots.insert(dedup_key(track), best.len());
                best.push(track);
            }
        }
    }

    debug!("Deduplicated {} tracks down to {}", tracks.len(), best.len());
    best.into_iter().cloned().collect()
}
