//! Small constructors shared by the unit tests.

use crate::catalog::{AlbumType, Artist, ArtistRef, Track};
use crate::snapshot::AlbumRecord;

pub fn artist(id: &str, name: &str, genres: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

pub fn track(id: &str, name: &str, popularity: i64, artist_id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
        raw_popularity: Some(popularity),
        release_date: "2020-01-01".to_string(),
        album_type: AlbumType::Album,
        album_name: String::new(),
        artist: Some(ArtistRef {
            id: artist_id.to_string(),
            name: format!("Artist {artist_id}"),
        }),
        duration_ms: 180_000,
    }
}

pub fn album(id: &str, artist_id: &str, album_type: AlbumType, released: &str, track_ids: &[&str]) -> AlbumRecord {
    AlbumRecord {
        id: id.to_string(),
        name: format!("Album {id}"),
        album_type,
        release_date: released.to_string(),
        artist_id: artist_id.to_string(),
        track_ids: track_ids.iter().map(|t| t.to_string()).collect(),
    }
}

pub trait TrackExt {
    fn released(self, date: &str) -> Track;
    fn lasting(self, duration_ms: u64) -> Track;
}

impl TrackExt for Track {
    fn released(mut self, date: &str) -> Track {
        self.release_date = date.to_string();
        self
    }

    fn lasting(mut self, duration_ms: u64) -> Track {
        self.duration_ms = duration_ms;
        self
    }
}
