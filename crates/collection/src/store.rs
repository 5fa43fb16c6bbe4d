use std::collections::HashMap;
use std::sync::Arc;

use common::Track;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::genres::GenreIndex;
use crate::CollectionError;

pub type SharedTrackStore = Arc<RwLock<TrackStore>>;

/// Canonical set of scanned tracks, in scan order.
#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: Vec<Track>,
    positions: HashMap<String, usize>,
    genres: GenreIndex,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedTrackStore {
        Arc::new(RwLock::new(self))
    }

    /// Swaps in a fresh scan and re-derives the genre vocabulary.
    ///
    /// A repeated id keeps its first record; later ones are dropped.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        let mut positions = HashMap::with_capacity(tracks.len());
        let mut kept = Vec::with_capacity(tracks.len());
        for track in tracks {
            if positions.contains_key(&track.id) {
                warn!("Duplicate track id {} for {}; skipping", track.id, track.file);
                continue;
            }
            positions.insert(track.id.clone(), kept.len());
            kept.push(track);
        }

        self.tracks = kept;
        self.positions = positions;
        self.genres.rebuild(&self.tracks);
        info!(
            "Track store loaded: {} tracks, {} genres",
            self.tracks.len(),
            self.genres.len()
        );
    }

    pub fn get(&self, track_id: &str) -> Result<&Track, CollectionError> {
        self.positions
            .get(track_id)
            .map(|&pos| &self.tracks[pos])
            .ok_or_else(|| CollectionError::NotFound(track_id.to_string()))
    }

    pub(crate) fn get_mut(&mut self, track_id: &str) -> Result<&mut Track, CollectionError> {
        match self.positions.get(track_id) {
            Some(&pos) => Ok(&mut self.tracks[pos]),
            None => Err(CollectionError::NotFound(track_id.to_string())),
        }
    }

    pub fn all(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn genres(&self) -> &GenreIndex {
        &self.genres
    }

    pub fn genres_mut(&mut self) -> &mut GenreIndex {
        &mut self.genres
    }
}
