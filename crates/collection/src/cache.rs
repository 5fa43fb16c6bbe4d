use std::sync::Arc;

use common::Track;
use tracing::{debug, warn};

use crate::settings::{SettingsBackend, SettingsError};

pub const TRACKS_KEY: &str = "tracks";

/// Local copy of the last scan, so a session can start without the API.
///
/// Stored as the JSON array the scan endpoint returns; the tolerant track
/// number decoder needs a self-describing format.
#[derive(Clone)]
pub struct TrackCache {
    backend: Arc<dyn SettingsBackend>,
}

impl TrackCache {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self { backend }
    }

    /// Cached tracks, or `None` when nothing usable is stored.
    pub fn load(&self) -> Result<Option<Vec<Track>>, SettingsError> {
        let Some(bytes) = self.backend.read(TRACKS_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Vec<Track>>(&bytes) {
            Ok(tracks) => {
                debug!("Read {} tracks from the local cache", tracks.len());
                Ok(Some(tracks))
            }
            Err(err) => {
                warn!("Ignoring unreadable track cache: {}", err);
                Ok(None)
            }
        }
    }

    pub fn save(&self, tracks: &[Track]) -> Result<(), SettingsError> {
        let bytes = serde_json::to_vec(tracks)?;
        self.backend.write(TRACKS_KEY, &bytes)?;
        debug!("Cached {} tracks ({} bytes)", tracks.len(), bytes.len());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SettingsError> {
        self.backend.remove(TRACKS_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::{TrackCache, TRACKS_KEY};
    use crate::settings::{MemoryBackend, RedbBackend, SettingsBackend};
    use crate::testing::track;
    use std::sync::Arc;

    #[test]
    fn empty_backend_is_a_miss() {
        let cache = TrackCache::new(Arc::new(MemoryBackend::new()));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_keeps_order_and_fields() {
        let cache = TrackCache::new(Arc::new(MemoryBackend::new()));
        let mut second = track("b", "Bob", "1999", &["Rock", "Jazz"]);
        second.track_number = 7;
        let tracks = vec![track("a", "Ann", "", &[]), second];
        cache.save(&tracks).unwrap();
        assert_eq!(cache.load().unwrap(), Some(tracks));
    }

    #[test]
    fn clear_removes_the_entry() {
        let cache = TrackCache::new(Arc::new(MemoryBackend::new()));
        cache.save(&[track("a", "", "", &[])]).unwrap();
        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
        cache.clear().unwrap();
    }

    #[test]
    fn unreadable_entry_reads_as_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write(TRACKS_KEY, b"not json").unwrap();
        let cache = TrackCache::new(backend);
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn redb_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.redb");
        let tracks = vec![track("a", "Ann", "2001", &["Dub"])];
        {
            let cache = TrackCache::new(Arc::new(RedbBackend::open(&path).unwrap()));
            cache.save(&tracks).unwrap();
        }
        let cache = TrackCache::new(Arc::new(RedbBackend::open(&path).unwrap()));
        assert_eq!(cache.load().unwrap(), Some(tracks));
        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
    }
}
