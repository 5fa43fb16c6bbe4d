use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

use common::Track;
use parking_lot::Mutex;

use crate::remote::{RemoteError, ScanSource, TrackService};
use crate::settings::{MemoryBackend, SettingsBackend, SettingsError};

pub(crate) fn track(id: &str, artist: &str, year: &str, genres: &[&str]) -> Track {
    let mut track = Track::from_relpath(format!("{}.mp3", id));
    track.id = id.to_string();
    track.artist = artist.to_string();
    track.year = year.to_string();
    track.genres = genres.iter().map(|g| g.to_string()).collect();
    track
}

/// In-process stand-in for the scan and genre API.
#[derive(Default)]
pub(crate) struct FakeService {
    tracks: Mutex<Vec<Track>>,
    fetches: Mutex<Vec<ScanSource>>,
    requests: Mutex<Vec<(String, Vec<String>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_status: AtomicU16,
}

impl FakeService {
    pub(crate) fn with_tracks(tracks: Vec<Track>) -> Self {
        let service = Self::default();
        *service.tracks.lock() = tracks;
        service
    }

    pub(crate) fn set_tracks(&self, tracks: Vec<Track>) {
        *self.tracks.lock() = tracks;
    }

    pub(crate) fn fail_with(&self, status: u16) {
        self.fail_status.store(status, Ordering::SeqCst);
    }

    pub(crate) fn fetches(&self) -> Vec<ScanSource> {
        self.fetches.lock().clone()
    }

    pub(crate) fn requests(&self) -> Vec<(String, Vec<String>)> {
        self.requests.lock().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl TrackService for FakeService {
    async fn fetch_tracks(&self, source: ScanSource) -> Result<Vec<Track>, RemoteError> {
        self.fetches.lock().push(source);
        Ok(self.tracks.lock().clone())
    }

    async fn update_genres(&self, track_id: &str, genres: &[String]) -> Result<(), RemoteError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.requests
            .lock()
            .push((track_id.to_string(), genres.to_vec()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.fail_status.load(Ordering::SeqCst) {
            0 => Ok(()),
            status => Err(RemoteError::Status(status)),
        }
    }
}

/// Memory backend whose writes can be switched to fail.
#[derive(Default)]
pub(crate) struct FlakyBackend {
    inner: MemoryBackend,
    fail_writes: AtomicBool,
}

impl FlakyBackend {
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SettingsBackend for FlakyBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SettingsError> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), SettingsError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SettingsError::Io(io::Error::new(
                io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.inner.remove(key)
    }
}
