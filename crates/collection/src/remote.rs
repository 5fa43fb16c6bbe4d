use std::future::Future;

use common::Track;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanSource {
    /// Walk the music tree again.
    Fresh,
    /// Reuse the last scan result when the server has one.
    Cached,
}

impl ScanSource {
    pub fn path(self) -> &'static str {
        match self {
            ScanSource::Fresh => "scan",
            ScanSource::Cached => "scan/cached",
        }
    }
}

/// The request/response contract of the scan and genre API.
pub trait TrackService: Send + Sync {
    fn fetch_tracks(
        &self,
        source: ScanSource,
    ) -> impl Future<Output = Result<Vec<Track>, RemoteError>> + Send;

    fn update_genres(
        &self,
        track_id: &str,
        genres: &[String],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

#[derive(Serialize)]
struct GenresUpdate<'a> {
    track_id: &'a str,
    genres: &'a [String],
}

#[derive(Clone)]
pub struct HttpTrackService {
    client: Client,
    base_url: String,
}

impl HttpTrackService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl TrackService for HttpTrackService {
    async fn fetch_tracks(&self, source: ScanSource) -> Result<Vec<Track>, RemoteError> {
        let url = self.url(source.path());
        debug!("Fetching tracks from {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(response.json::<Vec<Track>>().await?)
    }

    async fn update_genres(&self, track_id: &str, genres: &[String]) -> Result<(), RemoteError> {
        let url = self.url(&format!("track/{}/genres", track_id));
        let body = GenresUpdate { track_id, genres };
        let response = self.client.post(&url).json(&body).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status(response.status().as_u16()))
        }
    }
}

#[derive(Debug)]
pub enum RemoteError {
    Transport(reqwest::Error),
    Status(u16),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err)
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Transport(err) => write!(f, "transport error: {}", err),
            RemoteError::Status(code) => write!(f, "http {}", code),
        }
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemoteError::Transport(err) => Some(err),
            RemoteError::Status(_) => None,
        }
    }
}
