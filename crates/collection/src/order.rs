use std::borrow::Cow;
use std::cmp::Ordering;

use common::Track;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CollectionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Artist,
    Album,
    TrackNumber,
    Title,
    Year,
    File,
}

impl SortField {
    pub fn parse(value: &str) -> Result<Self, CollectionError> {
        match value {
            "artist" => Ok(Self::Artist),
            "album" => Ok(Self::Album),
            "trackNumber" => Ok(Self::TrackNumber),
            "title" => Ok(Self::Title),
            "year" => Ok(Self::Year),
            "file" => Ok(Self::File),
            other => Err(CollectionError::configuration(format!(
                "unknown sort field: {:?}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Album => "album",
            Self::TrackNumber => "trackNumber",
            Self::Title => "title",
            Self::Year => "year",
            Self::File => "file",
        }
    }

    /// How the column is compared when the caller does not say.
    pub fn default_kind(self) -> ValueKind {
        match self {
            Self::TrackNumber | Self::Year => ValueKind::Numeric,
            _ => ValueKind::Text,
        }
    }

    fn text(self, track: &Track) -> Cow<'_, str> {
        match self {
            Self::Artist => Cow::Borrowed(&track.artist),
            Self::Album => Cow::Borrowed(&track.album),
            Self::TrackNumber => Cow::Owned(track.track_number.to_string()),
            Self::Title => Cow::Borrowed(track.display_title()),
            Self::Year => Cow::Borrowed(&track.year),
            Self::File => Cow::Borrowed(&track.file),
        }
    }

    fn number(self, track: &Track) -> f64 {
        match self {
            Self::TrackNumber => f64::from(track.track_number),
            _ => coerce_number(&self.text(track)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "int")]
    Numeric,
    #[serde(rename = "text")]
    Text,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    /// Stored with the key but not consulted yet; every pass sorts ascending.
    pub asc: bool,
}

impl SortKey {
    pub fn new(field: SortField, kind: ValueKind) -> Self {
        Self {
            field,
            kind,
            asc: true,
        }
    }

    fn compare(&self, a: &Track, b: &Track) -> Ordering {
        match self.kind {
            ValueKind::Numeric => self.field.number(a).total_cmp(&self.field.number(b)),
            ValueKind::Text => self.field.text(a).cmp(&self.field.text(b)),
        }
    }
}

/// Runs one full stable sort per key, oldest key first.
///
/// The last pushed key therefore decides the final order, and ties fall back
/// to whatever order the earlier keys left behind. Repeated fields are not
/// collapsed; each occurrence is its own pass.
pub fn apply(tracks: &mut [&Track], stack: &[SortKey]) {
    for key in stack {
        debug!("Sorting {} tracks by {}", tracks.len(), key.field.as_str());
        tracks.sort_by(|a, b| key.compare(a, b));
    }
}

/// Fields of the stack, most recent first, the way the order is shown.
pub fn describe(stack: &[SortKey]) -> String {
    if stack.is_empty() {
        return "Default".to_string();
    }
    stack
        .iter()
        .rev()
        .map(|key| key.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn coerce_number(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}
