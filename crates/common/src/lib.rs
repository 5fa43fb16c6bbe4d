use serde::{Deserialize, Deserializer, Serialize};

/// One scanned audio file, as produced by the scan collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub file: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub year: String,
    #[serde(default, deserialize_with = "track_number_from_any")]
    pub track_number: u32,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Track {
    /// Builds a track whose id is derived from its relative file path.
    pub fn from_relpath(file: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            id: stable_id(&file),
            file,
            title: String::new(),
            album: String::new(),
            artist: String::new(),
            year: String::new(),
            track_number: 0,
            genres: Vec::new(),
        }
    }

    /// Title shown to the user; untitled tracks fall back to their file path.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.file
        } else {
            &self.title
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn genre_summary(&self) -> String {
        self.genres.join(", ")
    }
}

pub fn stable_id(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

// Scanners disagree on the type: some send 7, others "7" or "7/12".
fn track_number_from_any<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => u32::try_from(n).unwrap_or(0),
        Raw::Text(text) => parse_track_number(&text),
        Raw::Other(_) => 0,
    };
    Ok(value)
}

fn parse_track_number(text: &str) -> u32 {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{stable_id, Track};

    #[test]
    fn stable_id_is_deterministic() {
        let first = stable_id("Artist/Album/Track.mp3");
        let second = stable_id("Artist/Album/Track.mp3");
        assert_eq!(first, second);
        assert_ne!(first, stable_id("Artist/Album/Track2.mp3"));
    }

    #[test]
    fn untitled_track_displays_file() {
        let mut track = Track::from_relpath("x.mp3");
        assert_eq!(track.display_title(), "x.mp3");
        track.title = "Song".to_string();
        assert_eq!(track.display_title(), "Song");
    }

    #[test]
    fn decodes_scan_record() {
        let json = r#"{"id":"abc","file":"x.mp3","title":"","album":"B","artist":"A",
            "year":"2000","trackNumber":1,"genres":["Rock"]}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.id, "abc");
        assert_eq!(track.track_number, 1);
        assert_eq!(track.genres, vec!["Rock".to_string()]);
    }

    #[test]
    fn tolerates_textual_track_numbers() {
        let json = r#"{"id":"a","file":"a.m4a","trackNumber":"3/12"}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.track_number, 3);
        assert!(track.genres.is_empty());

        let json = r#"{"id":"b","file":"b.mp3","trackNumber":""}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.track_number, 0);
    }

    #[test]
    fn encodes_camel_case_fields() {
        let track = Track::from_relpath("a.mp3");
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"trackNumber\":0"));
    }
}
