use common::Track;
use serde::{Deserialize, Serialize};

use crate::CollectionError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    #[default]
    Any,
    Artist,
    Album,
    Title,
    Year,
    Genre,
}

impl FilterField {
    pub fn parse(value: &str) -> Result<Self, CollectionError> {
        match value {
            "any" => Ok(Self::Any),
            "artist" => Ok(Self::Artist),
            "album" => Ok(Self::Album),
            "title" => Ok(Self::Title),
            "year" => Ok(Self::Year),
            "genre" => Ok(Self::Genre),
            other => Err(CollectionError::configuration(format!(
                "unknown filter field: {:?}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Title => "title",
            Self::Year => "year",
            Self::Genre => "genre",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub field: FilterField,
    pub keyword: String,
}

impl FilterSpec {
    pub fn new(field: FilterField, keyword: impl Into<String>) -> Self {
        Self {
            field,
            keyword: keyword.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
    }
}

/// Keeps the tracks matching `spec`, in input order.
///
/// Matching is a case-insensitive substring test. A year keyword holding a
/// `-` is an inclusive range compared as strings, split at the first `-`.
pub fn apply<'a, I>(tracks: I, spec: &FilterSpec) -> Vec<&'a Track>
where
    I: IntoIterator<Item = &'a Track>,
{
    if spec.keyword.is_empty() {
        return tracks.into_iter().collect();
    }
    let keyword = spec.keyword.to_lowercase();
    tracks
        .into_iter()
        .filter(|track| matches(track, spec.field, &keyword))
        .collect()
}

fn matches(track: &Track, field: FilterField, keyword: &str) -> bool {
    let contains = |value: &str| value.to_lowercase().contains(keyword);
    match field {
        FilterField::Any => {
            contains(&track.artist)
                || contains(&track.album)
                || contains(track.display_title())
                || contains(&track.year)
                || contains(&track.genre_summary())
        }
        FilterField::Artist => contains(&track.artist),
        FilterField::Album => contains(&track.album),
        FilterField::Title => contains(track.display_title()),
        FilterField::Year => match keyword.split_once('-') {
            Some((lower, upper)) => {
                let year = track.year.to_lowercase();
                lower <= year.as_str() && year.as_str() <= upper
            }
            None => contains(&track.year),
        },
        FilterField::Genre => contains(&track.genre_summary()),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, FilterField, FilterSpec};
    use crate::CollectionError;
    use common::Track;

    fn track(id: &str, artist: &str, year: &str, genres: &[&str]) -> Track {
        let mut track = Track::from_relpath(format!("{}.mp3", id));
        track.id = id.to_string();
        track.artist = artist.to_string();
        track.year = year.to_string();
        track.genres = genres.iter().map(|g| g.to_string()).collect();
        track
    }

    fn ids(tracks: &[&Track]) -> Vec<String> {
        tracks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn empty_keyword_keeps_everything_in_order() {
        let tracks = vec![
            track("c", "Zed", "2001", &[]),
            track("a", "Abe", "1990", &[]),
            track("b", "Bo", "", &[]),
        ];
        for field in [
            FilterField::Any,
            FilterField::Artist,
            FilterField::Year,
            FilterField::Genre,
        ] {
            let out = apply(&tracks, &FilterSpec::new(field, ""));
            assert_eq!(ids(&out), vec!["c", "a", "b"]);
        }
    }

    #[test]
    fn year_range_uses_string_bounds() {
        let tracks = vec![
            track("a", "", "1985", &[]),
            track("b", "", "1990", &[]),
            track("c", "", "1999", &[]),
            track("d", "", "2001", &[]),
        ];
        let out = apply(&tracks, &FilterSpec::new(FilterField::Year, "1990-1999"));
        assert_eq!(ids(&out), vec!["b", "c"]);
    }

    #[test]
    fn year_without_separator_is_substring() {
        let tracks = vec![track("a", "", "1985", &[]), track("b", "", "1995", &[])];
        let out = apply(&tracks, &FilterSpec::new(FilterField::Year, "98"));
        assert_eq!(ids(&out), vec!["a"]);
    }

    #[test]
    fn artist_match_is_case_insensitive() {
        let tracks = vec![track("a", "ABBA", "", &[]), track("b", "Queen", "", &[])];
        let out = apply(&tracks, &FilterSpec::new(FilterField::Artist, "Bb"));
        assert_eq!(ids(&out), vec!["a"]);
    }

    #[test]
    fn any_searches_every_column_including_genres() {
        let mut titled = track("t", "", "", &[]);
        titled.title = "Blue Train".to_string();
        let tracks = vec![
            track("a", "Bluesman", "", &[]),
            track("g", "", "", &["Rock", "Blues"]),
            titled,
            track("x", "Nobody", "2000", &["Jazz"]),
        ];
        let out = apply(&tracks, &FilterSpec::new(FilterField::Any, "blue"));
        assert_eq!(ids(&out), vec!["a", "g", "t"]);
    }

    #[test]
    fn genre_matches_across_joined_list() {
        let tracks = vec![track("a", "", "", &["Rock", "Pop"]), track("b", "", "", &["Jazz"])];
        let out = apply(&tracks, &FilterSpec::new(FilterField::Genre, "rock, pop"));
        assert_eq!(ids(&out), vec!["a"]);
    }

    #[test]
    fn untitled_tracks_match_on_file() {
        let tracks = vec![track("song", "", "", &[])];
        let out = apply(&tracks, &FilterSpec::new(FilterField::Title, "SONG.mp3"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unknown_field_fails_fast() {
        assert_eq!(FilterField::parse("album").unwrap(), FilterField::Album);
        let err = FilterField::parse("composer").unwrap_err();
        assert!(matches!(err, CollectionError::Configuration(_)));
        assert!(FilterField::parse(" any ").is_err());
        assert!(FilterField::parse("Artist").is_err());
    }
}
