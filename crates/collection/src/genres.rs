use std::collections::BTreeSet;

use common::Track;

use crate::CollectionError;

/// Sorted vocabulary of every genre label known to the session.
///
/// Labels derived from tracks are replaced wholesale on [`GenreIndex::rebuild`];
/// labels added through [`GenreIndex::add_reserved`] survive rebuilds so a
/// label created before tagging anything is not lost on the next scan.
#[derive(Clone, Debug, Default)]
pub struct GenreIndex {
    derived: BTreeSet<String>,
    reserved: BTreeSet<String>,
}

impl GenreIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, tracks: &[Track]) {
        self.derived = tracks
            .iter()
            .flat_map(|track| track.genres.iter())
            .filter(|genre| !genre.is_empty())
            .cloned()
            .collect();
    }

    /// Adds a label no track carries yet. Matching is exact and case-sensitive.
    pub fn add_reserved(&mut self, name: &str) -> Result<(), CollectionError> {
        if self.contains(name) {
            return Err(CollectionError::Conflict(name.to_string()));
        }
        if name.is_empty() {
            return Err(CollectionError::configuration("genre name is empty"));
        }
        self.reserved.insert(name.to_string());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.derived.contains(name) || self.reserved.contains(name)
    }

    /// All labels, ascending by ordinal string comparison.
    pub fn genres(&self) -> Vec<&str> {
        self.derived
            .union(&self.reserved)
            .map(|genre| genre.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.derived.union(&self.reserved).count()
    }

    pub fn is_empty(&self) -> bool {
        self.derived.is_empty() && self.reserved.is_empty()
    }
}
