use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered set of track identifiers used as a recommendation query.
///
/// Identifiers that are not in the catalog are kept; they simply
/// contribute nothing when the playlist is aggregated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    ids: Vec<String>,
}

impl Playlist {
    /// Build a playlist, dropping repeated identifiers but keeping the
    /// order of first appearance.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let ids = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| seen.insert(id.clone()))
            .collect();
        Self { ids }
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|candidate| candidate == id)
    }

    /// The identifiers as a set, for membership tests over large tables.
    #[must_use]
    pub fn id_set(&self) -> HashSet<&str> {
        self.ids.iter().map(String::as_str).collect()
    }
}

/// A recommended track and its cosine similarity to the playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub score: f64,
}
