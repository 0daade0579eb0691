//! The feature provider boundary.
//!
//! A [`FeatureProvider`] answers "what does this track sound like" for a
//! single identifier. The catalog only ever sees the resulting
//! [`FeatureRecord`]s, converted into raw catalog rows.

pub mod resilience;
pub mod spotify;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use timbre_core::{AudioFeatures, RawTrackRecord};

use crate::error::ProviderResult;

/// Genre string stored for tracks whose artist has no genres.
pub const UNKNOWN_GENRE: &str = "unknown";

/// A source of per-track audio features and metadata.
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    /// Human-readable provider name, for logs.
    fn name(&self) -> &str;

    /// Fetch the record for one track identifier.
    async fn fetch(&self, id: &str) -> ProviderResult<FeatureRecord>;
}

/// Everything the provider reports about one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: String,
    pub artist_name: String,
    pub track_name: String,
    pub features: AudioFeatures,
    pub artist_pop: i64,
    pub track_pop: i64,
    /// Genre names as the provider reports them, possibly with spaces.
    pub genres: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FeatureRecord {
    /// The space-joined genre string stored in the catalog.
    #[must_use]
    pub fn genre_string(&self) -> String {
        format_genres(&self.genres)
    }

    /// Convert into a raw catalog row.
    #[must_use]
    pub fn into_raw(self) -> RawTrackRecord {
        let genres = self.genre_string();
        let f = self.features;
        RawTrackRecord {
            artist_name: self.artist_name,
            id: self.id,
            track_name: self.track_name,
            danceability: f.danceability,
            energy: f.energy,
            key: f.key,
            loudness: f.loudness,
            mode: f.mode,
            speechiness: f.speechiness,
            acousticness: f.acousticness,
            instrumentalness: f.instrumentalness,
            liveness: f.liveness,
            valence: f.valence,
            tempo: f.tempo,
            artist_pop: Some(self.artist_pop),
            genres: Some(genres),
            track_pop: Some(self.track_pop),
        }
    }
}

/// Join provider genres into one string: spaces inside a genre become
/// underscores and genres are separated by a single space. An empty list
/// becomes [`UNKNOWN_GENRE`].
#[must_use]
pub fn format_genres(genres: &[String]) -> String {
    if genres.is_empty() {
        return UNKNOWN_GENRE.to_string();
    }
    genres
        .iter()
        .map(|genre| genre.replace(' ', "_"))
        .collect::<Vec<_>>()
        .join(" ")
}
