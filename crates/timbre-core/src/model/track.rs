use serde::{Deserialize, Serialize};

/// Names of the eleven audio attributes, in canonical column order.
pub const AUDIO_FEATURE_NAMES: [&str; 11] = [
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// Number of numeric columns that precede the genre columns in a feature
/// vector: the audio attributes plus artist and track popularity.
pub const NUMERIC_COLUMNS: usize = AUDIO_FEATURE_NAMES.len() + 2;

/// The fixed set of audio attributes reported by the feature provider.
///
/// Ranges are whatever the provider defines; values are carried through
/// unvalidated. A `None` marks a field that was missing from the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<f64>,
    pub loudness: Option<f64>,
    pub mode: Option<f64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
}

impl AudioFeatures {
    /// Build a fully populated feature set in canonical order.
    #[must_use]
    pub fn from_values(values: [f64; 11]) -> Self {
        let [danceability, energy, key, loudness, mode, speechiness, acousticness, instrumentalness, liveness, valence, tempo] =
            values;
        Self {
            danceability: Some(danceability),
            energy: Some(energy),
            key: Some(key),
            loudness: Some(loudness),
            mode: Some(mode),
            speechiness: Some(speechiness),
            acousticness: Some(acousticness),
            instrumentalness: Some(instrumentalness),
            liveness: Some(liveness),
            valence: Some(valence),
            tempo: Some(tempo),
        }
    }

    /// The attributes paired with their column names, in canonical order.
    #[must_use]
    pub fn columns(&self) -> [(&'static str, Option<f64>); 11] {
        [
            (AUDIO_FEATURE_NAMES[0], self.danceability),
            (AUDIO_FEATURE_NAMES[1], self.energy),
            (AUDIO_FEATURE_NAMES[2], self.key),
            (AUDIO_FEATURE_NAMES[3], self.loudness),
            (AUDIO_FEATURE_NAMES[4], self.mode),
            (AUDIO_FEATURE_NAMES[5], self.speechiness),
            (AUDIO_FEATURE_NAMES[6], self.acousticness),
            (AUDIO_FEATURE_NAMES[7], self.instrumentalness),
            (AUDIO_FEATURE_NAMES[8], self.liveness),
            (AUDIO_FEATURE_NAMES[9], self.valence),
            (AUDIO_FEATURE_NAMES[10], self.tempo),
        ]
    }
}

/// One row of a raw catalog file, keyed by the catalog column names.
///
/// Columns not listed here (index columns, album data, ...) are ignored
/// when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrackRecord {
    pub artist_name: String,
    pub id: String,
    pub track_name: String,
    #[serde(default)]
    pub danceability: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub key: Option<f64>,
    #[serde(default)]
    pub loudness: Option<f64>,
    #[serde(default)]
    pub mode: Option<f64>,
    #[serde(default)]
    pub speechiness: Option<f64>,
    #[serde(default)]
    pub acousticness: Option<f64>,
    #[serde(default)]
    pub instrumentalness: Option<f64>,
    #[serde(default)]
    pub liveness: Option<f64>,
    #[serde(default)]
    pub valence: Option<f64>,
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub artist_pop: Option<i64>,
    /// Space-joined genre tokens.
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub track_pop: Option<i64>,
}

impl RawTrackRecord {
    #[must_use]
    pub fn features(&self) -> AudioFeatures {
        AudioFeatures {
            danceability: self.danceability,
            energy: self.energy,
            key: self.key,
            loudness: self.loudness,
            mode: self.mode,
            speechiness: self.speechiness,
            acousticness: self.acousticness,
            instrumentalness: self.instrumentalness,
            liveness: self.liveness,
            valence: self.valence,
            tempo: self.tempo,
        }
    }

    /// The deduplication key: artist name immediately followed by track
    /// name, compared exactly.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!("{}{}", self.artist_name, self.track_name)
    }
}

/// A track restricted to the canonical attribute set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: String,
    pub artist_name: String,
    pub track_name: String,
    pub features: AudioFeatures,
    pub artist_pop: Option<i64>,
    pub track_pop: Option<i64>,
    /// Genre tokens, lowercase with underscores in place of spaces.
    pub genres: Vec<String>,
}

impl TrackRecord {
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!("{}{}", self.artist_name, self.track_name)
    }

    /// Convert back into a raw catalog row, joining genre tokens with a
    /// single space.
    #[must_use]
    pub fn to_raw(&self) -> RawTrackRecord {
        let f = self.features;
        RawTrackRecord {
            artist_name: self.artist_name.clone(),
            id: self.id.clone(),
            track_name: self.track_name.clone(),
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
            artist_pop: self.artist_pop,
            genres: Some(self.genres.join(" ")),
            track_pop: self.track_pop,
        }
    }
}
