//! Genre vectorisation.
//!
//! Expands each track's genre tokens into one binary column per distinct
//! token in the catalog, producing purely numeric feature rows.
//!
//! Column layout of every vector:
//!
//! | columns | content |
//! |---------|---------|
//! | 0..11   | audio attributes, canonical order |
//! | 11      | artist popularity |
//! | 12      | track popularity |
//! | 13..    | one column per vocabulary token, vocabulary order |

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::CanonicalFeatureTable;
use crate::error::{Error, Result};
use crate::model::{TrackRecord, AUDIO_FEATURE_NAMES, NUMERIC_COLUMNS};

/// The distinct genre tokens of a catalog, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct GenreVocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl GenreVocabulary {
    /// Collect the vocabulary of a canonical table.
    #[must_use]
    pub fn from_table(table: &CanonicalFeatureTable) -> Self {
        let mut vocabulary = Self::default();
        for token in table.rows().iter().flat_map(|row| row.genres.iter()) {
            vocabulary.insert(token);
        }
        vocabulary
    }

    fn insert(&mut self, token: &str) {
        if !self.index.contains_key(token) {
            self.index.insert(token.to_string(), self.tokens.len());
            self.tokens.push(token.to_string());
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Column offset of a token within the genre block.
    #[must_use]
    pub fn position(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// One-hot encode a token list against this vocabulary.
    ///
    /// Tokens outside the vocabulary are ignored.
    #[must_use]
    pub fn encode(&self, tokens: &[String]) -> Vec<f64> {
        let mut encoded = vec![0.0; self.tokens.len()];
        for token in tokens {
            if let Some(pos) = self.position(token) {
                encoded[pos] = 1.0;
            }
        }
        encoded
    }
}

impl PartialEq for GenreVocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for GenreVocabulary {}

/// A track's identifier and its numeric feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: String,
    pub vector: Vec<f64>,
}

/// A fully numeric catalog snapshot.
///
/// Every row has width `NUMERIC_COLUMNS + vocabulary.len()`. Tables
/// derived from one another (e.g. a playlist remainder) share the same
/// vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizedFeatureTable {
    vocabulary: Arc<GenreVocabulary>,
    rows: Vec<FeatureRow>,
}

impl VectorizedFeatureTable {
    /// Assemble a table from pre-built rows.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if any row's width does not
    /// match the vocabulary.
    pub fn from_rows(vocabulary: Arc<GenreVocabulary>, rows: Vec<FeatureRow>) -> Result<Self> {
        let expected = NUMERIC_COLUMNS + vocabulary.len();
        if let Some(row) = rows.iter().find(|row| row.vector.len() != expected) {
            return Err(Error::DimensionMismatch {
                expected,
                found: row.vector.len(),
            });
        }
        Ok(Self { vocabulary, rows })
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Arc<GenreVocabulary> {
        &self.vocabulary
    }

    #[must_use]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of every row vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        NUMERIC_COLUMNS + self.vocabulary.len()
    }

    /// Column names in vector order; genre columns are prefixed `genre:`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        AUDIO_FEATURE_NAMES
            .iter()
            .map(|name| (*name).to_string())
            .chain(["artist_pop".to_string(), "track_pop".to_string()])
            .chain(self.vocabulary.tokens().iter().map(|t| format!("genre:{t}")))
            .collect()
    }

    /// Split into the rows matching `predicate` and the rest, both sharing
    /// this table's vocabulary. Row order is preserved on both sides.
    #[must_use]
    pub fn partition<F>(&self, predicate: F) -> (Self, Self)
    where
        F: Fn(&FeatureRow) -> bool,
    {
        let (matching, rest): (Vec<FeatureRow>, Vec<FeatureRow>) =
            self.rows.iter().cloned().partition(|row| predicate(row));
        (
            Self {
                vocabulary: Arc::clone(&self.vocabulary),
                rows: matching,
            },
            Self {
                vocabulary: Arc::clone(&self.vocabulary),
                rows: rest,
            },
        )
    }
}

/// Vectorise a canonical table.
///
/// The vocabulary is rebuilt from the table on every call, so repeated
/// calls on the same table produce identical columns.
///
/// # Errors
/// Returns [`Error::MalformedRecord`] naming the first track with a
/// missing numeric field.
pub fn vectorize(table: &CanonicalFeatureTable) -> Result<VectorizedFeatureTable> {
    let vocabulary = GenreVocabulary::from_table(table);
    log::info!(
        "Vectorising {} tracks with {} genre columns",
        table.len(),
        vocabulary.len()
    );

    let rows = table
        .rows()
        .iter()
        .map(|track| feature_row(track, &vocabulary))
        .collect::<Result<Vec<_>>>()?;

    Ok(VectorizedFeatureTable {
        vocabulary: Arc::new(vocabulary),
        rows,
    })
}

#[allow(clippy::cast_precision_loss)]
fn feature_row(track: &TrackRecord, vocabulary: &GenreVocabulary) -> Result<FeatureRow> {
    let missing = |field: &'static str| Error::MalformedRecord {
        id: track.id.clone(),
        field,
    };

    let mut vector = Vec::with_capacity(NUMERIC_COLUMNS + vocabulary.len());
    for (name, value) in track.features.columns() {
        vector.push(value.ok_or_else(|| missing(name))?);
    }
    vector.push(track.artist_pop.ok_or_else(|| missing("artist_pop"))? as f64);
    vector.push(track.track_pop.ok_or_else(|| missing("track_pop"))? as f64);
    vector.extend(vocabulary.encode(&track.genres));

    Ok(FeatureRow {
        id: track.id.clone(),
        vector,
    })
}
