//! Playlist aggregation and similarity ranking.
//!
//! A playlist is summarised as the element-wise *sum* of its members'
//! feature vectors, not their mean.
//!
//! Candidates are every catalog track outside the playlist, scored by
//! cosine similarity to the playlist vector and returned best first.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::catalog::{normalize, CanonicalFeatureTable};
use crate::error::{Error, Result};
use crate::model::{Playlist, RawTrackRecord, Recommendation, TrackRecord, NUMERIC_COLUMNS};
use crate::similarity::{cosine_similarity, norm};
use crate::vectorize::{vectorize, GenreVocabulary, VectorizedFeatureTable};

/// Number of recommendations returned when the caller does not ask for a
/// specific count.
pub const DEFAULT_TOP_K: usize = 40;

/// The summed feature vector of a playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistVector {
    vocabulary: Arc<GenreVocabulary>,
    values: Vec<f64>,
    members: usize,
}

impl PlaylistVector {
    /// Wrap an externally computed vector.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if `values` does not have the
    /// width implied by `vocabulary`.
    pub fn from_values(vocabulary: Arc<GenreVocabulary>, values: Vec<f64>) -> Result<Self> {
        let expected = NUMERIC_COLUMNS + vocabulary.len();
        if values.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            vocabulary,
            values,
            members: 0,
        })
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Arc<GenreVocabulary> {
        &self.vocabulary
    }

    /// How many catalog rows were summed into this vector.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        norm(&self.values)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

/// Split `table` into the playlist's summed vector and the remaining
/// candidate rows.
///
/// Playlist identifiers missing from the table contribute nothing; if no
/// identifier matches, the vector is all zeros.
#[must_use]
pub fn aggregate(
    table: &VectorizedFeatureTable,
    playlist: &Playlist,
) -> (PlaylistVector, VectorizedFeatureTable) {
    let ids = playlist.id_set();
    let (members, remainder) = table.partition(|row| ids.contains(row.id.as_str()));

    let mut values = vec![0.0; table.dimension()];
    for row in members.rows() {
        for (acc, x) in values.iter_mut().zip(&row.vector) {
            *acc += x;
        }
    }

    if members.len() < playlist.len() {
        log::debug!(
            "{} of {} playlist tracks are not in the catalog",
            playlist.len() - members.len(),
            playlist.len()
        );
    }

    let vector = PlaylistVector {
        vocabulary: Arc::clone(table.vocabulary()),
        values,
        members: members.len(),
    };
    (vector, remainder)
}

/// Rank candidate rows by cosine similarity to the playlist vector and
/// keep the best `k`.
///
/// Ties keep candidate table order. Fewer than `k` candidates yields all
/// of them.
///
/// # Errors
/// - [`Error::InvalidTopK`] if `k` is zero.
/// - [`Error::DimensionMismatch`] or [`Error::VocabularyMismatch`] if the
///   candidates and the playlist vector were built from different genre
///   vocabularies.
pub fn rank(
    remainder: &VectorizedFeatureTable,
    playlist_vector: &PlaylistVector,
    k: usize,
) -> Result<Vec<Recommendation>> {
    if k == 0 {
        return Err(Error::InvalidTopK);
    }
    check_compatible(remainder, playlist_vector)?;

    let target = playlist_vector.values();
    let mut scored = remainder
        .rows()
        .par_iter()
        .map(|row| {
            cosine_similarity(&row.vector, target).map(|score| Recommendation {
                id: row.id.clone(),
                score,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // `sort_by` is stable, so equal scores keep table order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);

    log::debug!(
        "Ranked {} candidates against a {}-track playlist, returning {}",
        remainder.len(),
        playlist_vector.member_count(),
        scored.len()
    );

    Ok(scored)
}

fn check_compatible(remainder: &VectorizedFeatureTable, playlist_vector: &PlaylistVector) -> Result<()> {
    if remainder.dimension() != playlist_vector.dimension() {
        return Err(Error::DimensionMismatch {
            expected: remainder.dimension(),
            found: playlist_vector.dimension(),
        });
    }
    let same_vocabulary = Arc::ptr_eq(remainder.vocabulary(), playlist_vector.vocabulary())
        || remainder.vocabulary() == playlist_vector.vocabulary();
    if !same_vocabulary {
        return Err(Error::VocabularyMismatch);
    }
    Ok(())
}

/// An immutable, vectorised catalog ready to serve recommendation
/// requests.
///
/// Cloning is cheap and clones share the underlying tables, so one
/// snapshot can serve any number of threads.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    tracks: Arc<CanonicalFeatureTable>,
    features: Arc<VectorizedFeatureTable>,
    /// Track identifier to row position in `tracks`.
    positions: Arc<HashMap<String, usize>>,
}

impl CatalogSnapshot {
    /// Normalise and vectorise raw catalog rows.
    ///
    /// # Errors
    /// Returns [`Error::MalformedRecord`] if a retained row lacks a
    /// numeric field.
    pub fn build<I>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = RawTrackRecord>,
    {
        Self::from_table(normalize(raw))
    }

    /// Vectorise an already normalised table.
    pub fn from_table(tracks: CanonicalFeatureTable) -> Result<Self> {
        let features = vectorize(&tracks)?;
        let positions = tracks
            .rows()
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.id.clone(), pos))
            .collect();
        Ok(Self {
            tracks: Arc::new(tracks),
            features: Arc::new(features),
            positions: Arc::new(positions),
        })
    }

    #[must_use]
    pub fn tracks(&self) -> &CanonicalFeatureTable {
        &self.tracks
    }

    #[must_use]
    pub fn features(&self) -> &VectorizedFeatureTable {
        &self.features
    }

    /// Look up a track by identifier in constant time.
    #[must_use]
    pub fn track(&self, id: &str) -> Option<&TrackRecord> {
        self.positions
            .get(id)
            .and_then(|pos| self.tracks.rows().get(*pos))
    }

    /// Recommend up to `k` tracks that are not in `playlist`.
    pub fn recommend(&self, playlist: &Playlist, k: usize) -> Result<Vec<Recommendation>> {
        let (vector, remainder) = aggregate(&self.features, playlist);
        if vector.member_count() == 0 {
            log::warn!("No playlist track is in the catalog; all scores will be zero");
        }
        rank(&remainder, &vector, k)
    }
}
