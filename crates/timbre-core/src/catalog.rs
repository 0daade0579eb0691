//! Catalog normalisation.
//!
//! Turns raw catalog rows into a [`CanonicalFeatureTable`]: one row per
//! distinct track, restricted to the canonical attribute set, with the
//! space-joined genre string split into tokens.
//!
//! Two rows describe the same track when their artist name and track name
//! concatenate to the same string (exact, case-sensitive, no trimming).
//! Within such a group the row with the lexicographically smallest
//! identifier is kept, skipping identifiers already claimed by a group
//! that appeared earlier in the input. Retained rows keep their input
//! order.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{RawTrackRecord, TrackRecord};

/// The deduplicated, projected track catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFeatureTable {
    rows: Vec<TrackRecord>,
}

impl CanonicalFeatureTable {
    #[must_use]
    pub fn rows(&self) -> &[TrackRecord] {
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

    /// Look up a track by identifier with a linear scan. Use
    /// [`CatalogSnapshot::track`](crate::CatalogSnapshot::track) for
    /// repeated lookups.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TrackRecord> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// The table as raw catalog rows, e.g. for saving or re-normalising.
    #[must_use]
    pub fn to_raw(&self) -> Vec<RawTrackRecord> {
        self.rows.iter().map(TrackRecord::to_raw).collect()
    }
}

impl<'a> IntoIterator for &'a CanonicalFeatureTable {
    type Item = &'a TrackRecord;
    type IntoIter = std::slice::Iter<'a, TrackRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Normalise raw catalog rows into a canonical feature table.
///
/// Numeric fields are carried through as-is; missing values only surface
/// once the table is vectorised.
pub fn normalize<I>(raw: I) -> CanonicalFeatureTable
where
    I: IntoIterator<Item = RawTrackRecord>,
{
    let raw: Vec<RawTrackRecord> = raw.into_iter().collect();
    let total = raw.len();

    // Row indices per dedup key, groups in order of first appearance.
    let mut group_of: HashMap<String, usize> = HashMap::with_capacity(total);
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, record) in raw.iter().enumerate() {
        let group = *group_of.entry(record.dedup_key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(idx);
    }

    // Each group keeps its smallest identifier not already claimed by an
    // earlier group.
    let mut claimed: HashSet<&str> = HashSet::with_capacity(groups.len());
    let mut keep = vec![false; total];
    for members in &mut groups {
        members.sort_by(|a, b| raw[*a].id.cmp(&raw[*b].id).then(a.cmp(b)));
        match members.iter().find(|idx| !claimed.contains(raw[**idx].id.as_str())) {
            Some(&winner) => {
                claimed.insert(raw[winner].id.as_str());
                keep[winner] = true;
            }
            None => {
                let first = &raw[members[0]];
                log::warn!(
                    "Dropping track {} - {}: every identifier is already used by another track",
                    first.artist_name,
                    first.track_name
                );
            }
        }
    }

    let mut rows = Vec::with_capacity(groups.len());
    for (record, kept) in raw.into_iter().zip(keep) {
        if kept {
            rows.push(canonicalize(record));
        } else {
            log::debug!(
                "Dropping duplicate track {} ({} - {})",
                record.id,
                record.artist_name,
                record.track_name
            );
        }
    }

    log::info!(
        "Normalised catalog: {} of {} rows retained",
        rows.len(),
        total
    );

    CanonicalFeatureTable { rows }
}

fn canonicalize(record: RawTrackRecord) -> TrackRecord {
    let features = record.features();
    let genres = record
        .genres
        .as_deref()
        .map(split_genres)
        .unwrap_or_default();
    TrackRecord {
        id: record.id,
        artist_name: record.artist_name,
        track_name: record.track_name,
        features,
        artist_pop: record.artist_pop,
        track_pop: record.track_pop,
        genres,
    }
}

/// Split a space-joined genre string into tokens.
///
/// Empty tokens (from an empty string or repeated spaces) are dropped.
#[must_use]
pub fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Read a raw catalog from a JSON array of row objects.
pub fn load_raw_catalog(path: &Path) -> Result<Vec<RawTrackRecord>> {
    let file = File::open(path)?;
    let rows: Vec<RawTrackRecord> = serde_json::from_reader(BufReader::new(file))?;
    log::debug!("Loaded {} catalog rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Write raw catalog rows as a JSON array.
pub fn save_raw_catalog(path: &Path, rows: &[RawTrackRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, artist: &str, track: &str, genres: Option<&str>) -> RawTrackRecord {
        RawTrackRecord {
            artist_name: artist.to_string(),
            id: id.to_string(),
            track_name: track.to_string(),
            danceability: Some(0.5),
            energy: Some(0.6),
            key: Some(5.0),
            loudness: Some(-7.0),
            mode: Some(1.0),
            speechiness: Some(0.04),
            acousticness: Some(0.1),
            instrumentalness: Some(0.0),
            liveness: Some(0.12),
            valence: Some(0.7),
            tempo: Some(120.0),
            artist_pop: Some(60),
            genres: genres.map(String::from),
            track_pop: Some(50),
        }
    }

    fn ids(table: &CanonicalFeatureTable) -> Vec<&str> {
        table.rows().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_normalize_drops_duplicates() {
        let table = normalize(vec![
            raw("a", "Artist", "Song", Some("pop")),
            raw("b", "Other", "Song", Some("rock")),
            raw("c", "Artist", "Song", Some("pop")),
        ]);
        assert_eq!(ids(&table), ["a", "b"]);
    }

    #[test]
    fn test_normalize_keeps_smallest_identifier_of_a_group() {
        let table = normalize(vec![
            raw("z9", "Artist", "Song", None),
            raw("m1", "Other", "Tune", None),
            raw("a3", "Artist", "Song", None),
        ]);
        // "a3" wins the Artist/Song group but keeps its own input position.
        assert_eq!(ids(&table), ["m1", "a3"]);
    }

    #[test]
    fn test_normalize_is_case_and_space_sensitive() {
        let table = normalize(vec![
            raw("1", "Artist", "Song", None),
            raw("2", "artist", "Song", None),
            raw("3", "Artist ", "Song", None),
        ]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_normalize_drops_reused_identifier() {
        let table = normalize(vec![
            raw("same", "Artist", "Song", None),
            raw("same", "Other", "Tune", None),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].artist_name, "Artist");
    }

    #[test]
    fn test_normalize_falls_back_to_free_identifier() {
        // "a" is taken by X/One, so Y/Two is represented by "b".
        let table = normalize(vec![
            raw("a", "X", "One", None),
            raw("a", "Y", "Two", None),
            raw("b", "Y", "Two", None),
        ]);
        assert_eq!(ids(&table), ["a", "b"]);
        assert_eq!(table.get("b").map(|r| r.artist_name.as_str()), Some("Y"));
    }

    #[test]
    fn test_normalize_keeps_one_row_per_distinct_track() {
        let table = normalize(vec![
            raw("c", "Z", "Three", None),
            raw("a", "X", "One", None),
            raw("a", "Z", "Three", None),
            raw("b", "X", "One", None),
        ]);
        // Z/Three claims "a" first; X/One takes "b".
        assert_eq!(ids(&table), ["a", "b"]);
        assert_eq!(table.get("a").map(|r| r.artist_name.as_str()), Some("Z"));
        assert_eq!(table.get("b").map(|r| r.artist_name.as_str()), Some("X"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(vec![
            raw("b", "X", "One", Some("indie_rock lo-fi")),
            raw("a", "X", "One", Some("indie_rock")),
            raw("c", "Y", "Two", Some("")),
            raw("d", "Z", "Three", None),
        ]);
        let twice = normalize(once.to_raw());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_genre_string_split_into_tokens() {
        let table = normalize(vec![
            raw("1", "A", "One", Some("dance_pop electropop")),
            raw("2", "B", "Two", Some("unknown")),
            raw("3", "C", "Three", Some("")),
            raw("4", "D", "Four", None),
        ]);
        let rows = table.rows();
        assert_eq!(rows[0].genres, ["dance_pop", "electropop"]);
        assert_eq!(rows[1].genres, ["unknown"]);
        assert!(rows[2].genres.is_empty());
        assert!(rows[3].genres.is_empty());
    }

    #[test]
    fn test_split_genres_ignores_repeated_spaces() {
        assert_eq!(split_genres("a  b "), ["a", "b"]);
        assert!(split_genres("").is_empty());
    }

    #[test]
    fn test_missing_numeric_fields_pass_through() {
        let mut record = raw("1", "A", "One", None);
        record.tempo = None;
        record.artist_pop = Some(250);
        let table = normalize(vec![record]);
        assert!(table.rows()[0].features.tempo.is_none());
        assert_eq!(table.rows()[0].artist_pop, Some(250));
    }

    #[test]
    fn test_get_by_identifier() {
        let table = normalize(vec![raw("1", "A", "One", None), raw("2", "B", "Two", None)]);
        assert_eq!(table.get("2").map(|r| r.track_name.as_str()), Some("Two"));
        assert!(table.get("3").is_none());
    }

    #[test]
    fn test_catalog_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let rows = vec![raw("1", "A", "One", Some("pop"))];

        save_raw_catalog(&path, &rows).unwrap();
        let loaded = load_raw_catalog(&path).unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_load_missing_catalog_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_raw_catalog(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
