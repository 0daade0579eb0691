//! End-to-end tests: raw catalog rows through normalisation,
//! vectorisation, aggregation and ranking.

use std::sync::Arc;
use std::thread;

use timbre_core::{
    aggregate, normalize, rank, vectorize, CatalogSnapshot, Error, Playlist, RawTrackRecord,
    DEFAULT_TOP_K,
};

fn row(id: &str, artist: &str, track: &str, energy: f64, genres: &str) -> RawTrackRecord {
    RawTrackRecord {
        artist_name: artist.to_string(),
        id: id.to_string(),
        track_name: track.to_string(),
        danceability: Some(0.5),
        energy: Some(energy),
        key: Some(1.0),
        loudness: Some(-6.0),
        mode: Some(1.0),
        speechiness: Some(0.05),
        acousticness: Some(0.2),
        instrumentalness: Some(0.0),
        liveness: Some(0.1),
        valence: Some(0.5),
        tempo: Some(118.0),
        artist_pop: Some(50),
        genres: Some(genres.to_string()),
        track_pop: Some(50),
    }
}

fn catalog() -> Vec<RawTrackRecord> {
    vec![
        row("t1", "Alpha", "First", 0.9, "pop rock"),
        row("t2", "Beta", "Second", 0.8, "pop"),
        row("t3", "Gamma", "Third", 0.2, "jazz"),
        row("t4", "Alpha", "First", 0.9, "pop rock"),
        row("t5", "Delta", "Fifth", 0.85, "rock"),
        row("t6", "Epsilon", "Sixth", 0.3, "jazz bebop"),
    ]
}

#[test]
fn test_snapshot_recommends_outside_playlist() {
    let snapshot = CatalogSnapshot::build(catalog()).unwrap();
    // "t4" duplicates "t1" and is dropped.
    assert_eq!(snapshot.tracks().len(), 5);
    assert!(snapshot.track("t4").is_none());

    let playlist = Playlist::new(["t1", "t2"]);
    let result = snapshot.recommend(&playlist, DEFAULT_TOP_K).unwrap();

    assert_eq!(result.len(), 3);
    assert!(result.iter().all(|r| !playlist.contains(&r.id)));
    assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    // The rock track shares genres with the playlist; the jazz tracks do not.
    assert_eq!(result[0].id, "t5");
}

#[test]
fn test_snapshot_track_lookup_matches_table() {
    let snapshot = CatalogSnapshot::build(catalog()).unwrap();
    for record in snapshot.tracks() {
        let found = snapshot.track(&record.id).unwrap();
        assert_eq!(found, record);
        assert_eq!(snapshot.tracks().get(&record.id), Some(found));
    }
    assert_eq!(snapshot.track("t3").unwrap().artist_name, "Gamma");
    assert!(snapshot.track("missing").is_none());

    let clone = snapshot.clone();
    assert_eq!(clone.track("t6").unwrap().track_name, "Sixth");
}

#[test]
fn test_genre_columns_follow_vocabulary() {
    let table = normalize(catalog());
    let features = vectorize(&table).unwrap();
    assert_eq!(features.vocabulary().tokens(), ["pop", "rock", "jazz", "bebop"]);

    let first = &features.rows()[0];
    assert_eq!(first.id, "t1");
    assert_eq!(first.vector[features.dimension() - 4..], [1.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_vectors_from_other_vocabulary_are_rejected() {
    let full = vectorize(&normalize(catalog())).unwrap();
    let small = vectorize(&normalize(vec![row("x1", "X", "One", 0.5, "pop")])).unwrap();

    let (vector, _) = aggregate(&small, &Playlist::new(["x1"]));
    let (_, remainder) = aggregate(&full, &Playlist::new(["t1"]));

    assert!(matches!(
        rank(&remainder, &vector, DEFAULT_TOP_K),
        Err(Error::DimensionMismatch { .. })
    ));
}

#[test]
fn test_same_width_different_vocabulary_is_rejected() {
    let left = vectorize(&normalize(vec![row("a", "A", "One", 0.5, "pop")])).unwrap();
    let right = vectorize(&normalize(vec![
        row("b", "B", "Two", 0.5, "jazz"),
        row("c", "C", "Three", 0.5, "jazz"),
    ]))
    .unwrap();
    assert_eq!(left.dimension(), right.dimension());

    let (vector, _) = aggregate(&left, &Playlist::new(["a"]));
    let (_, remainder) = aggregate(&right, &Playlist::new(["b"]));

    assert!(matches!(
        rank(&remainder, &vector, 5),
        Err(Error::VocabularyMismatch)
    ));
}

#[test]
fn test_playlist_absent_from_catalog_scores_zero() {
    let snapshot = CatalogSnapshot::build(catalog()).unwrap();
    let result = snapshot
        .recommend(&Playlist::new(["missing"]), DEFAULT_TOP_K)
        .unwrap();
    assert_eq!(result.len(), snapshot.tracks().len());
    assert!(result.iter().all(|r| r.score == 0.0));
}

#[test]
fn test_malformed_row_fails_snapshot_build() {
    let mut rows = catalog();
    rows[2].valence = None;
    let err = CatalogSnapshot::build(rows).unwrap_err();
    assert!(err.to_string().contains("t3"));
    assert!(err.to_string().contains("valence"));
}

#[test]
fn test_snapshot_shared_across_threads() {
    let snapshot = Arc::new(CatalogSnapshot::build(catalog()).unwrap());
    let expected = snapshot
        .recommend(&Playlist::new(["t3"]), DEFAULT_TOP_K)
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let snapshot = Arc::clone(&snapshot);
            thread::spawn(move || snapshot.recommend(&Playlist::new(["t3"]), DEFAULT_TOP_K))
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result, expected);
    }
}
