//! Core recommendation engine for timbre.
//!
//! This crate turns a raw track catalog into a canonical feature table
//! ([`catalog`]), expands genre tags into one-hot columns
//! ([`vectorize`]), and ranks catalog tracks against a playlist by cosine
//! similarity ([`recommend`], [`similarity`]).

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod recommend;
pub mod similarity;
pub mod vectorize;

pub use catalog::{normalize, CanonicalFeatureTable};
pub use error::{Error, Result};
pub use model::{AudioFeatures, Playlist, RawTrackRecord, Recommendation, TrackRecord};
pub use recommend::{aggregate, rank, CatalogSnapshot, PlaylistVector, DEFAULT_TOP_K};
pub use similarity::cosine_similarity;
pub use vectorize::{vectorize, FeatureRow, GenreVocabulary, VectorizedFeatureTable};
