pub mod playlist;
pub mod track;

pub use playlist::{Playlist, Recommendation};
pub use track::{AudioFeatures, RawTrackRecord, TrackRecord, AUDIO_FEATURE_NAMES, NUMERIC_COLUMNS};
