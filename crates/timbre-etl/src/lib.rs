//! Ingestion side of timbre.
//!
//! Talks to the external feature provider, turns its answers into raw
//! catalog rows, and loads the application configuration.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod provider;

pub use config::{Config, ProviderConfig};
pub use error::{ProviderError, ProviderResult};
pub use ingest::{ingest, AbsentTrack, IngestReport};
pub use provider::spotify::SpotifyClient;
pub use provider::{FeatureProvider, FeatureRecord};
