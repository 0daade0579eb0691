//! Batch ingestion of track features into raw catalog rows.
//!
//! Each identifier is fetched on its own. A failure that concerns only
//! that identifier (unknown id, missing artist, unparsable payload, or a
//! transient error that outlived its retries) marks the identifier as
//! absent and the batch moves on. A provider-wide failure such as
//! rejected credentials aborts the batch and is returned to the caller.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use timbre_core::RawTrackRecord;

use crate::error::ProviderResult;
use crate::provider::FeatureProvider;

/// An identifier for which no record could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsentTrack {
    pub id: String,
    pub reason: String,
}

impl fmt::Display for AbsentTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

/// The outcome of ingesting a batch of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Catalog rows, in request order.
    pub records: Vec<RawTrackRecord>,
    /// Identifiers that produced no row, in request order.
    pub absent: Vec<AbsentTrack>,
}

impl IngestReport {
    /// `true` when every requested identifier produced a row.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.absent.is_empty()
    }
}

/// Fetch every identifier from `provider` and convert the answers into raw
/// catalog rows.
///
/// Repeated identifiers are fetched once.
///
/// # Errors
/// Returns the provider's error if it reports itself unavailable; all
/// other failures are recorded in [`IngestReport::absent`].
pub async fn ingest<P>(provider: &P, ids: &[String]) -> ProviderResult<IngestReport>
where
    P: FeatureProvider + ?Sized,
{
    let mut report = IngestReport::default();
    let mut seen = HashSet::new();

    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }

        match provider.fetch(id).await {
            Ok(record) => {
                log::debug!(
                    "{}: fetched {} ({} - {})",
                    provider.name(),
                    id,
                    record.artist_name,
                    record.track_name
                );
                report.records.push(record.into_raw());
            }
            Err(e) if e.is_unavailable() => {
                log::error!("{} unavailable while fetching {}: {}", provider.name(), id, e);
                return Err(e);
            }
            Err(e) => {
                log::warn!("No record for {} from {}: {}", id, provider.name(), e);
                report.absent.push(AbsentTrack {
                    id: id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Ingested {} tracks from {} ({} absent)",
        report.records.len(),
        provider.name(),
        report.absent.len()
    );

    Ok(report)
}
