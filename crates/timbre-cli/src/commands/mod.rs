pub mod config;
pub mod ingest;
pub mod recommend;
pub mod status;

pub use ingest::run_ingest;
pub use recommend::run_recommend;
pub use status::show_status;

use anyhow::{Context, Result};
use std::path::Path;

use timbre_etl::provider::spotify::parse_track_id;

/// Read track identifiers from a file, one per line.
///
/// Blank lines and `#` comments are skipped; see [`track_id_arg`] for how
/// each remaining line is read.
pub fn read_track_ids(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_track_ids(&contents))
}

fn parse_track_ids(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(track_id_arg)
        .collect()
}

/// Turn one user-supplied token into a track identifier.
///
/// Provider URIs and links are reduced to their id. Anything else without
/// whitespace is taken verbatim, since catalog identifiers are opaque.
/// Input containing whitespace is reported and skipped.
pub fn track_id_arg(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(id) = parse_track_id(input) {
        return Some(id.to_string());
    }
    if !input.is_empty() && !input.contains(char::is_whitespace) {
        return Some(input.to_string());
    }
    log::warn!("Skipping input without a track identifier: {:?}", input);
    None
}
