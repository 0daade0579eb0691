use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use timbre_core::catalog::{load_raw_catalog, save_raw_catalog};
use timbre_etl::{ingest, Config, SpotifyClient};

use super::read_track_ids;

pub async fn run_ingest(
    config: &Config,
    ids_file: &Path,
    out: Option<PathBuf>,
    append: bool,
) -> Result<()> {
    let out = out.unwrap_or_else(|| config.catalog_path.clone());
    let ids = read_track_ids(ids_file)?;
    if ids.is_empty() {
        println!("No track identifiers in {}", ids_file.display());
        return Ok(());
    }

    let client = SpotifyClient::new(&config.provider)
        .context("Failed to create feature provider client")?;

    println!("Fetching features for {} tracks...", ids.len());
    let report = ingest(&client, &ids).await?;

    let mut rows = if append && out.exists() {
        load_raw_catalog(&out)
            .with_context(|| format!("Failed to read existing catalog {}", out.display()))?
    } else {
        Vec::new()
    };
    let existing = rows.len();
    rows.extend(report.records.iter().cloned());

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    save_raw_catalog(&out, &rows)
        .with_context(|| format!("Failed to write catalog {}", out.display()))?;

    println!("\n  Fetched: {}", report.records.len());
    if existing > 0 {
        println!("  Kept from existing catalog: {}", existing);
    }
    println!("  Written to: {}", out.display());

    if !report.is_complete() {
        println!("\n  No record for {} identifiers:", report.absent.len());
        for absent in &report.absent {
            println!("    {}", absent);
        }
    }

    Ok(())
}
