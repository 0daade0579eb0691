use anyhow::{Context, Result};
use std::collections::HashMap;

use timbre_core::catalog::load_raw_catalog;
use timbre_core::{normalize, vectorize};
use timbre_etl::Config;

pub fn show_status(config: &Config) -> Result<()> {
    println!("\nTimbre Status\n");
    println!("  Catalog: {}", config.catalog_path.display());

    if !config.catalog_path.exists() {
        println!("  Catalog file does not exist");
        println!("\n  Run `timbre ingest <ids-file>` to build one");
        return Ok(());
    }

    let rows = load_raw_catalog(&config.catalog_path).context("Failed to load catalog")?;
    let raw_count = rows.len();
    let table = normalize(rows);

    println!("  Raw rows: {}", raw_count);
    println!("  Distinct tracks: {}", table.len());
    println!("  Duplicates dropped: {}", raw_count - table.len());

    let mut genre_counts: HashMap<&str, usize> = HashMap::new();
    for track in &table {
        for genre in &track.genres {
            *genre_counts.entry(genre.as_str()).or_default() += 1;
        }
    }
    let mut top: Vec<(&str, usize)> = genre_counts.into_iter().collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    match vectorize(&table) {
        Ok(features) => {
            println!("  Genre vocabulary: {}", features.vocabulary().len());
            println!("  Feature dimension: {}", features.dimension());
        }
        Err(e) => {
            println!("  Catalog cannot be vectorised: {}", e);
        }
    }

    if !top.is_empty() {
        println!("\n  Most common genres:");
        for (genre, count) in top.iter().take(10) {
            println!("    {:<30} {}", genre, count);
        }
    }

    Ok(())
}
