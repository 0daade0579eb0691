use anyhow::{bail, Context, Result};
use std::path::Path;

use timbre_core::catalog::load_raw_catalog;
use timbre_core::{CatalogSnapshot, Playlist, Recommendation};
use timbre_etl::Config;

use super::{read_track_ids, track_id_arg};

pub fn run_recommend(
    config: &Config,
    ids: Vec<String>,
    playlist_file: Option<&Path>,
    k: usize,
    json: bool,
) -> Result<()> {
    let mut playlist_ids: Vec<String> = ids.iter().filter_map(|arg| track_id_arg(arg)).collect();
    if let Some(path) = playlist_file {
        playlist_ids.extend(read_track_ids(path)?);
    }
    if playlist_ids.is_empty() {
        bail!("No playlist track identifiers given");
    }
    let playlist = Playlist::new(playlist_ids);

    let rows = load_raw_catalog(&config.catalog_path)
        .with_context(|| format!("Failed to load catalog {}", config.catalog_path.display()))?;
    let snapshot = CatalogSnapshot::build(rows).context("Failed to build catalog snapshot")?;

    let missing: Vec<&str> = playlist
        .ids()
        .iter()
        .map(String::as_str)
        .filter(|id| snapshot.track(id).is_none())
        .collect();
    if !missing.is_empty() {
        log::warn!(
            "{} playlist tracks are not in the catalog: {}",
            missing.len(),
            missing.join(", ")
        );
    }

    let recommendations = snapshot.recommend(&playlist, k)?;

    if json {
        print_json(&snapshot, &recommendations)?;
    } else {
        print_table(&snapshot, &playlist, &recommendations);
    }

    Ok(())
}

fn print_table(snapshot: &CatalogSnapshot, playlist: &Playlist, recommendations: &[Recommendation]) {
    println!(
        "\nRecommendations for {} playlist tracks ({} in catalog of {})\n",
        playlist.len(),
        playlist.ids().iter().filter(|id| snapshot.track(id).is_some()).count(),
        snapshot.tracks().len()
    );

    for (rank, rec) in recommendations.iter().enumerate() {
        let title = snapshot
            .track(&rec.id)
            .map(|t| format!("{} - {}", t.artist_name, t.track_name))
            .unwrap_or_default();
        println!("{:>4}  {:.4}  {}  {}", rank + 1, rec.score, rec.id, title);
    }
}

fn print_json(snapshot: &CatalogSnapshot, recommendations: &[Recommendation]) -> Result<()> {
    let entries: Vec<serde_json::Value> = recommendations
        .iter()
        .map(|rec| {
            let track = snapshot.track(&rec.id);
            serde_json::json!({
                "id": rec.id,
                "score": rec.score,
                "artist_name": track.map(|t| t.artist_name.as_str()),
                "track_name": track.map(|t| t.track_name.as_str()),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
