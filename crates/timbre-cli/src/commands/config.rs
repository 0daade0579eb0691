use anyhow::Result;
use timbre_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  catalog_path: {}", config.catalog_path.display());
    println!("  top_k: {}", config.top_k);
    println!("  provider.client_id: {}",
        config.provider.client_id.as_deref().unwrap_or("<not set>"));
    println!("  provider.client_secret: {}",
        if config.provider.client_secret.is_some() { "<set>" } else { "<not set>" });
    println!("  provider.api_base: {}", config.provider.api_base);
    println!("  provider.requests_per_second: {}", config.provider.requests_per_second);
    println!("  provider.max_retries: {}", config.provider.max_retries);
    println!("  logging: {:?}", config.logging);

    println!("\nPriority: CLI args > ENV vars (TIMBRE_*) > Config file > Defaults");
}

/// Create the config file from the built-in template.
pub fn init_config() -> Result<()> {
    let path = config::config_file_path();
    if config::ensure_config_file()? {
        println!("Created config file: {}", path.display());
        println!("\nEdit it to add your provider client_id and client_secret.");
    } else {
        println!("Config file already exists: {}", path.display());
    }
    Ok(())
}
