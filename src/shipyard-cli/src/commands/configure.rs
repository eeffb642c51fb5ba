//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up shipyard defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
pub fn handle(base_url: Option<String>, store: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if apply(&mut config, base_url, store) {
        config.save()?;
        if let Ok(path) = Config::config_path() {
            println!("Config saved to: {}", path.display());
        }
    } else {
        show_usage();
    }

    Ok(())
}

/// Apply the given settings; returns false when there was nothing to set
fn apply(config: &mut Config, base_url: Option<String>, store: Option<PathBuf>) -> bool {
    let changed = base_url.is_some() || store.is_some();
    if let Some(url) = base_url {
        println!("Base URL configured: {}", url);
        config.base_url = Some(url);
    }
    if let Some(path) = store {
        println!("Build store configured: {}", path.display());
        config.store = Some(path);
    }
    changed
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.base_url {
        Some(url) => println!("Base URL: {}", url),
        None => println!("No base URL configured"),
    }

    match config.store_path() {
        Ok(path) => println!("Build store: {}", path.display()),
        Err(err) => println!("Build store: unavailable ({})", err),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: shipyard configure --base-url https://example.org");
    println!("   or: shipyard configure --store ~/builds.json");
    println!("   or: shipyard configure --show");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_nothing() {
        let mut config = Config::default();
        assert!(!apply(&mut config, None, None));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut config = Config {
            base_url: Some("https://old.example".to_string()),
            store: None,
        };
        assert!(apply(&mut config, None, Some(PathBuf::from("builds.json"))));
        assert_eq!(config.base_url.as_deref(), Some("https://old.example"));
        assert_eq!(config.store, Some(PathBuf::from("builds.json")));
    }

    #[test]
    fn test_config_path_exists() {
        assert!(Config::config_path().is_ok());
    }
}
