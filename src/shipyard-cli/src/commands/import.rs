//! Import command handler

use anyhow::{bail, Context, Result};
use shipyard::import::import_with_format;
use shipyard::{ImportResult, Snapshot, SourceFormat};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::file_store::JsonFileStore;

/// Read the input file (or stdin when `None`)
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Handle the import command
pub fn handle(input: Option<&Path>, save: bool) -> Result<()> {
    let config = Config::load()?;
    let text = read_input(input)?;

    let (format, result) = match import_with_format(&text) {
        Ok(imported) => imported,
        Err(err) => bail!("{}", err.message()),
    };
    print!("{}", summarize(format, &result, &config));

    if save {
        let path = config.store_path()?;
        let mut store = JsonFileStore::open(&path)
            .with_context(|| format!("Failed to open build store {}", path.display()))?;
        let count = result.persist(&mut store)?;
        store.flush()?;
        println!("Saved {} build(s) to {}", count, store.path().display());
    }

    Ok(())
}

/// Describe a successful import
pub fn summarize(format: SourceFormat, result: &ImportResult, config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Format: {}", format);
    match result {
        ImportResult::SingleBuild(build) => {
            let _ = writeln!(out, "Build:  {} ({})", build.name, build.ship_id);
            let _ = writeln!(out, "Code:   {}", build.code);
            let _ = writeln!(out, "Link:   {}", config.outfit_link(&build.navigation_path()));
        }
        ImportResult::Snapshot(snapshot) => summarize_snapshot(&mut out, snapshot),
        ImportResult::ValidationError(err) => {
            let _ = writeln!(out, "Invalid: {}", err.message());
        }
    }
    out
}

fn summarize_snapshot(out: &mut String, snapshot: &Snapshot) {
    let _ = writeln!(out, "Builds: {}", snapshot.build_count());
    for (ship_id, builds) in &snapshot.builds {
        let names: Vec<&str> = builds.keys().map(String::as_str).collect();
        let _ = writeln!(out, "  {:<20} {}", ship_id, names.join(", "));
    }
    if !snapshot.comparisons.is_empty() {
        let names: Vec<&str> = snapshot.comparisons.keys().map(String::as_str).collect();
        let _ = writeln!(out, "Comparisons: {}", names.join(", "));
    }
    if let (Some(ship), Some(module)) = (snapshot.ship_discount, snapshot.module_discount) {
        let _ = writeln!(out, "Discounts: ship {:.2}, module {:.2}", ship, module);
    }
    if let Some(insurance) = snapshot.insurance {
        let _ = writeln!(out, "Insurance: {}", insurance.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipyard::SingleBuild;

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_input(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.txt");
        std::fs::write(&path, "[Asp Explorer]\n").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "[Asp Explorer]\n");
    }

    #[test]
    fn test_summarize_single_build() {
        let result = ImportResult::SingleBuild(SingleBuild {
            name: "Scout".to_string(),
            ship_id: "sidewinder".to_string(),
            code: "A0".to_string(),
        });
        let config = Config {
            base_url: Some("https://example.org".to_string()),
            store: None,
        };
        let text = summarize(SourceFormat::JournalLoadout, &result, &config);
        assert!(text.contains("Format: journal loadout"));
        assert!(text.contains("Build:  Scout (sidewinder)"));
        assert!(text.contains("Link:   https://example.org/outfit/sidewinder?code=A0&bn=Scout"));
    }

    #[test]
    fn test_summarize_snapshot() {
        let mut snapshot = Snapshot::default();
        snapshot
            .builds
            .entry("asp".to_string())
            .or_default()
            .insert("Miner".to_string(), "A0".to_string());
        let text = summarize(
            SourceFormat::Backup,
            &ImportResult::Snapshot(snapshot),
            &Config::default(),
        );
        assert!(text.contains("Builds: 1"));
        assert!(text.contains("Miner"));
        assert!(!text.contains("Insurance"));
    }
}
