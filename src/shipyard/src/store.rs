//! Build storage
//!
//! Imports never write anywhere themselves. A caller that wants to keep an
//! import hands the result to a [`BuildStore`].

use crate::import::{Comparison, ImportResult, Insurance, SingleBuild, Snapshot};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to save: {0}")]
    Invalid(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Destination for imported builds and preferences
pub trait BuildStore {
    /// Save a build code, replacing any build with the same ship and name
    fn put_build(&mut self, ship_id: &str, name: &str, code: &str) -> StoreResult<()>;

    /// Save a comparison, replacing any comparison with the same name
    fn put_comparison(&mut self, name: &str, comparison: &Comparison) -> StoreResult<()>;

    fn set_discounts(&mut self, ship: f64, module: f64) -> StoreResult<()>;

    fn set_insurance(&mut self, insurance: Insurance) -> StoreResult<()>;
}

/// Store held entirely in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    pub contents: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self, ship_id: &str, name: &str) -> Option<&str> {
        self.contents
            .builds
            .get(ship_id)
            .and_then(|builds| builds.get(name))
            .map(String::as_str)
    }
}

impl BuildStore for MemoryStore {
    fn put_build(&mut self, ship_id: &str, name: &str, code: &str) -> StoreResult<()> {
        self.contents
            .builds
            .entry(ship_id.to_string())
            .or_default()
            .insert(name.to_string(), code.to_string());
        Ok(())
    }

    fn put_comparison(&mut self, name: &str, comparison: &Comparison) -> StoreResult<()> {
        self.contents
            .comparisons
            .insert(name.to_string(), comparison.clone());
        Ok(())
    }

    fn set_discounts(&mut self, ship: f64, module: f64) -> StoreResult<()> {
        self.contents.ship_discount = Some(ship);
        self.contents.module_discount = Some(module);
        Ok(())
    }

    fn set_insurance(&mut self, insurance: Insurance) -> StoreResult<()> {
        self.contents.insurance = Some(insurance);
        Ok(())
    }
}

impl SingleBuild {
    pub fn persist(&self, store: &mut dyn BuildStore) -> StoreResult<()> {
        store.put_build(&self.ship_id, &self.name, &self.code)
    }
}

impl Snapshot {
    /// Write every build, comparison and preference; returns the build count
    pub fn persist(&self, store: &mut dyn BuildStore) -> StoreResult<usize> {
        for (ship_id, builds) in &self.builds {
            for (name, code) in builds {
                store.put_build(ship_id, name, code)?;
            }
        }
        for (name, comparison) in &self.comparisons {
            store.put_comparison(name, comparison)?;
        }
        if let (Some(ship), Some(module)) = (self.ship_discount, self.module_discount) {
            store.set_discounts(ship, module)?;
        }
        if let Some(insurance) = self.insurance {
            store.set_insurance(insurance)?;
        }
        Ok(self.build_count())
    }
}

impl ImportResult {
    /// Save a successful import; returns the number of builds written
    pub fn persist(&self, store: &mut dyn BuildStore) -> StoreResult<usize> {
        match self {
            Self::ValidationError(err) => Err(StoreError::Invalid(err.message().to_string())),
            Self::SingleBuild(build) => build.persist(store).map(|()| 1),
            Self::Snapshot(snapshot) => snapshot.persist(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{import, ComparisonEntry};
    use serde_json::Map;

    #[test]
    fn test_snapshot_persist() {
        let mut snapshot = Snapshot::default();
        snapshot
            .builds
            .entry("asp".to_string())
            .or_default()
            .insert("Miner".to_string(), "A0code".to_string());
        snapshot.comparisons.insert(
            "Haulers".to_string(),
            Comparison {
                builds: vec![ComparisonEntry {
                    ship_id: "asp".to_string(),
                    build_name: "Miner".to_string(),
                }],
                extra: Map::new(),
            },
        );
        snapshot.ship_discount = Some(0.9);
        snapshot.module_discount = Some(0.85);
        snapshot.insurance = Some(Insurance::Alpha);

        let mut store = MemoryStore::new();
        assert_eq!(snapshot.persist(&mut store).unwrap(), 1);
        assert_eq!(store.contents, snapshot);
        assert_eq!(store.build("asp", "Miner"), Some("A0code"));
    }

    #[test]
    fn test_put_build_replaces() {
        let mut store = MemoryStore::new();
        store.put_build("asp", "Miner", "A0old").unwrap();
        store.put_build("asp", "Miner", "A0new").unwrap();
        assert_eq!(store.build("asp", "Miner"), Some("A0new"));
        assert_eq!(store.contents.build_count(), 1);
    }

    #[test]
    fn test_invalid_import_is_not_saved() {
        let mut store = MemoryStore::new();
        let result = import("42");
        assert!(matches!(result.persist(&mut store), Err(StoreError::Invalid(_))));
        assert_eq!(store, MemoryStore::new());
    }

    #[test]
    fn test_single_build_persist() {
        let mut store = MemoryStore::new();
        let build = SingleBuild {
            name: "Scout".to_string(),
            ship_id: "sidewinder".to_string(),
            code: "A0-.".to_string(),
        };
        assert_eq!(ImportResult::SingleBuild(build).persist(&mut store).unwrap(), 1);
        assert_eq!(store.build("sidewinder", "Scout"), Some("A0-."));
    }
}
