//! JSON file build store

use shipyard::import::{Comparison, Insurance};
use shipyard::store::StoreResult;
use shipyard::{BuildStore, MemoryStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Builds kept in one JSON document on disk.
///
/// Changes are held in memory until [`JsonFileStore::flush`].
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: &Path) -> StoreResult<Self> {
        let inner = if path.exists() {
            let contents = fs::read_to_string(path)?;
            MemoryStore {
                contents: serde_json::from_str(&contents)?,
            }
        } else {
            MemoryStore::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn build(&self, ship_id: &str, name: &str) -> Option<&str> {
        self.inner.build(ship_id, name)
    }

    pub fn flush(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.inner.contents)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl BuildStore for JsonFileStore {
    fn put_build(&mut self, ship_id: &str, name: &str, code: &str) -> StoreResult<()> {
        self.inner.put_build(ship_id, name, code)
    }

    fn put_comparison(&mut self, name: &str, comparison: &Comparison) -> StoreResult<()> {
        self.inner.put_comparison(name, comparison)
    }

    fn set_discounts(&mut self, ship: f64, module: f64) -> StoreResult<()> {
        self.inner.set_discounts(ship, module)
    }

    fn set_insurance(&mut self, insurance: Insurance) -> StoreResult<()> {
        self.inner.set_insurance(insurance)
    }
}
