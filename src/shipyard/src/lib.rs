//! # shipyard
//!
//! Ship build import, validation and build-code library.
//!
//! This library provides functionality to:
//! - Classify pasted build data (backups, detailed exports, journal
//!   loadouts, legacy text) and validate it with user-facing messages
//! - Reconstruct canonical builds from slot descriptors
//! - Apply engineering blueprints, rolls and special effects to modules
//! - Encode builds to compact shareable codes and decode them back
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("loadout.json")?;
//!
//! match shipyard::import(&text) {
//!     shipyard::ImportResult::SingleBuild(build) => {
//!         println!("{}", build.navigation_path());
//!         let decoded = shipyard::decode(&build.code, &build.ship_id)?;
//!         println!("{} slots", decoded.ship().component_slot_count());
//!     }
//!     other => println!("{:?}", other.status()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod catalog;
pub mod code;
pub mod engineering;
pub mod import;
pub mod module;
pub mod store;

// Re-export commonly used items
#[doc(inline)]
pub use build::{build_from, Build, BuildError, PowerState, Slot, SlotAssignment, SlotId};
#[doc(inline)]
pub use catalog::{catalog, Catalog, CatalogError, ModuleTemplate, Ship};
#[doc(inline)]
pub use code::{decode, encode, BuildCodes, DecodeError};
#[doc(inline)]
pub use engineering::{Engineering, EngineeringError, Roll};
#[doc(inline)]
pub use import::{import, ImportError, ImportResult, SingleBuild, Snapshot, SourceFormat};
#[doc(inline)]
pub use module::{FeatureDelta, ModuleInstance};
#[doc(inline)]
pub use store::{BuildStore, MemoryStore, StoreError, StoreResult};
