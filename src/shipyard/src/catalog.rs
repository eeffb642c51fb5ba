//! Ship and equipment reference data
//!
//! Hulls, module templates, blueprint grade tables and special effects.
//! Data is embedded at compile time from share/catalog/catalog.json and
//! parsed once on first access. Every lookup the import pipeline needs is
//! answered from indexes built at load time.

use once_cell::sync::Lazy;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

const CATALOG_JSON: &str = include_str!("../../../share/catalog/catalog.json");

/// Groups occupying the seven standard slots, in slot order
pub const STANDARD_GROUPS: [&str; 7] = ["pp", "t", "fsd", "ls", "pd", "s", "ft"];

/// Bulkhead symbol suffixes, indexed by bulkhead grade
pub const BULKHEAD_SUFFIXES: [&str; 5] = [
    "_armour_grade1",
    "_armour_grade2",
    "_armour_grade3",
    "_armour_mirrored",
    "_armour_reactive",
];

/// Bulkhead display names, indexed by bulkhead grade
pub const BULKHEAD_NAMES: [&str; 5] = [
    "Lightweight Alloy",
    "Reinforced Alloy",
    "Military Grade Composite",
    "Mirrored Surface Composite",
    "Reactive Surface Composite",
];

static CATALOG: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json(CATALOG_JSON).unwrap_or_else(|e| panic!("embedded catalog is corrupt: {e}"))
});

/// The process-wide catalog
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate module symbol: {0}")]
    DuplicateSymbol(String),

    #[error("Duplicate module id: {0}")]
    DuplicateModuleId(String),

    #[error("Invalid module id {0:?} (must be two characters, not '-')")]
    InvalidModuleId(String),

    #[error("Module {module} references unknown group {group}")]
    UnknownGroup { module: String, group: String },

    #[error("Ship {ship} references unknown bulkheads {symbol}")]
    UnknownBulkheads { ship: String, symbol: String },

    #[error("Duplicate {kind} id {id}")]
    DuplicateWireId { kind: &'static str, id: i32 },

    #[error("Feature id {0} is reserved for block markers")]
    ReservedFeatureId(i8),

    #[error("{owner} references unknown feature {feature}")]
    UnknownFeature { owner: String, feature: String },
}

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Standard,
    Hardpoint,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleGroup {
    #[serde(skip)]
    pub code: String,
    pub name: String,
    pub kind: GroupKind,
}

/// Weapon mount type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Mount {
    #[serde(rename = "F")]
    Fixed,
    #[serde(rename = "G")]
    Gimballed,
    #[serde(rename = "T")]
    Turret,
}

impl Mount {
    pub fn code(self) -> char {
        match self {
            Self::Fixed => 'F',
            Self::Gimballed => 'G',
            Self::Turret => 'T',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Self::Fixed),
            'G' => Some(Self::Gimballed),
            'T' => Some(Self::Turret),
            _ => None,
        }
    }

    /// Parse a mount from either its code or its long name ("Gimballed")
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "gimballed" | "gimbal" => Some(Self::Gimballed),
            "turret" | "turreted" => Some(Self::Turret),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_code(c),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "Fixed"),
            Self::Gimballed => write!(f, "Gimballed"),
            Self::Turret => write!(f, "Turret"),
        }
    }
}

/// Immutable catalog entry for one piece of equipment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleTemplate {
    /// Two-character code used in build codes
    pub id: String,
    pub grp: String,
    pub class: u8,
    pub rating: char,
    #[serde(default)]
    pub mount: Option<Mount>,
    #[serde(default)]
    pub missile: Option<char>,
    #[serde(default)]
    pub name: Option<String>,
    /// Game telemetry symbol
    pub symbol: String,
}

impl ModuleTemplate {
    pub fn is_utility(&self) -> bool {
        self.class == 0
    }

    /// Short label such as "3D/G Pulse Laser"
    pub fn label(&self) -> String {
        let group = catalog()
            .group(&self.grp)
            .map(|g| g.name.as_str())
            .unwrap_or(self.grp.as_str());
        let name = self.name.as_deref().unwrap_or(group);
        match self.mount {
            Some(mount) => format!("{}{}/{} {}", self.class, self.rating, mount.code(), name),
            None => format!("{}{} {}", self.class, self.rating, name),
        }
    }
}

/// An internal slot: a bare class or a restricted slot with a name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawInternalSlot")]
pub struct InternalSlot {
    pub class: u8,
    pub name: Option<String>,
    /// Groups allowed in this slot; `None` means unrestricted
    pub eligible: Option<Vec<String>>,
}

impl InternalSlot {
    pub fn is_military(&self) -> bool {
        self.name.as_deref() == Some("Military")
    }

    pub fn accepts(&self, grp: &str) -> bool {
        self.eligible
            .as_ref()
            .map_or(true, |groups| groups.iter().any(|g| g == grp))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInternalSlot {
    Size(u8),
    Restricted {
        class: u8,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        eligible: Option<Vec<String>>,
    },
}

impl From<RawInternalSlot> for InternalSlot {
    fn from(raw: RawInternalSlot) -> Self {
        match raw {
            RawInternalSlot::Size(class) => Self {
                class,
                name: None,
                eligible: None,
            },
            RawInternalSlot::Restricted {
                class,
                name,
                eligible,
            } => Self {
                class,
                name,
                eligible,
            },
        }
    }
}

/// Vehicle descriptor: a hull and its fixed slot layout
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ship {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Bulkhead module symbols, indexed by bulkhead grade
    pub bulkheads: Vec<String>,
    /// Max class of each standard slot
    pub standard: Vec<u8>,
    /// Class of each hardpoint; 0 is a utility mount
    pub hardpoints: Vec<u8>,
    pub internal: Vec<InternalSlot>,
}

impl Ship {
    /// Number of slots carried by the component segment of a build code
    pub fn component_slot_count(&self) -> usize {
        self.standard.len() + self.hardpoints.len() + self.internal.len()
    }

    /// Number of slots carried by each power segment (cargo hatch first)
    pub fn power_slot_count(&self) -> usize {
        1 + self.component_slot_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Feature {
    #[serde(skip)]
    pub key: String,
    /// One-byte id used in the modifications block
    pub id: i8,
    pub name: String,
}

/// `[low, high]` range of one feature at one grade, as fractional multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRange {
    pub feature: String,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Grade {
    #[serde(deserialize_with = "ordered_ranges")]
    pub features: Vec<FeatureRange>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Blueprint {
    #[serde(skip)]
    pub fdname: String,
    pub id: i32,
    pub name: String,
    pub groups: Vec<String>,
    pub grades: BTreeMap<u8, Grade>,
}

impl Blueprint {
    pub fn grade(&self, grade: u8) -> Option<&Grade> {
        self.grades.get(&grade)
    }

    pub fn applies_to(&self, grp: &str) -> bool {
        self.groups.iter().any(|g| g == grp)
    }
}

/// Experimental effect overlaid on a blueprint grade
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Special {
    #[serde(skip)]
    pub edname: String,
    pub id: i32,
    pub name: String,
    pub groups: Vec<String>,
    #[serde(deserialize_with = "ordered_overlay")]
    pub features: Vec<(String, f64)>,
}

impl Special {
    pub fn applies_to(&self, grp: &str) -> bool {
        self.groups.iter().any(|g| g == grp)
    }
}

// Feature tables are JSON objects whose key order is the display order, so
// they are read through a visitor rather than into a map.

fn ordered_ranges<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<FeatureRange>, D::Error> {
    struct RangesVisitor;

    impl<'de> Visitor<'de> for RangesVisitor {
        type Value = Vec<FeatureRange>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of feature to [low, high]")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some((feature, [low, high])) = map.next_entry::<String, [f64; 2]>()? {
                out.push(FeatureRange { feature, low, high });
            }
            Ok(out)
        }
    }

    d.deserialize_map(RangesVisitor)
}

fn ordered_overlay<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, f64)>, D::Error> {
    struct OverlayVisitor;

    impl<'de> Visitor<'de> for OverlayVisitor {
        type Value = Vec<(String, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of feature to value")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some(entry) = map.next_entry::<String, f64>()? {
                out.push(entry);
            }
            Ok(out)
        }
    }

    d.deserialize_map(OverlayVisitor)
}

#[derive(Deserialize)]
struct RawCatalog {
    groups: BTreeMap<String, ModuleGroup>,
    ships: BTreeMap<String, Ship>,
    modules: Vec<ModuleTemplate>,
    features: BTreeMap<String, Feature>,
    blueprints: BTreeMap<String, Blueprint>,
    specials: BTreeMap<String, Special>,
}

// ============================================================================
// Catalog
// ============================================================================

/// Lookup parameters for resolving a module from descriptive fields
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleQuery<'a> {
    /// Group code ("mc") or display name ("Multi-cannon")
    pub group: &'a str,
    pub class: u8,
    pub rating: char,
    pub mount: Option<Mount>,
    pub missile: Option<char>,
    pub name: Option<&'a str>,
}

#[derive(Debug)]
pub struct Catalog {
    groups: BTreeMap<String, ModuleGroup>,
    ships: BTreeMap<String, Ship>,
    modules: Vec<ModuleTemplate>,
    features: BTreeMap<String, Feature>,
    blueprints: BTreeMap<String, Blueprint>,
    specials: BTreeMap<String, Special>,
    by_symbol: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    blueprint_names: HashMap<String, String>,
    blueprint_ids: HashMap<i32, String>,
    special_ids: HashMap<i32, String>,
    feature_ids: HashMap<i8, String>,
}

impl Catalog {
    /// Parse a catalog document and build its lookup indexes
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut raw: RawCatalog = serde_json::from_str(json)?;

        for (code, group) in raw.groups.iter_mut() {
            group.code = code.clone();
        }
        for (id, ship) in raw.ships.iter_mut() {
            ship.id = id.clone();
        }
        for (key, feature) in raw.features.iter_mut() {
            feature.key = key.clone();
        }
        for (fdname, blueprint) in raw.blueprints.iter_mut() {
            blueprint.fdname = fdname.clone();
        }
        for (edname, special) in raw.specials.iter_mut() {
            special.edname = edname.clone();
        }

        let mut by_symbol = HashMap::new();
        let mut by_id = HashMap::new();
        for (index, module) in raw.modules.iter().enumerate() {
            if !raw.groups.contains_key(&module.grp) {
                return Err(CatalogError::UnknownGroup {
                    module: module.symbol.clone(),
                    group: module.grp.clone(),
                });
            }
            if module.id.chars().count() != 2 || module.id.contains('-') {
                return Err(CatalogError::InvalidModuleId(module.id.clone()));
            }
            if by_symbol
                .insert(module.symbol.to_ascii_lowercase(), index)
                .is_some()
            {
                return Err(CatalogError::DuplicateSymbol(module.symbol.clone()));
            }
            if by_id.insert(module.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateModuleId(module.id.clone()));
            }
        }

        for ship in raw.ships.values() {
            for symbol in &ship.bulkheads {
                if !by_symbol.contains_key(&symbol.to_ascii_lowercase()) {
                    return Err(CatalogError::UnknownBulkheads {
                        ship: ship.id.clone(),
                        symbol: symbol.clone(),
                    });
                }
            }
        }

        let mut feature_ids = HashMap::new();
        for feature in raw.features.values() {
            if feature.id < 0 {
                return Err(CatalogError::ReservedFeatureId(feature.id));
            }
            if feature_ids.insert(feature.id, feature.key.clone()).is_some() {
                return Err(CatalogError::DuplicateWireId {
                    kind: "feature",
                    id: i32::from(feature.id),
                });
            }
        }

        let mut blueprint_names = HashMap::new();
        let mut blueprint_ids = HashMap::new();
        for blueprint in raw.blueprints.values() {
            for grade in blueprint.grades.values() {
                for range in &grade.features {
                    if !raw.features.contains_key(&range.feature) {
                        return Err(CatalogError::UnknownFeature {
                            owner: blueprint.fdname.clone(),
                            feature: range.feature.clone(),
                        });
                    }
                }
            }
            blueprint_names.insert(blueprint.fdname.to_ascii_lowercase(), blueprint.fdname.clone());
            if blueprint_ids
                .insert(blueprint.id, blueprint.fdname.clone())
                .is_some()
            {
                return Err(CatalogError::DuplicateWireId {
                    kind: "blueprint",
                    id: blueprint.id,
                });
            }
        }

        let mut special_ids = HashMap::new();
        for special in raw.specials.values() {
            for (feature, _) in &special.features {
                if !raw.features.contains_key(feature) {
                    return Err(CatalogError::UnknownFeature {
                        owner: special.edname.clone(),
                        feature: feature.clone(),
                    });
                }
            }
            if special_ids
                .insert(special.id, special.edname.clone())
                .is_some()
            {
                return Err(CatalogError::DuplicateWireId {
                    kind: "special",
                    id: special.id,
                });
            }
        }

        Ok(Self {
            groups: raw.groups,
            ships: raw.ships,
            modules: raw.modules,
            features: raw.features,
            blueprints: raw.blueprints,
            specials: raw.specials,
            by_symbol,
            by_id,
            blueprint_names,
            blueprint_ids,
            special_ids,
            feature_ids,
        })
    }

    // ------------------------------------------------------------------------
    // Ships
    // ------------------------------------------------------------------------

    pub fn ship(&self, id: &str) -> Option<&Ship> {
        self.ships.get(id)
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Find a ship by display name ("Asp Explorer"), case-insensitive
    pub fn ship_by_name(&self, name: &str) -> Option<&Ship> {
        self.ships
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Find a ship by telemetry symbol ("Empire_Trader"), case-insensitive
    pub fn ship_by_symbol(&self, symbol: &str) -> Option<&Ship> {
        self.ships
            .values()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    // ------------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------------

    pub fn group(&self, code: &str) -> Option<&ModuleGroup> {
        self.groups.get(code)
    }

    /// Resolve a group by code or display name
    pub fn group_by_name(&self, name: &str) -> Option<&ModuleGroup> {
        self.groups.get(name).or_else(|| {
            self.groups
                .values()
                .find(|g| g.name.eq_ignore_ascii_case(name.trim()))
        })
    }

    pub fn modules(&self) -> &[ModuleTemplate] {
        &self.modules
    }

    /// Resolve a module by telemetry symbol, case-insensitive
    pub fn module_by_symbol(&self, symbol: &str) -> Option<&ModuleTemplate> {
        self.by_symbol
            .get(&symbol.to_ascii_lowercase())
            .map(|&i| &self.modules[i])
    }

    pub fn module_by_id(&self, id: &str) -> Option<&ModuleTemplate> {
        self.by_id.get(id).map(|&i| &self.modules[i])
    }

    /// Resolve a module from descriptive fields.
    ///
    /// When several modules match, one whose name equals the requested
    /// name wins, then one without a name, then the first match.
    pub fn find_module(&self, query: &ModuleQuery<'_>) -> Option<&ModuleTemplate> {
        let group = self.group_by_name(query.group)?;
        let rating = query.rating.to_ascii_uppercase();
        let candidates: Vec<&ModuleTemplate> = self
            .modules
            .iter()
            .filter(|m| m.grp == group.code && m.class == query.class && m.rating == rating)
            .filter(|m| query.mount.map_or(true, |mount| m.mount == Some(mount)))
            .filter(|m| {
                query
                    .missile
                    .map_or(true, |kind| m.missile == Some(kind.to_ascii_uppercase()))
            })
            .collect();

        if let Some(name) = query.name {
            if let Some(m) = candidates.iter().find(|m| {
                m.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name.trim()))
            }) {
                return Some(*m);
            }
        }
        candidates
            .iter()
            .find(|m| m.name.is_none())
            .or_else(|| candidates.first())
            .copied()
    }

    /// Resolve the module for standard slot `slot` by class and rating
    pub fn standard_module(&self, slot: usize, class: u8, rating: char) -> Option<&ModuleTemplate> {
        let group = STANDARD_GROUPS.get(slot)?;
        self.find_module(&ModuleQuery {
            group,
            class,
            rating,
            ..ModuleQuery::default()
        })
    }

    // ------------------------------------------------------------------------
    // Engineering tables
    // ------------------------------------------------------------------------

    pub fn feature(&self, key: &str) -> Option<&Feature> {
        self.features.get(key)
    }

    pub fn feature_by_id(&self, id: i8) -> Option<&Feature> {
        self.feature_ids.get(&id).and_then(|k| self.features.get(k))
    }

    /// Resolve a blueprint by fdname, case-insensitive
    pub fn blueprint(&self, fdname: &str) -> Option<&Blueprint> {
        self.blueprint_names
            .get(&fdname.to_ascii_lowercase())
            .and_then(|n| self.blueprints.get(n))
    }

    pub fn blueprint_by_id(&self, id: i32) -> Option<&Blueprint> {
        self.blueprint_ids.get(&id).and_then(|n| self.blueprints.get(n))
    }

    /// Blueprints available to a module group
    pub fn blueprints_for<'a>(&'a self, grp: &'a str) -> impl Iterator<Item = &'a Blueprint> + 'a {
        self.blueprints.values().filter(move |b| b.applies_to(grp))
    }

    /// Resolve a special effect by edname, case-insensitive
    pub fn special(&self, edname: &str) -> Option<&Special> {
        self.specials.get(edname).or_else(|| {
            self.specials
                .values()
                .find(|s| s.edname.eq_ignore_ascii_case(edname))
        })
    }

    pub fn special_by_id(&self, id: i32) -> Option<&Special> {
        self.special_ids.get(&id).and_then(|n| self.specials.get(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_loads() {
        let result = Catalog::from_json(CATALOG_JSON);
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_ship_lookups() {
        let c = catalog();
        let asp = c.ship("asp").unwrap();
        assert_eq!(asp.name, "Asp Explorer");
        assert_eq!(c.ship_by_name("asp explorer").unwrap().id, "asp");
        assert_eq!(c.ship_by_symbol("EMPIRE_TRADER").unwrap().id, "imperial_clipper");
        assert!(c.ship("invalid_ship").is_none());
    }

    #[test]
    fn test_anaconda_slot_counts() {
        let anaconda = catalog().ship("anaconda").unwrap();
        assert_eq!(anaconda.standard.len(), 7);
        assert_eq!(anaconda.power_slot_count(), 36);
    }

    #[test]
    fn test_module_by_symbol_is_case_insensitive() {
        let c = catalog();
        let a = c.module_by_symbol("Int_Powerplant_Size8_Class5").unwrap();
        let b = c.module_by_symbol("int_powerplant_size8_class5").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.grp, "pp");
        assert_eq!(a.class, 8);
        assert_eq!(a.rating, 'A');
        assert_eq!(c.module_by_id(&a.id), Some(a));
    }

    #[test]
    fn test_find_module_by_description() {
        let c = catalog();
        let turret = c
            .find_module(&ModuleQuery {
                group: "Multi-cannon",
                class: 2,
                rating: 'F',
                mount: Some(Mount::Turret),
                ..ModuleQuery::default()
            })
            .unwrap();
        assert_eq!(turret.symbol, "Hpt_MultiCannon_Turret_Medium");

        let seeker = c
            .find_module(&ModuleQuery {
                group: "mr",
                class: 1,
                rating: 'B',
                missile: Some('S'),
                ..ModuleQuery::default()
            })
            .unwrap();
        assert_eq!(seeker.symbol, "Hpt_BasicMissileRack_Fixed_Small");
    }

    #[test]
    fn test_find_module_prefers_requested_name() {
        let c = catalog();
        let query = ModuleQuery {
            group: "Shield Generator",
            class: 5,
            rating: 'C',
            ..ModuleQuery::default()
        };
        let plain = c.find_module(&query).unwrap();
        assert!(plain.name.is_none());

        let biweave = c
            .find_module(&ModuleQuery {
                name: Some("bi-weave"),
                ..query
            })
            .unwrap();
        assert_eq!(biweave.name.as_deref(), Some("Bi-Weave"));
    }

    #[test]
    fn test_standard_module() {
        let fsd = catalog().standard_module(2, 5, 'a').unwrap();
        assert_eq!(fsd.symbol, "Int_Hyperdrive_Size5_Class5");
        assert!(catalog().standard_module(9, 5, 'A').is_none());
    }

    #[test]
    fn test_blueprint_grades_keep_document_order() {
        let bp = catalog().blueprint("fsd_longrange").unwrap();
        let order: Vec<&str> = bp.grade(5).unwrap().features.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, ["optmass", "mass", "integrity", "power"]);
        assert_eq!(catalog().blueprint_by_id(bp.id), Some(bp));
    }

    #[test]
    fn test_military_slot_restrictions() {
        let corvette = catalog().ship("federal_corvette").unwrap();
        let military: Vec<&InternalSlot> = corvette.internal.iter().filter(|s| s.is_military()).collect();
        assert_eq!(military.len(), 2);
        assert!(military[0].accepts("hr"));
        assert!(!military[0].accepts("cr"));
        assert!(corvette.internal[0].accepts("cr"));
    }

    #[test]
    fn test_duplicate_symbol_is_fatal() {
        let json = r#"{
            "groups": {"pp": {"name": "Power Plant", "kind": "standard"}},
            "ships": {},
            "modules": [
                {"id": "aa", "grp": "pp", "class": 2, "rating": "E", "symbol": "Int_Powerplant_Size2_Class1"},
                {"id": "ab", "grp": "pp", "class": 2, "rating": "D", "symbol": "INT_POWERPLANT_SIZE2_CLASS1"}
            ],
            "features": {},
            "blueprints": {},
            "specials": {}
        }"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSymbol(_)));
    }

    #[test]
    fn test_mount_parse() {
        assert_eq!(Mount::parse("Gimballed"), Some(Mount::Gimballed));
        assert_eq!(Mount::parse("t"), Some(Mount::Turret));
        assert_eq!(Mount::parse("sideways"), None);
    }
}
