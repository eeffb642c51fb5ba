//! Journal `Loadout` events
//!
//! The game writes one `Loadout` event per ship change. Modules are keyed
//! by in-game slot names, which only partly follow the slot layout:
//! hardpoints are numbered per run of equal classes, internal slot numbers
//! skip, and their size suffix is not the slot class.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{ImportError, Probe, SingleBuild};
use crate::build::{build_from, bulkhead_index, SlotAssignment, SlotId};
use crate::catalog::{catalog, Ship};
use crate::engineering::Engineering;

/// Standard slot names, in slot order
const STANDARD_SLOTS: [&str; 7] = [
    "PowerPlant",
    "MainEngines",
    "FrameShiftDrive",
    "LifeSupport",
    "PowerDistributor",
    "Radar",
    "FuelTank",
];

/// Hardpoint size names, indexed by class
const HARDPOINT_SIZES: [&str; 5] = ["Tiny", "Small", "Medium", "Large", "Huge"];

/// Highest internal slot number the scan looks for
const MAX_SLOT_NUMBER: usize = 99;
/// Highest size suffix of an internal slot name
const MAX_SLOT_SIZE: usize = 8;

/// Quality assumed when an event predates per-roll qualities
const DEFAULT_QUALITY: f64 = 1.0;

fn on() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Loadout {
    /// Ship telemetry symbol ("Asp", "Federation_Corvette")
    pub ship: String,
    #[serde(default)]
    pub ship_name: Option<String>,
    pub modules: Vec<LoadoutModule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadoutModule {
    pub slot: String,
    pub item: String,
    #[serde(default = "on")]
    pub on: bool,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub engineering: Option<LoadoutEngineering>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadoutEngineering {
    pub blueprint_name: String,
    pub level: u8,
    #[serde(default)]
    pub quality: Option<f64>,
    #[serde(default)]
    pub experimental_effect: Option<String>,
}

impl From<&LoadoutEngineering> for Engineering {
    fn from(e: &LoadoutEngineering) -> Self {
        Self {
            blueprint: e.blueprint_name.clone(),
            grade: e.level,
            quality: e.quality.unwrap_or(DEFAULT_QUALITY),
            special: e.experimental_effect.clone().filter(|s| !s.is_empty()),
        }
    }
}

impl Loadout {
    fn find(&self, slot: &str) -> Option<&LoadoutModule> {
        self.modules.iter().find(|m| m.slot.eq_ignore_ascii_case(slot))
    }
}

fn assign(module: &LoadoutModule, slot: SlotId) -> SlotAssignment {
    let assignment = SlotAssignment::new(slot, module.item.clone()).with_power(module.on, module.priority);
    match &module.engineering {
        Some(engineering) => assignment.with_engineering(engineering.into()),
        None => assignment,
    }
}

/// `<Size>Hardpoint<n>` for each hardpoint, numbered within runs of equal class
fn hardpoint_names(ship: &Ship) -> Vec<String> {
    let mut names = Vec::with_capacity(ship.hardpoints.len());
    let mut previous = None;
    let mut ordinal = 0;
    for &class in &ship.hardpoints {
        if previous == Some(class) {
            ordinal += 1;
        } else {
            previous = Some(class);
            ordinal = 1;
        }
        let size = HARDPOINT_SIZES.get(usize::from(class)).copied().unwrap_or("Huge");
        names.push(format!("{size}Hardpoint{ordinal}"));
    }
    names
}

fn standard_assignments(loadout: &Loadout, out: &mut Vec<SlotAssignment>) -> Result<bool, ImportError> {
    let mut has_hatch = false;
    for module in &loadout.modules {
        let slot = module.slot.as_str();
        if slot.eq_ignore_ascii_case("CargoHatch") {
            has_hatch = true;
            out.push(SlotAssignment::cargo_hatch(module.on, module.priority));
        } else if slot.eq_ignore_ascii_case("Armour") {
            if bulkhead_index(&module.item).is_none() {
                return Err(ImportError::Domain(format!("Unknown bulkheads \"{}\"", module.item)));
            }
            out.push(assign(module, SlotId::Bulkheads));
        } else if let Some(i) = STANDARD_SLOTS.iter().position(|s| s.eq_ignore_ascii_case(slot)) {
            if i == STANDARD_SLOTS.len() - 1 {
                // Fuel tanks are always on and never engineered
                out.push(SlotAssignment::new(SlotId::Standard(i), module.item.clone()).with_power(true, 0));
            } else {
                out.push(assign(module, SlotId::Standard(i)));
            }
        }
    }
    Ok(has_hatch)
}

fn internal_assignments(loadout: &Loadout, ship: &Ship, out: &mut Vec<SlotAssignment>) {
    let mut next_number = 0;
    let mut next_military = 1;
    for (i, slot) in ship.internal.iter().enumerate() {
        let module = if slot.is_military() {
            let name = format!("Military{next_military:02}");
            next_military += 1;
            loadout.find(&name)
        } else {
            // Numbers skip and the size suffix is unrelated to the slot class,
            // so take the next numbered slot present in any size
            let mut found = None;
            while found.is_none() && next_number <= MAX_SLOT_NUMBER {
                found = (0..=MAX_SLOT_SIZE)
                    .find_map(|size| loadout.find(&format!("Slot{next_number:02}_Size{size}")));
                next_number += 1;
            }
            found
        };
        if let Some(module) = module {
            out.push(assign(module, SlotId::Internal(i)));
        }
    }
}

fn assignments(loadout: &Loadout, ship: &Ship) -> Result<Vec<SlotAssignment>, ImportError> {
    let mut out = Vec::new();
    if !standard_assignments(loadout, &mut out)? {
        out.push(SlotAssignment::cargo_hatch(false, 4));
    }
    for (i, name) in hardpoint_names(ship).iter().enumerate() {
        if let Some(module) = loadout.find(name) {
            out.push(assign(module, SlotId::Hardpoint(i)));
        }
    }
    internal_assignments(loadout, ship, &mut out);
    Ok(out)
}

/// Reconstruct and encode the loadout
pub(super) fn reconstruct(loadout: &Loadout) -> Result<SingleBuild, ImportError> {
    let ship = catalog()
        .ship_by_symbol(&loadout.ship)
        .ok_or_else(|| ImportError::Domain(format!("No such ship found: \"{}\"", loadout.ship)))?;
    let build = build_from(&ship.id, &assignments(loadout, ship)?)?;
    debug!(
        ship = %ship.id,
        engineered = build.engineered_modules().count(),
        "journal loadout reconstructed"
    );
    Ok(SingleBuild {
        name: format!("Imported {}", ship.name),
        ship_id: ship.id.clone(),
        code: build.code(),
    })
}

/// Claims `Loadout` events and bare objects with `Ship` and `Modules`
pub(super) fn probe(map: &Map<String, Value>) -> Probe<Loadout> {
    let is_event = map.get("event").and_then(Value::as_str) == Some("Loadout");
    if !is_event && !(map.contains_key("Ship") && map.contains_key("Modules")) {
        return Probe::Skip;
    }
    serde_json::from_value(Value::Object(map.clone()))
        .map_err(|err| ImportError::Schema(format!("Loadout is not valid: {err}")))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code;
    use serde_json::json;

    fn module(slot: &str, item: &str, priority: u8) -> Value {
        json!({ "Slot": slot, "Item": item, "On": true, "Priority": priority })
    }

    fn asp_loadout() -> Value {
        json!({
            "timestamp": "2018-01-01T12:00:00Z",
            "event": "Loadout",
            "Ship": "Asp",
            "ShipName": "Wanderer",
            "Modules": [
                module("Armour", "Asp_Armour_Grade3", 1),
                module("PowerPlant", "Int_Powerplant_Size5_Class5", 1),
                module("MainEngines", "Int_Engine_Size5_Class5", 0),
                {
                    "Slot": "FrameShiftDrive", "Item": "Int_Hyperdrive_Size5_Class5", "On": true, "Priority": 0,
                    "Engineering": {
                        "BlueprintName": "FSD_LongRange", "Level": 5, "Quality": 1.0,
                        "ExperimentalEffect": "special_fsd_heavy"
                    }
                },
                module("LifeSupport", "Int_LifeSupport_Size4_Class2", 0),
                module("PowerDistributor", "Int_PowerDistributor_Size4_Class5", 0),
                module("Radar", "Int_Sensors_Size5_Class2", 0),
                module("FuelTank", "Int_FuelTank_Size5_Class3", 3),
                module("LargeHardpoint2", "Hpt_MultiCannon_Gimbal_Large", 1),
                module("MediumHardpoint1", "Hpt_PulseLaser_Gimbal_Medium", 2),
                module("TinyHardpoint3", "Hpt_ShieldBooster_Size0_Class5", 0),
                module("Slot01_Size6", "Int_ShieldGenerator_Size6_Class5", 0),
                module("Slot03_Size4", "Int_CargoRack_Size3_Class1", 0),
                module("Slot08_Size1", "Int_FuelScoop_Size1_Class5", 0),
                module("PaintJob", "paintjob_asp_default_01", 0),
                module("ShipCockpit", "asp_cockpit", 0)
            ]
        })
    }

    fn loadout(value: Value) -> Loadout {
        match probe(value.as_object().unwrap()) {
            Probe::Match(loadout) => loadout,
            other => panic!("loadout not recognised: {other:?}"),
        }
    }

    #[test]
    fn test_hardpoint_names() {
        let asp = catalog().ship("asp").unwrap();
        assert_eq!(
            hardpoint_names(asp),
            [
                "LargeHardpoint1", "LargeHardpoint2", "MediumHardpoint1", "MediumHardpoint2",
                "SmallHardpoint1", "SmallHardpoint2", "TinyHardpoint1", "TinyHardpoint2",
                "TinyHardpoint3", "TinyHardpoint4",
            ]
        );
    }

    #[test]
    fn test_reconstruct_asp() {
        let single = reconstruct(&loadout(asp_loadout())).unwrap();
        assert_eq!(single.name, "Imported Asp Explorer");
        assert_eq!(single.ship_id, "asp");

        let build = code::decode(&single.code, "asp").unwrap();
        assert_eq!(build.bulkhead_index(), 2);
        assert!(!build.cargo_hatch().enabled);
        assert_eq!(build.cargo_hatch().priority, 4);

        let fuel = build.slot(SlotId::Standard(6)).unwrap();
        assert_eq!(fuel.power.priority, 0);

        assert_eq!(
            build.module(SlotId::Hardpoint(1)).unwrap().template.symbol,
            "Hpt_MultiCannon_Gimbal_Large"
        );
        assert!(build.module(SlotId::Hardpoint(0)).is_none());
        assert_eq!(build.slot(SlotId::Hardpoint(2)).unwrap().power.priority, 2);
        assert!(build.module(SlotId::Hardpoint(8)).is_some());

        // Slot01, Slot03 and Slot08 fill the first three internal slots
        assert_eq!(build.module(SlotId::Internal(0)).unwrap().template.grp, "sg");
        assert_eq!(build.module(SlotId::Internal(1)).unwrap().template.grp, "cr");
        assert_eq!(build.module(SlotId::Internal(2)).unwrap().template.grp, "fs");
        assert!(build.module(SlotId::Internal(3)).is_none());

        let fsd = build.module(SlotId::Standard(2)).unwrap();
        let applied = fsd.blueprint.as_ref().unwrap();
        assert_eq!(applied.blueprint.fdname, "FSD_LongRange");
        assert_eq!(applied.grade, 5);
        assert_eq!(applied.special.unwrap().edname, "special_fsd_heavy");
        assert!(!fsd.modifications.is_empty());
    }

    #[test]
    fn test_cargo_hatch_kept_when_present() {
        let mut value = asp_loadout();
        value["Modules"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "Slot": "CargoHatch", "Item": "ModularCargoBayDoor", "On": true, "Priority": 2 }));
        let single = reconstruct(&loadout(value)).unwrap();
        let build = code::decode(&single.code, "asp").unwrap();
        assert!(build.cargo_hatch().enabled);
        assert_eq!(build.cargo_hatch().priority, 2);
    }

    #[test]
    fn test_military_slots() {
        let value = json!({
            "event": "Loadout",
            "Ship": "Federation_Corvette",
            "Modules": [
                module("Military02", "Int_HullReinforcement_Size5_Class2", 0),
                module("Slot01_Size7", "Int_CargoRack_Size3_Class1", 0)
            ]
        });
        let single = reconstruct(&loadout(value)).unwrap();
        let build = code::decode(&single.code, "federal_corvette").unwrap();
        assert_eq!(build.module(SlotId::Internal(0)).unwrap().template.grp, "cr");
        assert!(build.module(SlotId::Internal(13)).is_none());
        assert_eq!(build.module(SlotId::Internal(14)).unwrap().template.grp, "hr");
    }

    #[test]
    fn test_unknown_ship() {
        let mut value = asp_loadout();
        value["Ship"] = json!("Spaceball");
        let err = reconstruct(&loadout(value)).unwrap_err();
        assert_eq!(err.message(), "No such ship found: \"Spaceball\"");
    }

    #[test]
    fn test_unknown_bulkheads() {
        let mut value = asp_loadout();
        value["Modules"][0]["Item"] = json!("Asp_Armour_Paper");
        let err = reconstruct(&loadout(value)).unwrap_err();
        assert_eq!(err.message(), "Unknown bulkheads \"Asp_Armour_Paper\"");
    }

    #[test]
    fn test_unknown_module_is_domain_error() {
        let mut value = asp_loadout();
        value["Modules"][1]["Item"] = json!("Int_Powerplant_Size9_Class9");
        let err = reconstruct(&loadout(value)).unwrap_err();
        assert!(matches!(err, ImportError::Domain(_)));
    }

    #[test]
    fn test_probe() {
        let bare = json!({ "Ship": "Asp", "Modules": [] });
        assert!(matches!(probe(bare.as_object().unwrap()), Probe::Match(_)));
        let other = json!({ "event": "FSDJump" });
        assert!(matches!(probe(other.as_object().unwrap()), Probe::Skip));
        let broken = json!({ "event": "Loadout", "Ship": "Asp" });
        assert!(matches!(probe(broken.as_object().unwrap()), Probe::Reject(ImportError::Schema(_))));
    }
}
