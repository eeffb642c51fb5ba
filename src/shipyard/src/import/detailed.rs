//! Detailed build exports
//!
//! A detailed export describes every fitted module by group, class and
//! rating rather than by id. Version 4 exports also carry the build code
//! of the exported build; its modifications segment supplies the
//! engineering, since the component list does not.
//!
//! Any failure inside one build is reported with a generic message naming
//! the build; the underlying cause is logged.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{ImportError, Probe, SingleBuild, Snapshot, SourceFormat};
use crate::build::{build_from, SlotAssignment, SlotId};
use crate::catalog::{catalog, ModuleQuery, ModuleTemplate, Mount, Ship, BULKHEAD_NAMES};
use crate::code;

const SCHEMA_MARKER: &str = "ship-loadout";
const V4_SCHEMA: &str = "/4.json";

fn enabled() -> bool {
    true
}

fn first_priority() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedBuild {
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,
    pub name: String,
    /// Ship display name
    pub ship: String,
    pub references: Vec<Reference>,
    pub components: Components,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub ship_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Components {
    pub standard: StandardComponents,
    #[serde(default)]
    pub hardpoints: Vec<Option<Component>>,
    #[serde(default)]
    pub utility: Vec<Option<Component>>,
    #[serde(default)]
    pub internal: Vec<Option<Component>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardComponents {
    /// Bulkhead display name ("Reactive Surface Composite")
    pub bulkheads: String,
    #[serde(default)]
    pub cargo_hatch: Option<PowerSetting>,
    pub power_plant: Component,
    pub thrusters: Component,
    pub frame_shift_drive: Component,
    pub life_support: Component,
    pub power_distributor: Component,
    pub sensors: Component,
    pub fuel_tank: Component,
}

impl StandardComponents {
    /// Standard modules in slot order
    fn slots(&self) -> [&Component; 7] {
        [
            &self.power_plant,
            &self.thrusters,
            &self.frame_shift_drive,
            &self.life_support,
            &self.power_distributor,
            &self.sensors,
            &self.fuel_tank,
        ]
    }
}

/// Power state of a slot; priorities are 1-based in exports
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PowerSetting {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "first_priority")]
    pub priority: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    pub class: u8,
    pub rating: char,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "first_priority")]
    pub priority: u8,
    /// Group display name ("Pulse Laser"); absent on standard modules
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub missile: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl DetailedBuild {
    fn format(&self) -> SourceFormat {
        let v4_schema = self.schema.as_deref().is_some_and(|s| s.contains(V4_SCHEMA));
        if v4_schema || self.modifications_block().is_some() {
            SourceFormat::DetailedExportV4
        } else {
            SourceFormat::DetailedExportV3
        }
    }

    /// Non-empty modifications segment of the first reference code
    fn modifications_block(&self) -> Option<&str> {
        self.references
            .iter()
            .find_map(|r| r.code.as_deref())
            .and_then(|code| code.split('.').nth(3))
            .filter(|block| !block.is_empty())
    }
}

fn invalid_data(ship: &str, name: &str) -> String {
    format!("{ship} Build \"{name}\": Invalid data")
}

fn unresolved(component: &Component, slot: SlotId) -> ImportError {
    ImportError::Domain(format!(
        "No {}{} {} for {slot}",
        component.class,
        component.rating,
        component.group.as_deref().unwrap_or("module")
    ))
}

// ============================================================================
// Reconstruction
// ============================================================================

fn resolve(component: &Component, slot: SlotId) -> Result<&'static ModuleTemplate, ImportError> {
    let c = catalog();
    let found = match slot {
        SlotId::Standard(i) => c.standard_module(i, component.class, component.rating),
        _ => {
            let group = component
                .group
                .as_deref()
                .ok_or_else(|| ImportError::Schema(format!("Missing group for {slot}")))?;
            c.find_module(&ModuleQuery {
                group,
                class: component.class,
                rating: component.rating,
                mount: component.mount.as_deref().and_then(Mount::parse),
                missile: component.missile.as_deref().and_then(|m| m.chars().next()),
                name: component.name.as_deref(),
            })
        }
    };
    found.ok_or_else(|| unresolved(component, slot))
}

fn assign(component: &Component, slot: SlotId) -> Result<SlotAssignment, ImportError> {
    let template = resolve(component, slot)?;
    Ok(SlotAssignment::new(slot, template.symbol.clone())
        .with_power(component.enabled, component.priority.saturating_sub(1)))
}

/// Place export entries into `slots` in order; null entries leave a slot empty
fn assign_run(
    entries: &[Option<Component>],
    slots: impl Iterator<Item = SlotId>,
    out: &mut Vec<SlotAssignment>,
) -> Result<(), ImportError> {
    let mut slots = slots;
    for entry in entries {
        let slot = slots.next();
        let Some(component) = entry else { continue };
        let slot = slot.ok_or_else(|| {
            ImportError::Compatibility(format!(
                "No slot left for {}{} {}",
                component.class,
                component.rating,
                component.group.as_deref().unwrap_or("module")
            ))
        })?;
        out.push(assign(component, slot)?);
    }
    Ok(())
}

fn assignments(build: &DetailedBuild, ship: &Ship) -> Result<Vec<SlotAssignment>, ImportError> {
    let standard = &build.components.standard;
    let mut out = Vec::new();

    let bulkheads = BULKHEAD_NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(standard.bulkheads.trim()))
        .and_then(|i| ship.bulkheads.get(i))
        .ok_or_else(|| ImportError::Domain(format!("Unknown bulkheads: {}", standard.bulkheads)))?;
    out.push(SlotAssignment::new(SlotId::Bulkheads, bulkheads.clone()));

    if let Some(hatch) = standard.cargo_hatch {
        out.push(SlotAssignment::cargo_hatch(hatch.enabled, hatch.priority.saturating_sub(1)));
    }
    for (i, component) in standard.slots().into_iter().enumerate() {
        out.push(assign(component, SlotId::Standard(i))?);
    }

    let weapons = ship
        .hardpoints
        .iter()
        .enumerate()
        .filter(|&(_, &class)| class > 0)
        .map(|(i, _)| SlotId::Hardpoint(i));
    assign_run(&build.components.hardpoints, weapons, &mut out)?;

    let utility = ship
        .hardpoints
        .iter()
        .enumerate()
        .filter(|&(_, &class)| class == 0)
        .map(|(i, _)| SlotId::Hardpoint(i));
    assign_run(&build.components.utility, utility, &mut out)?;

    let internal = (0..ship.internal.len()).map(SlotId::Internal);
    assign_run(&build.components.internal, internal, &mut out)?;

    Ok(out)
}

/// Hull named by the first reference, which must agree with the display name
fn resolve_ship(build: &DetailedBuild) -> Result<&'static Ship, ImportError> {
    let ship_id = build
        .references
        .first()
        .map(|r| r.ship_id.as_str())
        .ok_or_else(|| ImportError::Schema("No references".to_string()))?;
    let c = catalog();
    let ship = c
        .ship(ship_id)
        .ok_or_else(|| ImportError::Domain(format!("\"{ship_id}\" is not a valid Ship Id!")))?;
    // Unknown display names are tolerated; a different known hull is not
    match c.ship_by_name(&build.ship) {
        Some(named) if named.id != ship.id => Err(ImportError::Domain(format!(
            "Ship \"{}\" does not match reference \"{ship_id}\"",
            build.ship
        ))),
        _ => Ok(ship),
    }
}

fn check_name(build: &DetailedBuild, ship: &Ship) -> Result<(), ImportError> {
    if build.name.trim().is_empty() {
        return Err(ImportError::Schema(format!(
            "{} build \"{}\" must be a string at least 1 character long!",
            ship.name, build.name
        )));
    }
    Ok(())
}

fn rebuild(build: &DetailedBuild, ship: &Ship, format: SourceFormat) -> Result<SingleBuild, ImportError> {
    let mut model = build_from(&ship.id, &assignments(build, ship)?)?;
    if format == SourceFormat::DetailedExportV4 {
        if let Some(block) = build.modifications_block() {
            let block = urlencoding::decode(block)
                .map_err(|_| ImportError::Codec("Modifications are not valid UTF-8".to_string()))?;
            code::apply_modifications(&mut model, &block)?;
        }
    }

    Ok(SingleBuild {
        name: build.name.clone(),
        ship_id: ship.id.clone(),
        code: model.code(),
    })
}

/// Reconstruct and encode one detailed build.
///
/// The hull is checked first, then the build name; both come before any
/// component is resolved.
pub(super) fn reconstruct(build: &DetailedBuild, format: SourceFormat) -> Result<SingleBuild, ImportError> {
    let hide = |err: ImportError| {
        warn!(ship = %build.ship, name = %build.name, error = %err, "detailed build rejected");
        err.with_message(invalid_data(&build.ship, &build.name))
    };
    let ship = resolve_ship(build).map_err(hide)?;
    check_name(build, ship)?;
    rebuild(build, ship, format).map_err(hide)
}

// ============================================================================
// Detection
// ============================================================================

fn is_detailed(map: &Map<String, Value>) -> bool {
    let schema = map
        .get("$schema")
        .and_then(Value::as_str)
        .is_some_and(|s| s.contains(SCHEMA_MARKER));
    schema || map.contains_key("components")
}

fn parse(map: &Map<String, Value>) -> Result<DetailedBuild, ImportError> {
    serde_json::from_value(Value::Object(map.clone())).map_err(|err| {
        let ship = map.get("ship").and_then(Value::as_str).unwrap_or_default();
        let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
        warn!(%ship, %name, error = %err, "detailed build does not match the export schema");
        ImportError::Schema(invalid_data(ship, name))
    })
}

/// Claims objects carrying a loadout schema or a component list
pub(super) fn probe(map: &Map<String, Value>) -> Probe<(SourceFormat, DetailedBuild)> {
    if !is_detailed(map) {
        return Probe::Skip;
    }
    parse(map)
        .map(|build| {
            let format = build.format();
            debug!(%format, name = %build.name, "detailed export");
            (format, build)
        })
        .into()
}

/// Import every build of an export array; the first failure aborts
pub(super) fn import_array(items: &[Value]) -> Result<Snapshot, ImportError> {
    let mut builds: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        let map = item
            .as_object()
            .filter(|m| is_detailed(m))
            .ok_or_else(|| ImportError::Schema(format!("Build #{} is not a detailed export!", index + 1)))?;
        let build = parse(map)?;
        let single = reconstruct(&build, build.format())?;
        builds.entry(single.ship_id).or_default().insert(single.name, single.code);
    }
    if builds.is_empty() {
        return Err(ImportError::Schema("No builds found!".to_string()));
    }
    Ok(Snapshot {
        builds,
        ..Snapshot::default()
    })
}
