//! Build model
//!
//! A [`Build`] is one hull with every slot populated (or deliberately empty),
//! per-slot power state and per-module engineering. It is only mutated
//! through methods that check slot compatibility, and every mutation
//! recomputes the build code so the build can be shared at any point.

mod slot;

pub use slot::{PowerState, Slot, SlotId, MAX_PRIORITY};

use std::io;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{catalog, GroupKind, ModuleTemplate, Ship, BULKHEAD_SUFFIXES, STANDARD_GROUPS};
use crate::code::{self, BuildCodes};
use crate::engineering::{self, Engineering, EngineeringError};
use crate::module::ModuleInstance;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Unknown ship: {0}")]
    UnknownHull(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Unknown bulkheads: {0}")]
    UnknownBulkheads(String),

    #[error("{module} does not fit {slot}")]
    IncompatibleModule { module: String, slot: SlotId },

    #[error("No such slot: {0}")]
    NoSuchSlot(SlotId),

    #[error("{0} is empty")]
    EmptySlot(SlotId),

    #[error("{0} cannot be emptied")]
    RequiredSlot(SlotId),

    #[error("Priority {0} is out of range (0-35)")]
    InvalidPriority(u8),

    #[error(transparent)]
    Engineering(#[from] EngineeringError),

    #[error("Failed to encode build: {0}")]
    Encode(#[from] io::Error),
}

/// One slot of a build descriptor, as produced by the import sources
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignment {
    pub slot: SlotId,
    /// Module telemetry symbol; `None` leaves the slot empty
    pub module: Option<String>,
    pub enabled: bool,
    pub priority: u8,
    pub engineering: Option<Engineering>,
}

impl SlotAssignment {
    pub fn new(slot: SlotId, module: impl Into<String>) -> Self {
        Self {
            slot,
            module: Some(module.into()),
            enabled: true,
            priority: 0,
            engineering: None,
        }
    }

    pub fn cargo_hatch(enabled: bool, priority: u8) -> Self {
        Self {
            slot: SlotId::CargoHatch,
            module: None,
            enabled,
            priority,
            engineering: None,
        }
    }

    pub fn with_power(mut self, enabled: bool, priority: u8) -> Self {
        self.enabled = enabled;
        self.priority = priority;
        self
    }

    pub fn with_engineering(mut self, engineering: Engineering) -> Self {
        self.engineering = Some(engineering);
        self
    }
}

/// Bulkhead grade encoded in a bulkhead symbol suffix
pub fn bulkhead_index(symbol: &str) -> Option<usize> {
    let symbol = symbol.to_ascii_lowercase();
    BULKHEAD_SUFFIXES
        .iter()
        .position(|suffix| symbol.ends_with(suffix))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Build {
    ship: &'static Ship,
    cargo_hatch: PowerState,
    bulkhead_index: usize,
    bulkheads: ModuleInstance,
    standard: Vec<Slot>,
    hardpoints: Vec<Slot>,
    internal: Vec<Slot>,
    codes: BuildCodes,
}

impl Build {
    /// An unfitted build of `ship_id`: lightest bulkheads, every slot empty
    pub fn new(ship_id: &str) -> Result<Self, BuildError> {
        let ship = catalog()
            .ship(ship_id)
            .ok_or_else(|| BuildError::UnknownHull(ship_id.to_string()))?;
        let mut build = Self::empty(ship)?;
        build.refresh_codes()?;
        Ok(build)
    }

    /// Unfitted build whose codes are not computed yet
    pub(crate) fn empty(ship: &'static Ship) -> Result<Self, BuildError> {
        let bulkheads = Self::bulkhead_template(ship, 0)?;
        Ok(Self {
            ship,
            cargo_hatch: PowerState::default(),
            bulkhead_index: 0,
            bulkheads: ModuleInstance::new(bulkheads),
            standard: ship.standard.iter().map(|&c| Slot::empty(c)).collect(),
            hardpoints: ship.hardpoints.iter().map(|&c| Slot::empty(c)).collect(),
            internal: ship.internal.iter().map(|s| Slot::empty(s.class)).collect(),
            codes: BuildCodes::default(),
        })
    }

    fn bulkhead_template(ship: &Ship, index: usize) -> Result<&'static ModuleTemplate, BuildError> {
        let symbol = ship
            .bulkheads
            .get(index)
            .ok_or_else(|| BuildError::UnknownBulkheads(format!("{} grade {}", ship.id, index)))?;
        catalog()
            .module_by_symbol(symbol)
            .ok_or_else(|| BuildError::UnknownBulkheads(symbol.clone()))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn ship(&self) -> &'static Ship {
        self.ship
    }

    pub fn cargo_hatch(&self) -> PowerState {
        self.cargo_hatch
    }

    pub fn bulkhead_index(&self) -> usize {
        self.bulkhead_index
    }

    pub fn bulkheads(&self) -> &ModuleInstance {
        &self.bulkheads
    }

    pub fn standard(&self) -> &[Slot] {
        &self.standard
    }

    pub fn hardpoints(&self) -> &[Slot] {
        &self.hardpoints
    }

    pub fn internal(&self) -> &[Slot] {
        &self.internal
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        match id {
            SlotId::Standard(i) => self.standard.get(i),
            SlotId::Hardpoint(i) => self.hardpoints.get(i),
            SlotId::Internal(i) => self.internal.get(i),
            SlotId::CargoHatch | SlotId::Bulkheads => None,
        }
    }

    fn slot_mut(&mut self, id: SlotId) -> Result<&mut Slot, BuildError> {
        let slot = match id {
            SlotId::Standard(i) => self.standard.get_mut(i),
            SlotId::Hardpoint(i) => self.hardpoints.get_mut(i),
            SlotId::Internal(i) => self.internal.get_mut(i),
            SlotId::CargoHatch | SlotId::Bulkheads => None,
        };
        slot.ok_or(BuildError::NoSuchSlot(id))
    }

    /// Module fitted at `id`, including the bulkheads
    pub fn module(&self, id: SlotId) -> Option<&ModuleInstance> {
        match id {
            SlotId::Bulkheads => Some(&self.bulkheads),
            other => self.slot(other)?.module.as_ref(),
        }
    }

    pub(crate) fn module_mut(&mut self, id: SlotId) -> Result<Option<&mut ModuleInstance>, BuildError> {
        match id {
            SlotId::Bulkheads => Ok(Some(&mut self.bulkheads)),
            other => Ok(self.slot_mut(other)?.module.as_mut()),
        }
    }

    /// Slots in component order: standard, hardpoints, internal
    pub fn component_slots(&self) -> impl Iterator<Item = (SlotId, &Slot)> {
        let standard = self
            .standard
            .iter()
            .enumerate()
            .map(|(i, s)| (SlotId::Standard(i), s));
        let hardpoints = self
            .hardpoints
            .iter()
            .enumerate()
            .map(|(i, s)| (SlotId::Hardpoint(i), s));
        let internal = self
            .internal
            .iter()
            .enumerate()
            .map(|(i, s)| (SlotId::Internal(i), s));
        standard.chain(hardpoints).chain(internal)
    }

    /// Power states in power order: cargo hatch, then component order
    pub fn power_states(&self) -> Vec<PowerState> {
        std::iter::once(self.cargo_hatch)
            .chain(self.component_slots().map(|(_, s)| s.power))
            .collect()
    }

    /// Engineered modules in modifications order, bulkheads first
    pub fn engineered_modules(&self) -> impl Iterator<Item = (SlotId, &ModuleInstance)> {
        std::iter::once((SlotId::Bulkheads, &self.bulkheads))
            .chain(
                self.component_slots()
                    .filter_map(|(id, s)| s.module.as_ref().map(|m| (id, m))),
            )
            .filter(|(_, m)| m.is_engineered())
    }

    pub fn codes(&self) -> &BuildCodes {
        &self.codes
    }

    /// The four-segment build code
    pub fn code(&self) -> String {
        self.codes.to_string()
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    pub fn use_bulkheads(&mut self, index: usize) -> Result<(), BuildError> {
        self.place_bulkheads(index)?;
        self.refresh_codes()
    }

    /// Fit `template` at `id`, or empty the slot with `None`
    pub fn use_module(
        &mut self,
        id: SlotId,
        template: Option<&'static ModuleTemplate>,
    ) -> Result<(), BuildError> {
        self.place(id, template)?;
        self.refresh_codes()
    }

    pub fn set_power(&mut self, id: SlotId, enabled: bool, priority: u8) -> Result<(), BuildError> {
        self.place_power(id, enabled, priority)?;
        self.refresh_codes()
    }

    /// Run an engineering operation on the module at `id`.
    ///
    /// The module is left untouched when the operation fails.
    pub fn modify<T>(
        &mut self,
        id: SlotId,
        op: impl FnOnce(&mut ModuleInstance) -> Result<T, EngineeringError>,
    ) -> Result<T, BuildError> {
        let module = self.module_mut(id)?.ok_or(BuildError::EmptySlot(id))?;
        let mut working = module.clone();
        let out = op(&mut working)?;
        *module = working;
        self.refresh_codes()?;
        Ok(out)
    }

    pub(crate) fn place_bulkheads(&mut self, index: usize) -> Result<(), BuildError> {
        let template = Self::bulkhead_template(self.ship, index)?;
        self.bulkhead_index = index;
        self.bulkheads = ModuleInstance::new(template);
        Ok(())
    }

    pub(crate) fn place(
        &mut self,
        id: SlotId,
        template: Option<&'static ModuleTemplate>,
    ) -> Result<(), BuildError> {
        match (id, template) {
            (SlotId::CargoHatch, _) => Err(BuildError::NoSuchSlot(id)),
            (SlotId::Bulkheads, None) => Err(BuildError::RequiredSlot(id)),
            (SlotId::Bulkheads, Some(t)) => {
                let index = self
                    .ship
                    .bulkheads
                    .iter()
                    .position(|s| s.eq_ignore_ascii_case(&t.symbol))
                    .ok_or_else(|| BuildError::IncompatibleModule {
                        module: t.symbol.clone(),
                        slot: id,
                    })?;
                self.place_bulkheads(index)
            }
            (_, None) => {
                self.slot_mut(id)?.module = None;
                Ok(())
            }
            (_, Some(t)) => {
                self.slot_mut(id)?;
                self.check_fit(id, t)?;
                self.slot_mut(id)?.module = Some(ModuleInstance::new(t));
                Ok(())
            }
        }
    }

    pub(crate) fn place_power(&mut self, id: SlotId, enabled: bool, priority: u8) -> Result<(), BuildError> {
        if priority > MAX_PRIORITY {
            return Err(BuildError::InvalidPriority(priority));
        }
        let power = PowerState { enabled, priority };
        match id {
            SlotId::CargoHatch => self.cargo_hatch = power,
            SlotId::Bulkheads => return Err(BuildError::NoSuchSlot(id)),
            other => self.slot_mut(other)?.power = power,
        }
        Ok(())
    }

    fn check_fit(&self, id: SlotId, template: &ModuleTemplate) -> Result<(), BuildError> {
        let kind = catalog().group(&template.grp).map(|g| g.kind);
        let fits = match id {
            SlotId::Standard(i) => {
                STANDARD_GROUPS.get(i) == Some(&template.grp.as_str())
                    && template.class <= self.ship.standard[i]
            }
            SlotId::Hardpoint(i) => {
                let class = self.ship.hardpoints[i];
                kind == Some(GroupKind::Hardpoint)
                    && if class == 0 {
                        template.is_utility()
                    } else {
                        !template.is_utility() && template.class <= class
                    }
            }
            SlotId::Internal(i) => {
                let slot = &self.ship.internal[i];
                kind == Some(GroupKind::Internal)
                    && template.class <= slot.class
                    && slot.accepts(&template.grp)
            }
            SlotId::CargoHatch | SlotId::Bulkheads => false,
        };
        if fits {
            Ok(())
        } else {
            Err(BuildError::IncompatibleModule {
                module: template.symbol.clone(),
                slot: id,
            })
        }
    }

    fn apply(&mut self, assignment: &SlotAssignment) -> Result<(), BuildError> {
        let id = assignment.slot;
        match id {
            SlotId::CargoHatch => {
                return self.place_power(id, assignment.enabled, assignment.priority);
            }
            SlotId::Bulkheads => {
                let symbol = assignment.module.as_deref().unwrap_or_default();
                let index = bulkhead_index(symbol)
                    .ok_or_else(|| BuildError::UnknownBulkheads(symbol.to_string()))?;
                self.place_bulkheads(index)?;
            }
            _ => {
                let template = match assignment.module.as_deref() {
                    Some(symbol) => Some(
                        catalog()
                            .module_by_symbol(symbol)
                            .ok_or_else(|| BuildError::UnknownModule(symbol.to_string()))?,
                    ),
                    None => None,
                };
                self.place(id, template)?;
                self.place_power(id, assignment.enabled, assignment.priority)?;
            }
        }

        if let Some(engineering) = &assignment.engineering {
            if let Some(module) = self.module_mut(id)? {
                engineering::engineer(module, engineering)?;
            }
        }
        Ok(())
    }

    pub(crate) fn refresh_codes(&mut self) -> Result<(), BuildError> {
        self.codes = code::compute_codes(self)?;
        Ok(())
    }
}

/// Construct a validated build from a slot descriptor.
///
/// Assignments apply in order; slots without an assignment stay empty.
pub fn build_from(hull_id: &str, assignments: &[SlotAssignment]) -> Result<Build, BuildError> {
    let ship = catalog()
        .ship(hull_id)
        .ok_or_else(|| BuildError::UnknownHull(hull_id.to_string()))?;
    let mut build = Build::empty(ship)?;
    for assignment in assignments {
        build.apply(assignment)?;
    }
    build.refresh_codes()?;
    debug!(ship = hull_id, code = %build.code(), "built");
    Ok(build)
}
