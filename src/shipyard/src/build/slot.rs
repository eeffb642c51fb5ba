//! Slots and slot addressing

use std::fmt;

use crate::catalog::Ship;
use crate::module::ModuleInstance;

/// Highest power priority a slot can carry (one base-36 digit)
pub const MAX_PRIORITY: u8 = 35;

/// Address of a slot within a ship's layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    /// Power state only; holds no module
    CargoHatch,
    Bulkheads,
    Standard(usize),
    Hardpoint(usize),
    Internal(usize),
}

impl SlotId {
    /// Slot at `index` in component order: standard, hardpoints, internal
    pub fn from_component_index(ship: &Ship, index: usize) -> Option<Self> {
        let standard = ship.standard.len();
        let hardpoints = standard + ship.hardpoints.len();
        let internal = hardpoints + ship.internal.len();
        match index {
            i if i < standard => Some(Self::Standard(i)),
            i if i < hardpoints => Some(Self::Hardpoint(i - standard)),
            i if i < internal => Some(Self::Internal(i - hardpoints)),
            _ => None,
        }
    }

    pub fn component_index(self, ship: &Ship) -> Option<usize> {
        match self {
            Self::Standard(i) if i < ship.standard.len() => Some(i),
            Self::Hardpoint(i) if i < ship.hardpoints.len() => Some(ship.standard.len() + i),
            Self::Internal(i) if i < ship.internal.len() => {
                Some(ship.standard.len() + ship.hardpoints.len() + i)
            }
            _ => None,
        }
    }

    /// Slot at `index` of the modifications block, where 0 is the bulkheads
    pub fn from_modification_index(ship: &Ship, index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Bulkheads),
            i => Self::from_component_index(ship, i - 1),
        }
    }

    pub fn modification_index(self, ship: &Ship) -> Option<usize> {
        match self {
            Self::Bulkheads => Some(0),
            other => other.component_index(ship).map(|i| i + 1),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CargoHatch => write!(f, "cargo hatch"),
            Self::Bulkheads => write!(f, "bulkheads"),
            Self::Standard(i) => write!(f, "standard slot {}", i + 1),
            Self::Hardpoint(i) => write!(f, "hardpoint {}", i + 1),
            Self::Internal(i) => write!(f, "internal slot {}", i + 1),
        }
    }
}

/// Power-management state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerState {
    pub enabled: bool,
    /// Zero-based power priority group
    pub priority: u8,
}

impl Default for PowerState {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub max_class: u8,
    pub module: Option<ModuleInstance>,
    pub power: PowerState,
}

impl Slot {
    pub fn empty(max_class: u8) -> Self {
        Self {
            max_class,
            module: None,
            power: PowerState::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.module.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;

    #[test]
    fn test_component_indices() {
        let asp = catalog().ship("asp").unwrap();
        assert_eq!(SlotId::from_component_index(asp, 0), Some(SlotId::Standard(0)));
        assert_eq!(SlotId::from_component_index(asp, 7), Some(SlotId::Hardpoint(0)));
        assert_eq!(SlotId::from_component_index(asp, 17), Some(SlotId::Internal(0)));
        assert_eq!(SlotId::from_component_index(asp, 25), None);

        for i in 0..asp.component_slot_count() {
            let id = SlotId::from_component_index(asp, i).unwrap();
            assert_eq!(id.component_index(asp), Some(i));
        }
        assert_eq!(SlotId::Internal(8).component_index(asp), None);
    }

    #[test]
    fn test_modification_indices() {
        let asp = catalog().ship("asp").unwrap();
        assert_eq!(SlotId::from_modification_index(asp, 0), Some(SlotId::Bulkheads));
        assert_eq!(SlotId::from_modification_index(asp, 1), Some(SlotId::Standard(0)));
        assert_eq!(SlotId::Hardpoint(2).modification_index(asp), Some(10));
        assert_eq!(SlotId::CargoHatch.modification_index(asp), None);
    }

    #[test]
    fn test_display_is_one_based() {
        assert_eq!(SlotId::Hardpoint(0).to_string(), "hardpoint 1");
        assert_eq!(SlotId::Internal(4).to_string(), "internal slot 5");
    }
}
