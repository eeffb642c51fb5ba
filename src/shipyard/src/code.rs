//! Build code codec
//!
//! A build code is four dot-separated segments:
//!
//! ```text
//! <components>.<power priorities>.<power enabled>.<modifications>
//! ```
//!
//! - components: version marker `A`, the bulkhead grade digit, then per
//!   component slot the module's two-character id or `-` when empty
//! - power priorities: one base-36 digit per power slot (cargo hatch,
//!   standard, hardpoints, internal), LZ-compressed to base64
//! - power enabled: `1` or `0` per power slot, compressed the same way
//! - modifications: gzip + base64 block, empty when nothing is engineered
//!
//! Codes travel in URLs, so every segment is percent-decoded first.
//!
//! Codes produced by the web outfitter put the enabled segment before the
//! priorities; swap those two segments before decoding such a code.

mod lzstring;
pub mod modifications;

use std::fmt;
use std::io;
use thiserror::Error;
use tracing::debug;

use crate::build::{Build, BuildError, PowerState, SlotId};
use crate::catalog::catalog;
use crate::engineering::{self, EngineeringError};
use modifications::SlotRecord;

/// Component segment version marker
pub const CODE_VERSION: char = 'A';

/// Placeholder for an empty component slot
const EMPTY_SLOT: char = '-';

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Build code is empty")]
    Empty,

    #[error("Unknown ship: {0}")]
    UnknownHull(String),

    #[error("Build code is not valid percent-encoded UTF-8")]
    InvalidEncoding,

    #[error("Build code has {0} segments (at most 4)")]
    TooManySegments(usize),

    #[error("Unsupported build code version: {0:?}")]
    InvalidVersion(char),

    #[error("Invalid bulkheads: {0:?}")]
    InvalidBulkheads(char),

    #[error("Build code has {found} component slots, ship has {expected}")]
    SlotCountMismatch { expected: usize, found: usize },

    #[error("Unknown module id: {0}")]
    UnknownModule(String),

    #[error("Invalid power {0} segment")]
    InvalidPowerSegment(&'static str),

    #[error("Power {segment} segment has {found} slots, ship has {expected}")]
    PowerCountMismatch {
        segment: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Corrupt modifications: {0}")]
    CorruptModifications(String),

    #[error("Modification slot index {0} is out of range")]
    InvalidSlotIndex(usize),

    #[error("Modifications for empty {0}")]
    ModificationsOnEmptySlot(SlotId),

    #[error("Unknown blueprint id: {0}")]
    UnknownBlueprint(i32),

    #[error("Unknown special effect id: {0}")]
    UnknownSpecial(i32),

    #[error("Unknown feature id: {0}")]
    UnknownFeature(i8),

    #[error(transparent)]
    Engineering(#[from] EngineeringError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// The four derived code segments of a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildCodes {
    pub components: String,
    pub power_priorities: String,
    pub power_enabled: String,
    pub modifications: String,
}

impl fmt::Display for BuildCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.components, self.power_priorities, self.power_enabled, self.modifications
        )
    }
}

// ============================================================================
// Encoding
// ============================================================================

fn components(build: &Build) -> String {
    let mut out = String::with_capacity(2 + 2 * build.ship().component_slot_count());
    out.push(CODE_VERSION);
    out.push_str(&build.bulkhead_index().to_string());
    for (_, slot) in build.component_slots() {
        match &slot.module {
            Some(module) => out.push_str(&module.template.id),
            None => out.push(EMPTY_SLOT),
        }
    }
    out
}

fn priority_digits(states: &[PowerState]) -> io::Result<String> {
    states
        .iter()
        .map(|s| {
            char::from_digit(u32::from(s.priority), 36).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("priority {} has no base-36 digit", s.priority),
                )
            })
        })
        .collect()
}

fn enabled_digits(states: &[PowerState]) -> String {
    states
        .iter()
        .map(|s| if s.enabled { '1' } else { '0' })
        .collect()
}

/// Wire records for every engineered module, in slot order
pub fn slot_records(build: &Build) -> Vec<SlotRecord> {
    let ship = build.ship();
    build
        .engineered_modules()
        .filter_map(|(id, module)| {
            let slot = id.modification_index(ship)?;
            let applied = module.blueprint;
            Some(SlotRecord {
                slot,
                blueprint: applied.map(|a| a.blueprint.id),
                grade: applied.map(|a| i32::from(a.grade)),
                special: applied.and_then(|a| a.special).map(|s| s.id),
                deltas: module
                    .modifications
                    .iter()
                    .map(|d| (d.feature.id, d.value))
                    .collect(),
            })
        })
        .collect()
}

/// Compute the derived code segments of a build
pub fn compute_codes(build: &Build) -> io::Result<BuildCodes> {
    let power = build.power_states();
    Ok(BuildCodes {
        components: components(build),
        power_priorities: lzstring::compress_to_base64(&priority_digits(&power)?),
        power_enabled: lzstring::compress_to_base64(&enabled_digits(&power)),
        modifications: modifications::encode(&slot_records(build))?,
    })
}

/// The build code of `build`
pub fn encode(build: &Build) -> String {
    build.code()
}

// ============================================================================
// Decoding
// ============================================================================

/// Split the component segment into per-slot module ids
fn component_ids(segment: &str) -> Vec<Option<String>> {
    let mut ids = Vec::new();
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == EMPTY_SLOT {
            ids.push(None);
        } else {
            let mut id = String::from(c);
            id.extend(chars.next());
            ids.push(Some(id));
        }
    }
    ids
}

fn power_digits(
    segment: Option<&str>,
    name: &'static str,
    expected: usize,
) -> Result<Option<Vec<char>>, DecodeError> {
    let Some(segment) = segment.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let digits: Vec<char> = lzstring::decompress_from_base64(segment)
        .ok_or(DecodeError::InvalidPowerSegment(name))?
        .chars()
        .collect();
    if digits.len() != expected {
        return Err(DecodeError::PowerCountMismatch {
            segment: name,
            expected,
            found: digits.len(),
        });
    }
    Ok(Some(digits))
}

fn apply_record(build: &mut Build, record: &SlotRecord) -> Result<(), DecodeError> {
    let c = catalog();
    let id = SlotId::from_modification_index(build.ship(), record.slot)
        .ok_or(DecodeError::InvalidSlotIndex(record.slot))?;
    let module = build
        .module_mut(id)?
        .ok_or(DecodeError::ModificationsOnEmptySlot(id))?;

    if let Some(blueprint_id) = record.blueprint {
        let blueprint = c
            .blueprint_by_id(blueprint_id)
            .ok_or(DecodeError::UnknownBlueprint(blueprint_id))?;
        let grade = record
            .grade
            .and_then(|g| u8::try_from(g).ok())
            .unwrap_or(1);
        engineering::set_blueprint(module, &blueprint.fdname, grade)?;
    }
    if let Some(special_id) = record.special {
        let special = c
            .special_by_id(special_id)
            .ok_or(DecodeError::UnknownSpecial(special_id))?;
        engineering::set_special(module, Some(&special.edname))?;
    }
    for &(feature_id, value) in &record.deltas {
        let feature = c
            .feature_by_id(feature_id)
            .ok_or(DecodeError::UnknownFeature(feature_id))?;
        module.set_modification(feature, value);
    }
    Ok(())
}

/// Reconstruct a build of `hull_id` from its code
pub fn decode(code: &str, hull_id: &str) -> Result<Build, DecodeError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(DecodeError::Empty);
    }
    let ship = catalog()
        .ship(hull_id)
        .ok_or_else(|| DecodeError::UnknownHull(hull_id.to_string()))?;

    let segments = code
        .split('.')
        .map(|s| urlencoding::decode(s).map(|s| s.into_owned()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| DecodeError::InvalidEncoding)?;
    if segments.len() > 4 {
        return Err(DecodeError::TooManySegments(segments.len()));
    }
    let segment = |i: usize| segments.get(i).map(String::as_str);

    // Components
    let mut header = segments[0].chars();
    match header.next() {
        Some(CODE_VERSION) => {}
        other => return Err(DecodeError::InvalidVersion(other.unwrap_or(' '))),
    }
    let bulkhead_char = header.next().unwrap_or(' ');
    let bulkheads = bulkhead_char
        .to_digit(10)
        .map(|d| d as usize)
        .filter(|&d| d < ship.bulkheads.len())
        .ok_or(DecodeError::InvalidBulkheads(bulkhead_char))?;

    let ids = component_ids(header.as_str());
    if ids.len() != ship.component_slot_count() {
        return Err(DecodeError::SlotCountMismatch {
            expected: ship.component_slot_count(),
            found: ids.len(),
        });
    }

    let mut build = Build::empty(ship)?;
    build.place_bulkheads(bulkheads)?;
    for (index, id) in ids.iter().enumerate() {
        let Some(id) = id else { continue };
        let template = catalog()
            .module_by_id(id)
            .ok_or_else(|| DecodeError::UnknownModule(id.clone()))?;
        if let Some(slot) = SlotId::from_component_index(ship, index) {
            build.place(slot, Some(template))?;
        }
    }

    // Power
    let expected = ship.power_slot_count();
    let priorities = power_digits(segment(1), "priorities", expected)?;
    let enabled = power_digits(segment(2), "enabled", expected)?;
    for index in 0..expected {
        let priority = match &priorities {
            Some(digits) => digits[index]
                .to_digit(36)
                .and_then(|d| u8::try_from(d).ok())
                .ok_or(DecodeError::InvalidPowerSegment("priorities"))?,
            None => 0,
        };
        let on = match enabled.as_ref().map(|digits| digits[index]) {
            None | Some('1') => true,
            Some('0') => false,
            Some(_) => return Err(DecodeError::InvalidPowerSegment("enabled")),
        };
        let slot = match index {
            0 => SlotId::CargoHatch,
            i => SlotId::from_component_index(ship, i - 1)
                .ok_or(DecodeError::InvalidSlotIndex(i))?,
        };
        build.place_power(slot, on, priority)?;
    }

    apply_modifications(&mut build, segment(3).unwrap_or_default())?;
    debug!(ship = hull_id, "decoded build code");
    Ok(build)
}

/// Apply an encoded modifications block to a build and refresh its codes
pub(crate) fn apply_modifications(build: &mut Build, block: &str) -> Result<(), DecodeError> {
    for record in modifications::decode(block)? {
        apply_record(build, &record)?;
    }
    build.refresh_codes()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_from, SlotAssignment};
    use crate::engineering::{Engineering, Roll};

    fn engineered_asp() -> Build {
        let assignments = vec![
            SlotAssignment::cargo_hatch(false, 4),
            SlotAssignment::new(SlotId::Bulkheads, "Asp_Armour_Reactive"),
            SlotAssignment::new(SlotId::Standard(0), "Int_Powerplant_Size5_Class5").with_power(true, 0),
            SlotAssignment::new(SlotId::Standard(1), "Int_Engine_Size5_Class5").with_power(true, 1),
            SlotAssignment::new(SlotId::Standard(2), "Int_Hyperdrive_Size5_Class5").with_engineering(Engineering {
                blueprint: "FSD_LongRange".to_string(),
                grade: 5,
                quality: 0.73,
                special: Some("special_fsd_heavy".to_string()),
            }),
            SlotAssignment::new(SlotId::Hardpoint(0), "Hpt_MultiCannon_Gimbal_Large")
                .with_power(true, 2)
                .with_engineering(Engineering {
                    blueprint: "Weapon_Overcharged".to_string(),
                    grade: 3,
                    quality: 0.1,
                    special: Some("special_incendiary_rounds".to_string()),
                }),
            SlotAssignment::new(SlotId::Hardpoint(6), "Hpt_ShieldBooster_Size0_Class5").with_power(false, 35),
            SlotAssignment::new(SlotId::Internal(1), "Int_CargoRack_Size4_Class1"),
        ];
        build_from("asp", &assignments).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let build = engineered_asp();
        let code = encode(&build);
        assert_eq!(code.split('.').count(), 4);
        let decoded = decode(&code, "asp").unwrap();
        assert_eq!(decoded, build);
        assert_eq!(encode(&decoded), code);
    }

    #[test]
    fn test_round_trip_after_edits() {
        let mut build = engineered_asp();
        build
            .modify(SlotId::Standard(2), |m| engineering::roll(m, Roll::Worst))
            .unwrap();
        build.use_bulkheads(1).unwrap();
        build.set_power(SlotId::Internal(1), false, 7).unwrap();
        let decoded = decode(&build.code(), "asp").unwrap();
        assert_eq!(decoded, build);
    }

    #[test]
    fn test_decoded_extreme_delta_with_special() {
        let mut build = engineered_asp();
        build
            .modify(SlotId::Standard(2), |m| {
                m.set_modification(catalog().feature("optmass").unwrap(), i32::MAX);
                Ok(())
            })
            .unwrap();
        let decoded = decode(&build.code(), "asp").unwrap();
        let fsd = decoded.module(SlotId::Standard(2)).unwrap();
        assert_eq!(fsd.modification("optmass"), Some(i32::MAX));
        let deltas = engineering::effective_deltas(fsd);
        let optmass = deltas.iter().find(|d| d.key() == "optmass").unwrap();
        assert_eq!(optmass.value, i32::MAX);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(engineered_asp().code(), engineered_asp().code());
    }

    #[test]
    fn test_component_segment() {
        let build = Build::new("sidewinder").unwrap();
        let codes = build.codes();
        assert_eq!(codes.components, format!("A0{}", "-".repeat(17)));
        assert!(codes.modifications.is_empty());
        assert!(build.code().ends_with('.'));

        let asp = engineered_asp();
        assert!(asp.codes().components.starts_with("A41j1S2r"));
    }

    #[test]
    fn test_decode_shared_power_segments() {
        // Segments 2 and 3 of a web outfitter code, swapped into this order
        let code = format!(
            "A01y{}.CwBhCYzBGW9qCTSqq5xA.AwRj4zNLaA%3D%3D.H4sIAAAAAAAAA2MUe8HMwPD%2FPwMAAGvB0AkAAAA%3D",
            "-".repeat(34)
        );
        let build = decode(&code, "anaconda").unwrap();
        assert_eq!(build.cargo_hatch(), PowerState { enabled: false, priority: 4 });
        assert_eq!(
            build.slot(SlotId::Standard(2)).unwrap().power,
            PowerState { enabled: true, priority: 2 }
        );

        // Deltas stored without a blueprint survive decoding
        let pp = build.module(SlotId::Standard(0)).unwrap();
        assert!(pp.blueprint.is_none());
        assert_eq!(pp.modification("ammo"), Some(1000));
        assert_eq!(decode(&build.code(), "anaconda").unwrap(), build);
    }

    #[test]
    fn test_missing_power_segments_default() {
        let build = decode(&format!("A0{}", "-".repeat(17)), "sidewinder").unwrap();
        assert!(build.power_states().iter().all(|p| *p == PowerState::default()));
        assert_eq!(build, Build::new("sidewinder").unwrap());
    }

    #[test]
    fn test_decode_errors() {
        let empty = "-".repeat(17);
        assert!(matches!(decode("", "sidewinder"), Err(DecodeError::Empty)));
        assert!(matches!(decode("A0", "nope"), Err(DecodeError::UnknownHull(_))));
        assert!(matches!(
            decode(&format!("B0{empty}"), "sidewinder"),
            Err(DecodeError::InvalidVersion('B'))
        ));
        assert!(matches!(
            decode(&format!("A9{empty}"), "sidewinder"),
            Err(DecodeError::InvalidBulkheads('9'))
        ));
        assert!(matches!(
            decode("A0---", "sidewinder"),
            Err(DecodeError::SlotCountMismatch { expected: 17, found: 3 })
        ));
        assert!(matches!(
            decode(&format!("A0zz{}", "-".repeat(16)), "sidewinder"),
            Err(DecodeError::UnknownModule(_))
        ));
        assert!(matches!(
            decode(&format!("A0{empty}...."), "sidewinder"),
            Err(DecodeError::TooManySegments(5))
        ));
        assert!(matches!(
            decode(&format!("A0{empty}.%FF"), "sidewinder"),
            Err(DecodeError::InvalidEncoding)
        ));
        assert!(matches!(
            decode(&format!("A0{empty}...!!!"), "sidewinder"),
            Err(DecodeError::CorruptModifications(_))
        ));
        // anaconda-sized power string on a sidewinder
        assert!(matches!(
            decode(&format!("A0{empty}.CwBhCYzBGW9qCTSqq5xA"), "sidewinder"),
            Err(DecodeError::PowerCountMismatch { expected: 18, found: 36, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_misplaced_modules() {
        // a size 8 power plant does not fit a sidewinder
        let code = format!("A01y{}", "-".repeat(16));
        assert!(matches!(
            decode(&code, "sidewinder"),
            Err(DecodeError::Build(BuildError::IncompatibleModule { .. }))
        ));
    }

    #[test]
    fn test_modifications_on_empty_slot() {
        let block = modifications::encode(&[SlotRecord {
            slot: 3,
            deltas: vec![(6, 100)],
            ..SlotRecord::default()
        }])
        .unwrap();
        let code = format!("A0{}...{}", "-".repeat(17), block);
        assert!(matches!(
            decode(&code, "sidewinder"),
            Err(DecodeError::ModificationsOnEmptySlot(SlotId::Standard(2)))
        ));
    }
}
