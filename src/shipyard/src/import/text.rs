//! Legacy plain-text builds
//!
//! ```text
//! [Asp Explorer]
//! L: 3E/G Multi-cannon
//! U: 0A Shield Booster
//!
//! BH: 1I Military Grade Composite
//! RB: 5A Power Plant
//! FH: 5A Frame Shift Drive
//!
//! 6: 6A Shield Generator
//! 5: 5C Cargo Rack
//! ---
//! Shield: 236.27 MJ
//! ```
//!
//! Hardpoint and internal lines name the size of the slot they came from;
//! each fills the next free slot of exactly that size. Everything after
//! `---` is summary output and is ignored.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use super::{ImportError, SingleBuild};
use crate::build::{build_from, SlotAssignment, SlotId};
use crate::catalog::{catalog, ModuleQuery, ModuleTemplate, Mount, Ship, BULKHEAD_NAMES};

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([\w \-]+)\]\r?\n").unwrap_or_else(|e| panic!("invalid header pattern: {e}"))
});

static LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\dA-Z]{1,2}): (\d)([A-I])/?([FGT])?([SD])? ([\w\- ]+)")
        .unwrap_or_else(|e| panic!("invalid line pattern: {e}"))
});

const END_OF_LIST: &str = "---";

/// Hardpoint line types and the slot class they fill
const HARDPOINT_TYPES: [(&str, u8); 5] = [("H", 4), ("L", 3), ("M", 2), ("S", 1), ("U", 0)];

/// Standard line types, in slot order
const STANDARD_TYPES: [&str; 7] = ["RB", "TM", "FH", "EC", "PC", "SS", "FS"];

const BULKHEADS_TYPE: &str = "BH";

/// True when `text` starts with a `[Ship name]` header line, ignoring
/// leading blank lines
pub(super) fn is_candidate(text: &str) -> bool {
    HEADER.is_match(text.trim_start())
}

/// One parsed component line
struct Line<'a> {
    raw: &'a str,
    kind: &'a str,
    class: u8,
    rating: char,
    mount: Option<Mount>,
    missile: Option<char>,
    name: &'a str,
}

impl<'a> Line<'a> {
    fn parse(raw: &'a str) -> Result<Self, ImportError> {
        let caps = LINE.captures(raw).ok_or_else(|| ImportError::Parse(format!("Error parsing: \"{raw}\"")))?;
        let text = |i: usize| caps.get(i).map(|m| m.as_str());
        let first_char = |i: usize| text(i).and_then(|s| s.chars().next());
        Ok(Self {
            raw,
            kind: group_str(&caps, 1),
            class: first_char(2).and_then(|c| c.to_digit(10)).map_or(0, |d| d as u8),
            rating: first_char(3).unwrap_or('E'),
            mount: first_char(4).and_then(Mount::from_code),
            missile: first_char(5),
            name: group_str(&caps, 6).trim(),
        })
    }

    fn label(&self) -> String {
        format!("{}{} {}", self.class, self.rating, self.name)
    }

    fn unknown(&self) -> ImportError {
        ImportError::Domain(format!("Unknown component: \"{}\"", self.raw))
    }
}

fn group_str<'a>(caps: &Captures<'a>, i: usize) -> &'a str {
    caps.get(i).map_or("", |m| m.as_str())
}

/// Resolve by group display name, then by module name ("Bi-Weave")
fn resolve(line: &Line<'_>) -> Option<&'static ModuleTemplate> {
    let c = catalog();
    if c.group_by_name(line.name).is_some() {
        return c.find_module(&ModuleQuery {
            group: line.name,
            class: line.class,
            rating: line.rating,
            mount: line.mount,
            missile: line.missile,
            name: None,
        });
    }
    c.modules().iter().find(|m| {
        m.class == line.class
            && m.rating == line.rating
            && m.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(line.name))
    })
}

/// Tracks which slots earlier lines have already filled
struct Fitting<'s> {
    ship: &'s Ship,
    hardpoints: Vec<bool>,
    internal: Vec<bool>,
    assignments: Vec<SlotAssignment>,
}

impl<'s> Fitting<'s> {
    fn new(ship: &'s Ship) -> Self {
        Self {
            ship,
            hardpoints: vec![false; ship.hardpoints.len()],
            internal: vec![false; ship.internal.len()],
            assignments: Vec::new(),
        }
    }

    fn add(&mut self, line: &Line<'_>) -> Result<(), ImportError> {
        if line.kind == BULKHEADS_TYPE {
            return self.add_bulkheads(line);
        }
        if let Some(slot) = STANDARD_TYPES.iter().position(|&t| t == line.kind) {
            return self.add_standard(line, slot);
        }
        if let Some(&(_, class)) = HARDPOINT_TYPES.iter().find(|(t, _)| *t == line.kind) {
            return self.add_hardpoint(line, class);
        }
        match line.kind.parse::<u8>() {
            Ok(size) => self.add_internal(line, size),
            Err(_) => Err(ImportError::Parse(format!("Error parsing: \"{}\"", line.raw))),
        }
    }

    fn add_bulkheads(&mut self, line: &Line<'_>) -> Result<(), ImportError> {
        let symbol = BULKHEAD_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(line.name))
            .and_then(|i| self.ship.bulkheads.get(i))
            .ok_or_else(|| ImportError::Domain(format!("Unknown bulkheads: \"{}\"", line.raw)))?;
        self.assignments.push(SlotAssignment::new(SlotId::Bulkheads, symbol.clone()));
        Ok(())
    }

    fn add_standard(&mut self, line: &Line<'_>, slot: usize) -> Result<(), ImportError> {
        let template = catalog()
            .standard_module(slot, line.class, line.rating)
            .ok_or_else(|| line.unknown())?;
        if template.class > self.ship.standard[slot] {
            return Err(ImportError::Compatibility(format!(
                "{} exceeds max class for the {}",
                line.label(),
                self.ship.name
            )));
        }
        self.assignments
            .push(SlotAssignment::new(SlotId::Standard(slot), template.symbol.clone()));
        Ok(())
    }

    fn add_hardpoint(&mut self, line: &Line<'_>, class: u8) -> Result<(), ImportError> {
        let template = resolve(line).ok_or_else(|| line.unknown())?;
        let index = (0..self.hardpoints.len())
            .find(|&i| !self.hardpoints[i] && self.ship.hardpoints[i] == class)
            .ok_or_else(|| {
                ImportError::Compatibility(format!("No hardpoint slot available for: \"{}\"", line.raw))
            })?;
        self.hardpoints[index] = true;
        self.assignments
            .push(SlotAssignment::new(SlotId::Hardpoint(index), template.symbol.clone()));
        Ok(())
    }

    fn add_internal(&mut self, line: &Line<'_>, size: u8) -> Result<(), ImportError> {
        let template = resolve(line).ok_or_else(|| line.unknown())?;
        if template.class > size {
            return Err(ImportError::Compatibility(format!(
                "{} exceeds slot size: \"{}\"",
                line.label(),
                line.raw
            )));
        }
        let index = (0..self.internal.len())
            .find(|&i| {
                let slot = &self.ship.internal[i];
                !self.internal[i] && slot.class == size && slot.accepts(&template.grp)
            })
            .ok_or_else(|| {
                ImportError::Compatibility(format!("No internal slot available for: \"{}\"", line.raw))
            })?;
        self.internal[index] = true;
        self.assignments
            .push(SlotAssignment::new(SlotId::Internal(index), template.symbol.clone()));
        Ok(())
    }
}

/// Import a legacy text build
pub(super) fn import(text: &str) -> Result<SingleBuild, ImportError> {
    let text = text.trim_start();
    let header = HEADER
        .captures(text)
        .ok_or_else(|| ImportError::Parse("Must be an object or array!".to_string()))?;
    let header_len = header.get(0).map_or(0, |m| m.end());
    let ship_name = group_str(&header, 1).trim();
    let ship = catalog()
        .ship_by_name(ship_name)
        .ok_or_else(|| ImportError::Domain(format!("No such ship found: \"{ship_name}\"")))?;

    let mut fitting = Fitting::new(ship);
    for raw in text[header_len..].lines().map(str::trim) {
        if raw == END_OF_LIST {
            break;
        }
        if raw.is_empty() {
            continue;
        }
        fitting.add(&Line::parse(raw)?)?;
    }
    debug!(ship = %ship.id, modules = fitting.assignments.len(), "legacy text parsed");

    let build = build_from(&ship.id, &fitting.assignments)?;
    Ok(SingleBuild {
        name: format!("Imported {ship_name}"),
        ship_id: ship.id.clone(),
        code: build.code(),
    })
}
