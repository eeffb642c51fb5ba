//! Decode command handler

use anyhow::{Context, Result};
use shipyard::engineering::{blueprint_quality, effective_deltas};
use shipyard::{decode, Build, ModuleInstance, PowerState};
use std::fmt::Write as _;

/// Handle the decode command
pub fn handle(ship: &str, code: &str) -> Result<()> {
    let build = decode(code, ship).with_context(|| format!("Failed to decode build for {}", ship))?;
    print!("{}", render(&build));
    Ok(())
}

fn power(state: PowerState) -> String {
    let flag = if state.enabled { "on " } else { "off" };
    format!("{} P{}", flag, state.priority + 1)
}

fn engineered_marker(module: &ModuleInstance) -> &'static str {
    if module.is_engineered() {
        " *"
    } else {
        ""
    }
}

/// Slot table followed by the engineering of each engineered module
pub fn render(build: &Build) -> String {
    let mut out = String::new();
    let ship = build.ship();
    let _ = writeln!(out, "{} ({})", ship.name, ship.id);
    let _ = writeln!(out);

    let bulkheads = build.bulkheads();
    let _ = writeln!(
        out,
        "{:<18} {:<36}{}",
        "bulkheads",
        bulkheads.template.symbol,
        engineered_marker(bulkheads)
    );
    let _ = writeln!(
        out,
        "{:<18} {:<36} {}",
        "cargo hatch",
        "",
        power(build.cargo_hatch())
    );

    for (id, slot) in build.component_slots() {
        let label = slot
            .module
            .as_ref()
            .map(|m| m.template.label())
            .unwrap_or_else(|| "-".to_string());
        let marker = slot.module.as_ref().map(engineered_marker).unwrap_or("");
        let _ = writeln!(
            out,
            "{:<18} {:<36} {}{}",
            format!("{} [{}]", id, slot.max_class),
            label,
            power(slot.power),
            marker
        );
    }

    for (id, module) in build.engineered_modules() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}: {}", id, module.template.label());
        if let Some(applied) = &module.blueprint {
            let _ = write!(out, "  {} G{}", applied.blueprint.name, applied.grade);
            if let Some(special) = applied.special {
                let _ = write!(out, " + {}", special.name);
            }
            if let Some(quality) = blueprint_quality(module) {
                let _ = write!(out, " ({:.0}% roll)", quality * 100.0);
            }
            let _ = writeln!(out);
        }
        for delta in effective_deltas(module) {
            let _ = writeln!(out, "  {:<20} {:+.2}%", delta.key(), delta.as_fraction() * 100.0);
        }
    }

    out
}
