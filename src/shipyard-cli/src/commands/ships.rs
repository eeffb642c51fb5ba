//! Ships command handler

use anyhow::Result;
use shipyard::catalog;
use std::fmt::Write as _;

pub fn handle() -> Result<()> {
    print!("{}", render());
    Ok(())
}

/// One line per hull: id, name, hardpoint/utility/internal counts
pub fn render() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<28} {:>4} {:>4} {:>4}",
        "ID", "NAME", "HP", "UT", "INT"
    );
    for ship in catalog().ships() {
        let utility = ship.hardpoints.iter().filter(|&&class| class == 0).count();
        let _ = writeln!(
            out,
            "{:<24} {:<28} {:>4} {:>4} {:>4}",
            ship.id,
            ship.name,
            ship.hardpoints.len() - utility,
            utility,
            ship.internal.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_ship() {
        let text = render();
        assert_eq!(text.lines().count(), catalog().ships().count() + 1);
        assert!(text.lines().any(|line| line.starts_with("asp ")));
    }
}
