//! Slot argument parsing

use shipyard::SlotId;

/// Parse `bulkheads`, `standard:N`, `hardpoint:N` or `internal:N`.
///
/// Slot numbers are 1-based, as printed by `decode`.
pub fn parse_slot(s: &str) -> Result<SlotId, String> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "bulkheads" {
        return Ok(SlotId::Bulkheads);
    }

    let (kind, number) = lower
        .split_once(':')
        .ok_or_else(|| format!("invalid slot '{}': expected <kind>:<number>", s))?;
    let number: usize = number
        .parse()
        .map_err(|_| format!("invalid slot number '{}'", number))?;
    let index = number
        .checked_sub(1)
        .ok_or_else(|| "slot numbers start at 1".to_string())?;

    match kind {
        "standard" | "s" => Ok(SlotId::Standard(index)),
        "hardpoint" | "h" => Ok(SlotId::Hardpoint(index)),
        "internal" | "i" => Ok(SlotId::Internal(index)),
        _ => Err(format!("unknown slot kind '{}'", kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot() {
        assert_eq!(parse_slot("bulkheads"), Ok(SlotId::Bulkheads));
        assert_eq!(parse_slot("Standard:1"), Ok(SlotId::Standard(0)));
        assert_eq!(parse_slot("h:3"), Ok(SlotId::Hardpoint(2)));
        assert_eq!(parse_slot("internal:10"), Ok(SlotId::Internal(9)));
    }

    #[test]
    fn test_parse_slot_errors() {
        assert!(parse_slot("standard").is_err());
        assert!(parse_slot("standard:0").is_err());
        assert!(parse_slot("standard:x").is_err());
        assert!(parse_slot("engine:1").is_err());
    }
}
