//! Roll command handler

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shipyard::engineering::{roll, roll_random};
use shipyard::{decode, Roll};

use crate::cli::RollArgs;

/// Where to land the roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Fixed(Roll),
    Random(Option<u64>),
}

impl Position {
    pub fn from_args(args: &RollArgs) -> Self {
        if args.worst {
            Self::Fixed(Roll::Worst)
        } else if args.fifty {
            Self::Fixed(Roll::Fifty)
        } else if args.random {
            Self::Random(args.seed)
        } else {
            Self::Fixed(Roll::Best)
        }
    }
}

/// Handle the roll command
pub fn handle(args: &RollArgs) -> Result<()> {
    let (code, quality) = reroll(&args.ship, &args.code, args.slot, Position::from_args(args))?;
    if let Some(quality) = quality {
        println!("Rolled at {:.1}% quality", quality * 100.0);
    }
    println!("{}", code);
    Ok(())
}

/// Re-roll one module and return the new code.
///
/// Random rolls also return the realized overall quality.
pub fn reroll(
    ship: &str,
    code: &str,
    slot: shipyard::SlotId,
    position: Position,
) -> Result<(String, Option<f64>)> {
    let mut build = decode(code, ship).with_context(|| format!("Failed to decode build for {}", ship))?;

    let quality = match position {
        Position::Fixed(position) => {
            build
                .modify(slot, |module| roll(module, position))
                .with_context(|| format!("Cannot roll {}", slot))?;
            None
        }
        Position::Random(seed) => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let quality = build
                .modify(slot, |module| roll_random(module, &mut rng))
                .with_context(|| format!("Cannot roll {}", slot))?;
            Some(quality)
        }
    };

    Ok((build.code(), quality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipyard::engineering::blueprint_quality;
    use shipyard::{build_from, Engineering, SlotAssignment, SlotId};

    fn engineered_code() -> String {
        let assignments = [SlotAssignment::new(SlotId::Standard(2), "Int_Hyperdrive_Size5_Class5")
            .with_engineering(Engineering {
                blueprint: "FSD_LongRange".to_string(),
                grade: 5,
                quality: 0.5,
                special: None,
            })];
        build_from("asp", &assignments).unwrap().code()
    }

    #[test]
    fn test_fixed_rolls() {
        let code = engineered_code();
        let (best, quality) = reroll("asp", &code, SlotId::Standard(2), Position::Fixed(Roll::Best)).unwrap();
        assert!(quality.is_none());
        assert_ne!(best, code);

        let fsd = decode(&best, "asp").unwrap();
        let module = fsd.module(SlotId::Standard(2)).unwrap();
        assert!((blueprint_quality(module).unwrap() - 1.0).abs() < 0.01);

        let (fifty, _) = reroll("asp", &best, SlotId::Standard(2), Position::Fixed(Roll::Fifty)).unwrap();
        assert_eq!(fifty, code);
    }

    #[test]
    fn test_seeded_random_roll_is_repeatable() {
        let code = engineered_code();
        let first = reroll("asp", &code, SlotId::Standard(2), Position::Random(Some(7))).unwrap();
        let second = reroll("asp", &code, SlotId::Standard(2), Position::Random(Some(7))).unwrap();
        assert_eq!(first, second);
        let quality = first.1.unwrap();
        assert!((0.0..=1.0).contains(&quality));
    }

    #[test]
    fn test_roll_needs_a_blueprint() {
        let code = engineered_code();
        assert!(reroll("asp", &code, SlotId::Standard(0), Position::Fixed(Roll::Best)).is_err());
        assert!(reroll("asp", &code, SlotId::Hardpoint(0), Position::Fixed(Roll::Best)).is_err());
    }
}
