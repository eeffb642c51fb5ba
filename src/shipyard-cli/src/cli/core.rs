//! Core CLI definitions

use clap::{ArgGroup, Args, Parser, Subcommand};
use shipyard::SlotId;
use std::path::PathBuf;

use super::slot::parse_slot;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Ship build importer and build-code tool", long_about = None)]
pub struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import pasted build data (backup, detailed export, loadout, text)
    #[command(visible_alias = "i")]
    Import {
        /// File to read (stdin if omitted)
        input: Option<PathBuf>,

        /// Save the imported builds into the configured store
        #[arg(long)]
        save: bool,
    },

    /// Show the slots, power state and engineering of a build code
    #[command(visible_alias = "d")]
    Decode {
        /// Ship id (e.g. "asp")
        #[arg(short, long)]
        ship: String,

        /// Build code
        code: String,
    },

    /// Re-roll the blueprint of one module and print the new code
    Roll(RollArgs),

    /// List the hulls in the catalog
    Ships,

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Prefix printed before outfit links
        #[arg(long)]
        base_url: Option<String>,

        /// Path of the JSON build store
        #[arg(long)]
        store: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)] // One flag per roll position
#[command(group(
    ArgGroup::new("position")
        .required(true)
        .args(["worst", "fifty", "best", "random"]),
))]
pub struct RollArgs {
    /// Ship id (e.g. "asp")
    #[arg(short, long)]
    pub ship: String,

    /// Slot to roll: bulkheads, standard:N, hardpoint:N or internal:N (1-based)
    #[arg(long, value_parser = parse_slot)]
    pub slot: SlotId,

    /// Every feature at the bottom of its range
    #[arg(long)]
    pub worst: bool,

    /// Every feature at the middle of its range
    #[arg(long)]
    pub fifty: bool,

    /// Every feature at the top of its range
    #[arg(long)]
    pub best: bool,

    /// Each feature drawn independently
    #[arg(long)]
    pub random: bool,

    /// Seed for --random
    #[arg(long, requires = "random")]
    pub seed: Option<u64>,

    /// Build code
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_roll_requires_a_position() {
        let err = Cli::try_parse_from(["shipyard", "roll", "--ship", "asp", "--slot", "standard:3", "A0"]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from([
            "shipyard", "roll", "--ship", "asp", "--slot", "standard:3", "--best", "A0",
        ])
        .unwrap();
        match cli.command {
            Commands::Roll(args) => {
                assert!(args.best);
                assert_eq!(args.slot, SlotId::Standard(2));
            }
            _ => panic!("expected roll"),
        }
    }

    #[test]
    fn test_roll_positions_are_exclusive() {
        let err = Cli::try_parse_from([
            "shipyard", "roll", "--ship", "asp", "--slot", "bulkheads", "--best", "--worst", "A0",
        ]);
        assert!(err.is_err());
    }
}
