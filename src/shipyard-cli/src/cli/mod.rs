//! CLI argument definitions for shipyard
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod slot;

pub use core::{Cli, Commands, RollArgs};
