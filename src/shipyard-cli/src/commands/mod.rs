//! Command handlers for shipyard CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod decode;
pub mod import;
pub mod roll;
pub mod ships;
