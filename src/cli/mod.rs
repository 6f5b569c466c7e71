//! Command-line interface for paperforge.
//!
//! Provides the `analyze` and `report` commands.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
