//! # backup-keeper
//! Command line front end for the backup engine.
//!

mod command;

pub use command::{Command, CommandError, DEFAULT_CONFIG_PATH, Invocation, USAGE, parse_args};
