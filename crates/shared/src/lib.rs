//! # Shared
//! The shared components between the backup engine and the backup keeper.
//!

#![warn(missing_docs)]

mod failure;
mod logger;

pub use failure::Failure;
pub use logger::{LoggerError, init_logger};
