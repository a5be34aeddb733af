//! # backup-engine
//! Timestamped backups of game saves, with size and count based retention, and best effort
//! player metadata read from the save's player database.
//!

pub mod archive;
pub mod catalog;
mod config;
mod context;
pub mod descriptor;
mod manager;
pub mod metadata;
pub mod retention;
pub mod size;

pub use config::{Config, LoadConfigError, QuotaPolicy};
pub use context::Context;
pub use manager::{ManagerError, SaveManager};
