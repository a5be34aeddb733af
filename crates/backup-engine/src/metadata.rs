use core::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, types::ValueRef};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::descriptor::{Descriptors, parse_descriptors};

/// The player database inside a save directory.
pub const PLAYERS_DATABASE: &str = "players.db";

/// The preview image inside a save directory.
pub const THUMBNAIL: &str = "thumb.png";

/// The character name reported when the save has no player record.
pub const UNKNOWN_CHARACTER: &str = "Unknown";

const PLAYER_QUERY: &str = "SELECT name, data FROM localPlayers LIMIT 1";
const SURVIVOR_QUERY: &str = "SELECT hours, zombiekills FROM survivors LIMIT 1";

/// Display information about the player of a save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMetadata {
    /// The character's name.
    pub character_name: String,
    /// In game hours survived.
    pub hours_survived: f64,
    /// Zombies killed.
    pub zombies_killed: i64,
    /// The character's traits, in the order they were found.
    pub traits: Vec<String>,
    /// Every interesting descriptor found in the player payload.
    pub extra: Descriptors,
}

impl PlayerMetadata {
    /// Metadata for a save nothing could be read from.
    pub fn unknown() -> Self {
        Self {
            character_name: UNKNOWN_CHARACTER.to_string(),
            hours_survived: 0.0,
            zombies_killed: 0,
            traits: Vec::new(),
            extra: Descriptors::default(),
        }
    }
}

impl fmt::Display for PlayerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Character: {}", self.character_name)?;
        writeln!(f, "Hours Survived: {:.1}", self.hours_survived)?;
        write!(f, "Zombies Killed: {}", self.zombies_killed)?;

        if !self.traits.is_empty() {
            write!(f, "\nTraits: {}", self.traits.join(", "))?;
        }

        Ok(())
    }
}

/// Read the player metadata of the save at `save_path`.
///
/// Returns `None` if the save has no player database, the database cannot be read, or it holds
/// neither a player record nor survivor stats.
pub fn resolve_metadata(save_path: &Path) -> Option<PlayerMetadata> {
    let database = save_path.join(PLAYERS_DATABASE);
    if !database.is_file() {
        debug!("No player database at {database:?}");
        return None;
    }

    match read_metadata(&database) {
        Ok(metadata) => metadata,
        Err(error) => {
            warn!("Could not read player metadata: {error}");
            None
        }
    }
}

/// The save's thumbnail, if it has one.
pub fn thumbnail_path(save_path: &Path) -> Option<PathBuf> {
    let thumbnail = save_path.join(THUMBNAIL);
    thumbnail.is_file().then_some(thumbnail)
}

#[derive(Debug, Default, Clone, Copy)]
struct SurvivorStats {
    hours: f64,
    zombies: i64,
}

fn read_metadata(database: &Path) -> Result<Option<PlayerMetadata>, MetadataError> {
    let connection = Connection::open_with_flags(
        database,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let player = connection
        .query_row(PLAYER_QUERY, [], |row| {
            let name = text_or_none(row.get_ref(0)?);
            let payload = bytes_or_empty(row.get_ref(1)?);
            Ok((name, payload))
        })
        .optional()?;

    let Some((name, payload)) = player else {
        // No player record, the survivor stats are all there is.
        let metadata = survivor_stats(&connection)?.map(|stats| PlayerMetadata {
            hours_survived: stats.hours,
            zombies_killed: stats.zombies,
            ..PlayerMetadata::unknown()
        });
        return Ok(metadata);
    };

    let extra = parse_descriptors(&payload);
    let traits = extra
        .iter()
        .filter(|(key, value)| key.to_lowercase().contains("trait") && value.is_truthy())
        .map(|(_, value)| value.to_string())
        .collect();

    let stats = match survivor_stats(&connection) {
        Ok(stats) => stats.unwrap_or_default(),
        Err(error) => {
            debug!("Could not read survivor stats: {error}");
            SurvivorStats::default()
        }
    };

    Ok(Some(PlayerMetadata {
        character_name: name.unwrap_or_else(|| UNKNOWN_CHARACTER.to_string()),
        hours_survived: stats.hours,
        zombies_killed: stats.zombies,
        traits,
        extra,
    }))
}

fn survivor_stats(connection: &Connection) -> Result<Option<SurvivorStats>, MetadataError> {
    let stats = connection
        .query_row(SURVIVOR_QUERY, [], |row| {
            Ok(SurvivorStats {
                hours: number_or_zero(row.get_ref(0)?),
                zombies: count_or_zero(row.get_ref(1)?),
            })
        })
        .optional()?;

    Ok(stats)
}

fn text_or_none(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(text) | ValueRef::Blob(text) => {
            Some(String::from_utf8_lossy(text).into_owned())
        }
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
        ValueRef::Null => None,
    }
}

fn bytes_or_empty(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Blob(bytes) | ValueRef::Text(bytes) => bytes.to_vec(),
        _ => Vec::new(),
    }
}

#[allow(clippy::as_conversions)]
fn number_or_zero(value: ValueRef<'_>) -> f64 {
    match value {
        ValueRef::Real(number) => number,
        ValueRef::Integer(number) => number as f64,
        _ => 0.0,
    }
}

#[allow(clippy::as_conversions)]
fn count_or_zero(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Integer(number) => number,
        ValueRef::Real(number) => number as i64,
        _ => 0,
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read player database: {0}")]
    DataAccess(#[from] rusqlite::Error),
}
