//! # common
//!

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use backup_engine::{Config, QuotaPolicy};
use rusqlite::{Connection, params};

pub const GAME_MODE: &str = "Sandbox";

/// A config rooted in a temporary directory, with retention disabled.
pub fn test_config(root: &Path) -> Config {
    Config {
        save_root: root.join("saves"),
        backup_root: root.join("backups"),
        game_mode: GAME_MODE.to_string(),
        compress: false,
        keep_last: 0,
        quota: QuotaPolicy {
            default_mb: 0,
            ..QuotaPolicy::default()
        },
    }
}

/// The backup directory of the test game mode.
pub fn backup_directory(config: &Config) -> PathBuf {
    config.backup_root.join(GAME_MODE)
}

/// A player payload holding traits, names, survival stats and a flag.
pub fn player_blob() -> Vec<u8> {
    let mut payload = Vec::new();

    add_string(&mut payload, "trait1", "Brave");
    add_string(&mut payload, "name", "Alice");
    add_string(&mut payload, "surname", "Survivor");

    add_key(&mut payload, "hour");
    payload.push(0x01);
    payload.extend_from_slice(&42.0f64.to_be_bytes());

    add_key(&mut payload, "zombieKills");
    payload.push(0x04);

    payload
}

pub fn add_key(payload: &mut Vec<u8>, key: &str) {
    payload.push(0x02);
    payload.extend_from_slice(&u16::try_from(key.len()).unwrap().to_be_bytes());
    payload.extend_from_slice(key.as_bytes());
}

pub fn add_string(payload: &mut Vec<u8>, key: &str, value: &str) {
    add_key(payload, key);
    payload.push(0x02);
    payload.extend_from_slice(&u16::try_from(value.len()).unwrap().to_be_bytes());
    payload.extend_from_slice(value.as_bytes());
}

/// Create a `players.db` in `save_path` with the given rows.
pub fn create_players_db(save_path: &Path, player: Option<(&str, &[u8])>, survivor: Option<(f64, i64)>) {
    std::fs::create_dir_all(save_path).unwrap();
    let connection = Connection::open(save_path.join("players.db")).unwrap();
    connection
        .execute_batch(
            "CREATE TABLE localPlayers (name TEXT, data BLOB);
             CREATE TABLE survivors (hours REAL, zombiekills INTEGER);",
        )
        .unwrap();

    if let Some((name, data)) = player {
        connection
            .execute(
                "INSERT INTO localPlayers (name, data) VALUES (?1, ?2)",
                params![name, data],
            )
            .unwrap();
    }

    if let Some((hours, zombies)) = survivor {
        connection
            .execute(
                "INSERT INTO survivors (hours, zombiekills) VALUES (?1, ?2)",
                params![hours, zombies],
            )
            .unwrap();
    }
}
