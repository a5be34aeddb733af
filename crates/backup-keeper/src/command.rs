use std::{
    io::{self, Write},
    path::PathBuf,
};

use backup_engine::{ManagerError, SaveManager};
use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

/// The config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

/// The command line help.
pub const USAGE: &str = "usage: backup-keeper [--config <path>] <command>

commands:
    init                        write a default config
    saves                       list the saves of the game mode
    list [save]                 list backups, newest first
    backup <save>               back up a save then apply retention
    prune <save>                apply retention to a save's backups
    restore <artifact> <save>   restore a backup over a save
    stats <save>                print a save's player metadata as json
    usage <save>                print the bytes used by a save and its backups
    thumbnail <save>            print the path of a save's thumbnail";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The config file to read, or to write for `init`.
    pub config_path: PathBuf,
    /// The command to run.
    pub command: Command,
}

/// A keeper command.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init,
    Saves,
    List(Option<String>),
    Backup(String),
    Prune(String),
    Restore { artifact: PathBuf, target: String },
    Stats(String),
    Usage(String),
    Thumbnail(String),
}

/// Parse the arguments after the program name.
pub fn parse_args<I>(args: I) -> Result<Invocation, CommandError>
where
    I: IntoIterator<Item = String>,
{
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().ok_or(CommandError::MissingConfigPath)?;
            config_path = PathBuf::from(path);
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or(CommandError::MissingCommand)?;

    let command = match name.as_str() {
        "init" => Command::Init,
        "saves" => Command::Saves,
        "list" => Command::List(positional.next()),
        "backup" => Command::Backup(required(&mut positional, "backup", "save")?),
        "prune" => Command::Prune(required(&mut positional, "prune", "save")?),
        "restore" => Command::Restore {
            artifact: PathBuf::from(required(&mut positional, "restore", "artifact")?),
            target: required(&mut positional, "restore", "save")?,
        },
        "stats" => Command::Stats(required(&mut positional, "stats", "save")?),
        "usage" => Command::Usage(required(&mut positional, "usage", "save")?),
        "thumbnail" => Command::Thumbnail(required(&mut positional, "thumbnail", "save")?),
        _ => return Err(CommandError::UnknownCommand(name)),
    };

    if let Some(extra) = positional.next() {
        return Err(CommandError::UnexpectedArgument(extra));
    }

    Ok(Invocation {
        config_path,
        command,
    })
}

fn required(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
    argument: &'static str,
) -> Result<String, CommandError> {
    args.next()
        .ok_or(CommandError::MissingArgument { command, argument })
}

impl Command {
    /// Run the command against a manager, writing its output to `out`.
    ///
    /// `init` is handled before a config exists and does nothing here.
    pub fn run<W: Write>(&self, manager: &SaveManager, out: &mut W) -> Result<(), CommandError> {
        match self {
            Self::Init => {}

            Self::Saves => {
                for save in manager.available_saves() {
                    writeln!(out, "{save}").map_err(write_error)?;
                }
            }

            Self::List(save_name) => {
                for backup in manager.list_backups(save_name.as_deref())? {
                    let name = backup
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let modified: DateTime<Local> = backup.modified.into();

                    writeln!(
                        out,
                        "{name}\t{}\t{}",
                        backup.size_bytes(),
                        modified.format("%Y-%m-%d %H:%M:%S")
                    )
                    .map_err(write_error)?;
                }
            }

            Self::Backup(save_name) => {
                let artifact = manager.backup_save(save_name)?;
                writeln!(out, "Created {}", artifact.display()).map_err(write_error)?;

                for removed in manager.prune(save_name) {
                    writeln!(out, "Removed {}", removed.display()).map_err(write_error)?;
                }
            }

            Self::Prune(save_name) => {
                let removed = manager.prune(save_name);
                info!("Pruned {} backups of '{save_name}'", removed.len());

                for path in removed {
                    writeln!(out, "Removed {}", path.display()).map_err(write_error)?;
                }
            }

            Self::Restore { artifact, target } => {
                let restored = manager.restore_backup(artifact, target)?;
                writeln!(out, "Restored {}", restored.display()).map_err(write_error)?;
            }

            Self::Stats(save_name) => {
                let stats = manager.save_stats(save_name);
                serde_json::to_writer_pretty(&mut *out, &stats)?;
                writeln!(out).map_err(write_error)?;
            }

            Self::Usage(save_name) => {
                let (save_bytes, backup_bytes) = manager.disk_usage(save_name);
                writeln!(out, "Save: {save_bytes} bytes").map_err(write_error)?;
                writeln!(out, "Backups: {backup_bytes} bytes").map_err(write_error)?;
            }

            Self::Thumbnail(save_name) => match manager.thumbnail_path(save_name) {
                Some(path) => writeln!(out, "{}", path.display()).map_err(write_error)?,
                None => writeln!(out, "No thumbnail for '{save_name}'").map_err(write_error)?,
            },
        }

        Ok(())
    }
}

fn write_error(error: io::Error) -> CommandError {
    CommandError::Io(error, "write output")
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No command given")]
    MissingCommand,

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("'--config' needs a path")]
    MissingConfigPath,

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("Failed to serialize stats: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),
}
