//! # backup-keeper
//! Backs up, prunes and restores game saves.
//!

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{fs, path::Path};

use backup_engine::{Config, SaveManager};
use backup_keeper::{Command, USAGE, parse_args};
use mimalloc::MiMalloc;
use shared::{Failure, init_logger};
use tracing::error;

fn main() {
    let _logger = init_logger(Path::new("./logs")).or_log_and_panic("Could not create logger");

    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(error) => {
            error!("{error}");
            println!("{USAGE}");
            return;
        }
    };

    // Initialize config if the command is 'init'.
    if invocation.command == Command::Init {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).or_log_and_panic("Could not serialize config file");
        fs::write(&invocation.config_path, contents)
            .or_log_and_panic("Could not create config file");
        return;
    }

    // Load config
    let config =
        Config::load_toml(&invocation.config_path).or_log_and_panic("Could not load config");

    let manager = SaveManager::new(config);
    if let Err(error) = manager.prepare_directories() {
        error!("Could not prepare backup directories: {error}");
        return;
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(error) = invocation.command.run(&manager, &mut stdout) {
        error!("{error}");
    }
}
