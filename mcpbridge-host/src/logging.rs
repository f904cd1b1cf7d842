//! Logging backend installation (§4.1, §10.1).
//!
//! `Host Boundary::log` is specified as "cheap and safe from any
//! thread" — a plain `log` facade call satisfies that as soon as some
//! backend is installed once at startup. Grounded on the reference
//! workspace's own `init_logging` (`imbolc-ui/src/main.rs`): a
//! `simplelog::WriteLogger` writing to a file under the user's config
//! directory, falling back to `/tmp` if that directory can't be
//! created.

use std::fs::File;
use std::path::PathBuf;

use simplelog::{Config as SimpleLogConfig, LevelFilter, WriteLogger};

const LOG_DIR_NAME: &str = "mcpbridge";
const LOG_FILE_NAME: &str = "mcpbridge.log";

/// Where the log file would land; exposed so the Host Boundary can
/// mention it in a status message.
pub fn log_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LOG_DIR_NAME)
        .join(LOG_FILE_NAME)
}

/// Installs the global logger at the given level. Safe to call once
/// per process; a second call is a no-op logged at `warn` rather than
/// a panic, since a host reloading the control surface without a
/// fresh process must not bring the whole plugin down over a logger
/// that's already installed.
pub fn init(level: LevelFilter) {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&path)
        .unwrap_or_else(|_| File::create("/tmp/mcpbridge.log").expect("cannot create log file"));

    if WriteLogger::init(level, SimpleLogConfig::default(), log_file).is_err() {
        log::warn!("logger already installed; ignoring repeat init() call");
        return;
    }

    log::info!("mcpbridge-host logging initialized at {:?} (level: {:?})", path, level);
}
