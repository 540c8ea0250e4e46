mod config;

pub use config::{
    AuthSection, Config, EncounterSection, GeneratorKind, TaskSection, TimerSection,
};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the data directory, creating it if needed.
///
/// `POKODORO_HOME` overrides the location outright. Otherwise this is
/// `~/.config/pokodoro[-dev]/`, with `POKODORO_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("POKODORO_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POKODORO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pokodoro-dev")
            } else {
                base_dir.join("pokodoro")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
