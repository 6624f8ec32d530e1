use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base deckhand config directory.
///
/// `DECKHAND_CONFIG_DIR` overrides the default (`~/.config/deckhand/` on
/// Unix-like systems, `%APPDATA%\deckhand` on Windows).
pub fn base() -> Result<PathBuf> {
    if let Ok(dir) = env::var("DECKHAND_CONFIG_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("deckhand"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("deckhand"))
    }
}

/// Projects directory
pub fn projects() -> Result<PathBuf> {
    Ok(base()?.join("projects"))
}

/// Project config file path
pub fn project(id: &str) -> Result<PathBuf> {
    Ok(projects()?.join(format!("{}.json", id)))
}
