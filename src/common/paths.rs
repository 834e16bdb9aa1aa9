//! Centralized path management for markcut

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Get the main markcut config directory
pub fn markcut_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("markcut");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Get the main markcut data directory
pub fn markcut_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
            home.join(".local/share")
        })
        .join("markcut")
}

/// Default directory holding one `.marks` ledger per recording
pub fn default_marks_dir() -> PathBuf {
    markcut_data_dir().join("marks")
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(markcut_config_dir()?.join("config.toml"))
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    PathBuf::from(expanded)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("creating directory {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marks_dir_is_under_data_dir() {
        let dir = default_marks_dir();
        assert!(dir.ends_with("markcut/marks"));
    }

    #[test]
    fn expand_path_leaves_plain_paths_alone() {
        let path = Path::new("/tmp/marks");
        assert_eq!(expand_path(path), PathBuf::from("/tmp/marks"));
    }
}
