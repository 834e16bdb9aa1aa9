use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clips::align::AlignMode;
use crate::clips::parser::UnknownPolicy;
use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::documented_config;
use crate::marks::capture::RetryTiming;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkcutConfig {
    /// Directory holding one `.marks` ledger per recording
    pub marks_dir: PathBuf,
    /// Substring of the foreground window class that identifies the player
    pub target_window_class: String,
    /// Input gesture that records a mark
    pub trigger_button: String,
    pub clipboard_initial_delay_ms: u64,
    pub clipboard_retry_interval_ms: u64,
    pub clipboard_max_wait_ms: u64,
    /// Extension for clips cut from a source without one
    pub default_extension: String,
    pub align_mode: AlignMode,
    pub unknown_policy: UnknownPolicy,
}

impl Default for MarkcutConfig {
    fn default() -> Self {
        Self {
            marks_dir: paths::default_marks_dir(),
            target_window_class: "mpv".to_string(),
            trigger_button: "middle".to_string(),
            clipboard_initial_delay_ms: Self::DEFAULT_INITIAL_DELAY_MS,
            clipboard_retry_interval_ms: Self::DEFAULT_RETRY_INTERVAL_MS,
            clipboard_max_wait_ms: Self::DEFAULT_MAX_WAIT_MS,
            default_extension: "mp4".to_string(),
            align_mode: AlignMode::Keyframe,
            unknown_policy: UnknownPolicy::Reject,
        }
    }
}

documented_config!(MarkcutConfig {
    fields: [
        marks_dir, "Directory holding one .marks file per recording",
        target_window_class, "Substring of the player's window class; marks are only taken while it is focused",
        trigger_button, "Input gesture that records a mark (e.g. middle)",
        clipboard_initial_delay_ms, "Wait before the first clipboard read (ms)",
        clipboard_retry_interval_ms, "Wait between clipboard re-reads while the value looks stale (ms)",
        clipboard_max_wait_ms, "Total clipboard wait budget per mark (ms)",
        default_extension, "Clip extension used when the source video has none",
        align_mode, "Boundary alignment: none or keyframe",
        unknown_policy, "Pairs with UNKNOWN timestamps: reject or skip",
    ],
    config_path: paths::config_file_path(),
});

impl MarkcutConfig {
    pub const DEFAULT_INITIAL_DELAY_MS: u64 = 800;
    pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 200;
    pub const DEFAULT_MAX_WAIT_MS: u64 = 2000;

    /// Load the config from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => paths::expand_path(path),
            None => <Self as DocumentedConfig>::default_config_path()?,
        };
        let config = <Self as DocumentedConfig>::load_from_path_documented(&path)
            .with_context(|| format!("loading markcut config from {}", path.display()))?;
        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.marks_dir = paths::expand_path(&self.marks_dir);
        if self.clipboard_retry_interval_ms == 0 {
            self.clipboard_retry_interval_ms = Self::DEFAULT_RETRY_INTERVAL_MS;
        }
        if self.clipboard_max_wait_ms < self.clipboard_initial_delay_ms {
            self.clipboard_max_wait_ms = self.clipboard_initial_delay_ms;
        }
        let ext = self.default_extension.trim().trim_start_matches('.');
        self.default_extension = if ext.is_empty() {
            "mp4".to_string()
        } else {
            ext.to_string()
        };
        if self.target_window_class.trim().is_empty() {
            self.target_window_class = "mpv".to_string();
        }
        self
    }

    pub fn retry_timing(&self) -> RetryTiming {
        RetryTiming {
            initial_delay: Duration::from_millis(self.clipboard_initial_delay_ms),
            retry_interval: Duration::from_millis(self.clipboard_retry_interval_ms),
            max_wait: Duration::from_millis(self.clipboard_max_wait_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_documented_file_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = MarkcutConfig::load(Some(&path)).unwrap();
        assert_eq!(config.target_window_class, "mpv");

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("clipboard_max_wait_ms = 2000  # "));
        assert!(written.contains("align_mode = \"keyframe\""));
        assert!(written.contains("unknown_policy = \"reject\""));

        // The generated file must parse back to the same values
        let reloaded = MarkcutConfig::load(Some(&path)).unwrap();
        assert_eq!(reloaded.clipboard_initial_delay_ms, 800);
    }

    #[test]
    fn clamps_inconsistent_timing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "clipboard_initial_delay_ms = 1500\nclipboard_max_wait_ms = 500\nclipboard_retry_interval_ms = 0\ndefault_extension = \".mkv\"\n",
        )
        .unwrap();

        let config = MarkcutConfig::load(Some(&path)).unwrap();
        assert_eq!(config.clipboard_max_wait_ms, 1500);
        assert_eq!(config.clipboard_retry_interval_ms, 200);
        assert_eq!(config.default_extension, "mkv");

        let timing = config.retry_timing();
        assert_eq!(timing.initial_delay, Duration::from_millis(1500));
    }

    #[test]
    fn rejects_unknown_align_mode_in_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "align_mode = \"scene\"\n").unwrap();
        assert!(MarkcutConfig::load(Some(&path)).is_err());
    }
}
