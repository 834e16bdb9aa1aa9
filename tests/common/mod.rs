use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated config file, marks directory and scratch space for one test
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let env = Self { temp_dir };

        std::fs::create_dir_all(env.marks_dir())?;
        let config = format!(
            "marks_dir = {:?}\nclipboard_initial_delay_ms = 10\nclipboard_retry_interval_ms = 10\nclipboard_max_wait_ms = 50\n",
            env.marks_dir().display().to_string()
        );
        std::fs::write(env.config_path(), config)?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn marks_dir(&self) -> PathBuf {
        self.path().join("marks")
    }

    /// Write `contents` to `name` inside the scratch directory
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
