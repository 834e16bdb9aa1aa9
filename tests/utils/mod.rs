use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the markcut binary against the environment's config file
pub fn run_markcut_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_markcut"))
        .arg("--config")
        .arg(env.config_path())
        .args(args)
        .current_dir(env.path())
        .env("NO_COLOR", "1")
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub fn path_arg(path: &std::path::Path) -> String {
    path.display().to_string()
}
