use std::fmt;

use anyhow::{Context, Result};
use clap::ValueEnum;
use clap_complete::Shell;

pub const BINARY_NAME: &str = "markcut";

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SupportedShell {
    Bash,
    Zsh,
}

impl SupportedShell {
    fn as_complete_shell(self) -> Shell {
        match self {
            SupportedShell::Bash => Shell::Bash,
            SupportedShell::Zsh => Shell::Zsh,
        }
    }
}

impl fmt::Display for SupportedShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportedShell::Bash => write!(f, "bash"),
            SupportedShell::Zsh => write!(f, "zsh"),
        }
    }
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum CompletionCommands {
    /// Print the completion script for a shell to stdout
    Generate {
        #[arg(value_enum)]
        shell: SupportedShell,
    },
}

pub fn generate(shell: SupportedShell) -> Result<String> {
    let mut command = crate::cli_command();
    let mut buffer = Vec::new();
    clap_complete::generate(
        shell.as_complete_shell(),
        &mut command,
        BINARY_NAME,
        &mut buffer,
    );
    String::from_utf8(buffer).with_context(|| format!("rendering {shell} completions"))
}

pub fn handle_completions_command(command: CompletionCommands) -> Result<()> {
    match command {
        CompletionCommands::Generate { shell } => {
            let script = generate(shell)?;
            print!("{script}");
            Ok(())
        }
    }
}
