mod clips;
mod common;
mod completions;
mod config;
mod marks;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use crate::clips::{ClipsCommands, handle_clips_command};
use crate::completions::{CompletionCommands, handle_completions_command};
use crate::config::MarkcutConfig;
use crate::marks::{MarksCommands, handle_marks_command};
use crate::ui::prelude::*;

/// Capture playback marks and cut them into lossless clips
#[derive(Parser, Debug)]
#[command(name = "markcut", author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for events
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Use this config file instead of ~/.config/markcut/config.toml
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record playback marks
    Marks {
        #[command(subcommand)]
        command: MarksCommands,
    },
    /// Turn marks files into clips
    Clips {
        #[command(subcommand)]
        command: ClipsCommands,
    },
    /// Shell completion scripts
    Completions {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Completions { command } => handle_completions_command(command),
        Commands::Marks { command } => {
            let config = MarkcutConfig::load(cli.config.as_deref())?;
            handle_marks_command(command, &config).await
        }
        Commands::Clips { command } => {
            let config = MarkcutConfig::load(cli.config.as_deref())?;
            handle_clips_command(command, &config)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    ui::init(cli.output, color);

    if cli.debug {
        emit(Level::Debug, "markcut.debug", "Debug mode is on", None);
    }

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            emit(Level::Error, "markcut.error", &format!("Error: {err:#}"), None);
            1
        }
    };

    // A pending stdin read would otherwise hold the runtime open on shutdown
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}
