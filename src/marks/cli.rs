use clap::{Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum MarksCommands {
    /// Record a mark for every trigger event read from stdin or a FIFO
    Listen {
        /// Read events from this file or FIFO instead of stdin
        #[arg(long, value_hint = ValueHint::FilePath)]
        events: Option<PathBuf>,
    },
    /// Record a single mark for the focused player window
    Mark,
    /// Print the marks recorded for a recording
    Show {
        /// Recording identifier or path to a .marks file
        target: String,
    },
    /// Print the ledger path a player window title maps to
    Path {
        /// Window title, e.g. "gig.mkv - mpv"
        title: String,
    },
}
