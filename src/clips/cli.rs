use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

use super::adjust::Adjustment;
use super::parser::UnknownPolicy;

#[derive(Subcommand, Debug, Clone)]
pub enum ClipsCommands {
    /// Validate a marks file and list the segments it describes
    Check(CheckArgs),
    /// Cut a video into clips, one per start/end pair
    Cut(CutArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Marks file to validate
    #[arg(short = 'm', long = "marks", value_hint = ValueHint::FilePath)]
    pub marks: PathBuf,

    /// Pairs with an UNKNOWN timestamp: reject (default from config) or skip
    #[arg(long = "unknown", value_enum)]
    pub unknown: Option<UnknownPolicy>,
}

#[derive(Args, Debug, Clone)]
pub struct CutArgs {
    /// Source video
    #[arg(short = 'v', long = "video", value_hint = ValueHint::FilePath)]
    pub video: PathBuf,

    /// Marks file recorded for the video
    #[arg(short = 'm', long = "marks", value_hint = ValueHint::FilePath)]
    pub marks: PathBuf,

    /// Directory for the clips; defaults to the video's directory
    #[arg(short = 'o', long = "out-dir", value_hint = ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// Boundary alignment: none or keyframe
    #[arg(long = "align-mode")]
    pub align_mode: Option<String>,

    /// Pairs with an UNKNOWN timestamp: reject or skip
    #[arg(long = "unknown", value_enum)]
    pub unknown: Option<UnknownPolicy>,

    /// Nudge a boundary after alignment, e.g. `2:end:-0.5` (repeatable)
    #[arg(long = "adjust", value_name = "PAIR:start|end:DELTA", allow_hyphen_values = true)]
    pub adjust: Vec<Adjustment>,

    /// Print the plan and ffmpeg commands without cutting
    #[arg(long)]
    pub dry_run: bool,
}
