//! Compile mark ledgers into cut plans: parse pairs, align them to
//! keyframes, apply manual nudges, and run lossless ffmpeg cuts.

pub mod adjust;
pub mod align;
pub mod cli;
pub mod commands;
pub mod error;
pub mod ffmpeg;
pub mod keyframes;
pub mod parser;
pub mod planner;
pub mod timestamp;

pub use cli::ClipsCommands;
pub use commands::handle_clips_command;
