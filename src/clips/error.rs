use std::path::PathBuf;
use thiserror::Error;

use super::timestamp::TimestampError;

/// Fatal problems found while compiling a ledger into segments.
///
/// Line numbers are physical line numbers in the `.marks` file (blank
/// lines included), so they can be used directly in an editor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipError {
    #[error("pair #{pair_index} (line {line}): {source}")]
    InvalidTimestamp {
        pair_index: usize,
        line: usize,
        #[source]
        source: TimestampError,
    },

    #[error("line {line}: invalid tag '{tag}', expected 'start' or 'end'")]
    InvalidTag { line: usize, tag: String },

    #[error("line {line}: expected '<timestamp>, <tag>', got '{content}'")]
    MalformedLine { line: usize, content: String },

    #[error("no valid entries found in the marks file")]
    EmptyLedger,

    #[error("marks must come in start/end pairs, found {count} entries")]
    UnpairedEntries { count: usize },

    #[error(
        "pair #{pair_index} (lines {start_line} and {end_line}) is not in 'start, end' order (got '{first}', '{second}')"
    )]
    OutOfOrder {
        pair_index: usize,
        start_line: usize,
        end_line: usize,
        first: String,
        second: String,
    },

    #[error(
        "pair #{pair_index} (lines {start_line}-{end_line}) has start >= end: start={start_raw} ({start_sec}s), end={end_raw} ({end_sec}s)"
    )]
    NonPositiveDuration {
        pair_index: usize,
        start_line: usize,
        end_line: usize,
        start_raw: String,
        end_raw: String,
        start_sec: f64,
        end_sec: f64,
    },

    #[error("pair #{pair_index} (lines {start_line}-{end_line}) contains an UNKNOWN timestamp ({start_raw}, {end_raw})")]
    UnknownTimestamp {
        pair_index: usize,
        start_line: usize,
        end_line: usize,
        start_raw: String,
        end_raw: String,
    },

    #[error("unsupported alignment mode '{0}', expected 'none' or 'keyframe'")]
    UnsupportedMode(String),

    #[error("{what} not found: {}", .path.display())]
    MissingFile { what: &'static str, path: PathBuf },
}

impl ClipError {
    /// Pair the error belongs to, when it is pair-specific
    pub fn pair_index(&self) -> Option<usize> {
        match self {
            ClipError::InvalidTimestamp { pair_index, .. }
            | ClipError::OutOfOrder { pair_index, .. }
            | ClipError::NonPositiveDuration { pair_index, .. }
            | ClipError::UnknownTimestamp { pair_index, .. } => Some(*pair_index),
            _ => None,
        }
    }
}
