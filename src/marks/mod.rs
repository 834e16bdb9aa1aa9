pub mod capture;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod foreground;
pub mod ledger;
pub mod listener;

use std::fmt;
use std::str::FromStr;

pub use cli::MarksCommands;
pub use commands::handle_marks_command;

/// Placeholder written when no usable clipboard value was available
pub const UNKNOWN_TIMESTAMP: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkTag {
    Start,
    End,
}

impl MarkTag {
    /// Tag for the next record given how many records already exist
    pub fn for_count(count: usize) -> Self {
        if count % 2 == 0 {
            MarkTag::Start
        } else {
            MarkTag::End
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkTag::Start => "start",
            MarkTag::End => "end",
        }
    }
}

impl fmt::Display for MarkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(MarkTag::Start),
            "end" => Ok(MarkTag::End),
            other => Err(format!("unknown mark tag '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_alternate_with_count() {
        assert_eq!(MarkTag::for_count(0), MarkTag::Start);
        assert_eq!(MarkTag::for_count(1), MarkTag::End);
        assert_eq!(MarkTag::for_count(4), MarkTag::Start);
    }

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!("START".parse::<MarkTag>(), Ok(MarkTag::Start));
        assert_eq!(" End ".parse::<MarkTag>(), Ok(MarkTag::End));
        assert!("stop".parse::<MarkTag>().is_err());
    }
}
