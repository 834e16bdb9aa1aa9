use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::ClipError;
use super::timestamp::parse_timestamp;
use crate::marks::{MarkTag, UNKNOWN_TIMESTAMP};

/// What to do with a pair whose start or end is the UNKNOWN sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Fail the whole ledger
    #[default]
    Reject,
    /// Drop the pair and report it
    Skip,
}

/// A validated `<timestamp>, <tag>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkEntry {
    pub line: usize,
    pub timestamp_raw: String,
    pub tag: MarkTag,
}

/// A start/end pair before keyframe alignment
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    /// 1-based position among all pairs in the ledger, skipped ones included
    pub pair_index: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub start_raw: String,
    pub end_raw: String,
    pub start_sec: f64,
    pub end_sec: f64,
}

impl RawSegment {
    pub fn duration(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPair {
    pub pair_index: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub start_raw: String,
    pub end_raw: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedLedger {
    pub segments: Vec<RawSegment>,
    pub skipped: Vec<SkippedPair>,
}

/// Split ledger text into entries. Blank lines are ignored but still count
/// toward line numbers.
pub fn parse_entries(contents: &str) -> Result<Vec<MarkEntry>, ClipError> {
    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let Some((ts, tag)) = raw.split_once(',') else {
            return Err(ClipError::MalformedLine {
                line: line_no,
                content: raw.to_string(),
            });
        };

        let tag_text = tag.trim();
        let tag = tag_text.parse::<MarkTag>().map_err(|_| ClipError::InvalidTag {
            line: line_no,
            tag: tag_text.to_string(),
        })?;

        entries.push(MarkEntry {
            line: line_no,
            timestamp_raw: ts.trim().to_string(),
            tag,
        });
    }
    Ok(entries)
}

/// Check count and strict start/end alternation over the whole ledger
pub fn validate_pairing(entries: &[MarkEntry]) -> Result<(), ClipError> {
    if entries.is_empty() {
        return Err(ClipError::EmptyLedger);
    }
    if entries.len() % 2 != 0 {
        return Err(ClipError::UnpairedEntries {
            count: entries.len(),
        });
    }

    for (idx, pair) in entries.chunks_exact(2).enumerate() {
        let (first, second) = (&pair[0], &pair[1]);
        if first.tag != MarkTag::Start || second.tag != MarkTag::End {
            return Err(ClipError::OutOfOrder {
                pair_index: idx + 1,
                start_line: first.line,
                end_line: second.line,
                first: first.tag.to_string(),
                second: second.tag.to_string(),
            });
        }
    }
    Ok(())
}

/// Compile ledger text into raw segments.
///
/// Every stage is fatal; no partial segment list is ever returned. Only
/// sentinel pairs under [`UnknownPolicy::Skip`] are dropped, and they are
/// listed in [`ParsedLedger::skipped`].
pub fn parse_ledger(contents: &str, policy: UnknownPolicy) -> Result<ParsedLedger, ClipError> {
    let entries = parse_entries(contents)?;
    validate_pairing(&entries)?;

    let mut parsed = ParsedLedger::default();
    for (idx, pair) in entries.chunks_exact(2).enumerate() {
        let pair_index = idx + 1;
        let (start, end) = (&pair[0], &pair[1]);

        if start.timestamp_raw == UNKNOWN_TIMESTAMP || end.timestamp_raw == UNKNOWN_TIMESTAMP {
            match policy {
                UnknownPolicy::Reject => {
                    return Err(ClipError::UnknownTimestamp {
                        pair_index,
                        start_line: start.line,
                        end_line: end.line,
                        start_raw: start.timestamp_raw.clone(),
                        end_raw: end.timestamp_raw.clone(),
                    });
                }
                UnknownPolicy::Skip => {
                    parsed.skipped.push(SkippedPair {
                        pair_index,
                        start_line: start.line,
                        end_line: end.line,
                        start_raw: start.timestamp_raw.clone(),
                        end_raw: end.timestamp_raw.clone(),
                    });
                    continue;
                }
            }
        }

        let to_seconds = |entry: &MarkEntry| {
            parse_timestamp(&entry.timestamp_raw).map_err(|source| ClipError::InvalidTimestamp {
                pair_index,
                line: entry.line,
                source,
            })
        };
        let start_sec = to_seconds(start)?;
        let end_sec = to_seconds(end)?;

        if start_sec >= end_sec {
            return Err(ClipError::NonPositiveDuration {
                pair_index,
                start_line: start.line,
                end_line: end.line,
                start_raw: start.timestamp_raw.clone(),
                end_raw: end.timestamp_raw.clone(),
                start_sec,
                end_sec,
            });
        }

        parsed.segments.push(RawSegment {
            pair_index,
            start_line: start.line,
            end_line: end.line,
            start_raw: start.timestamp_raw.clone(),
            end_raw: end.timestamp_raw.clone(),
            start_sec,
            end_sec,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_MARKS: &str = "00:00:05, start\n00:01:10, end\n00:02:00, start\n00:02:30, end\n";

    #[test]
    fn well_formed_ledger_yields_ordered_pairs() {
        let parsed = parse_ledger(FOUR_MARKS, UnknownPolicy::Reject).unwrap();
        let bounds: Vec<_> = parsed
            .segments
            .iter()
            .map(|s| (s.pair_index, s.start_sec, s.end_sec))
            .collect();
        assert_eq!(bounds, vec![(1, 5.0, 70.0), (2, 120.0, 150.0)]);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn blank_lines_are_ignored_but_numbered() {
        let parsed = parse_ledger("\n00:00:05, START\n\n  00:00:09 ,End  \n", UnknownPolicy::Reject).unwrap();
        let segment = &parsed.segments[0];
        assert_eq!((segment.start_line, segment.end_line), (2, 4));
        assert_eq!(segment.end_raw, "00:00:09");
    }

    #[test]
    fn odd_count_is_unpaired() {
        let err = parse_ledger("1, start\n2, end\n3, start\n", UnknownPolicy::Reject).unwrap_err();
        assert_eq!(err, ClipError::UnpairedEntries { count: 3 });
    }

    #[test]
    fn swapped_pair_is_out_of_order() {
        let err = parse_ledger("1, start\n2, end\n4, end\n3, start\n", UnknownPolicy::Reject).unwrap_err();
        match err {
            ClipError::OutOfOrder {
                pair_index,
                start_line,
                end_line,
                ..
            } => assert_eq!((pair_index, start_line, end_line), (2, 3, 4)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn line_shape_errors() {
        assert!(matches!(
            parse_ledger("00:00:01 start\n", UnknownPolicy::Reject),
            Err(ClipError::MalformedLine { line: 1, .. })
        ));
        assert!(matches!(
            parse_ledger("1, start\n2, stop\n", UnknownPolicy::Reject),
            Err(ClipError::InvalidTag { line: 2, ref tag }) if tag == "stop"
        ));
        assert_eq!(
            parse_ledger(" \n\n", UnknownPolicy::Reject),
            Err(ClipError::EmptyLedger)
        );
    }

    #[test]
    fn unknown_pairs_follow_policy() {
        let contents = "UNKNOWN, start\n00:00:10, end\n00:00:20, start\n00:00:30, end\n";

        let err = parse_ledger(contents, UnknownPolicy::Reject).unwrap_err();
        assert_eq!(err.pair_index(), Some(1));
        assert!(matches!(err, ClipError::UnknownTimestamp { .. }));

        let parsed = parse_ledger(contents, UnknownPolicy::Skip).unwrap();
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].pair_index, 1);
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].pair_index, 2);
    }

    #[test]
    fn invalid_timestamp_names_pair_and_line() {
        let err = parse_ledger("0:5, start\n0:61, end\n", UnknownPolicy::Reject).unwrap_err();
        match err {
            ClipError::InvalidTimestamp {
                pair_index, line, ..
            } => assert_eq!((pair_index, line), (1, 2)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn overflowing_end_timestamp_is_invalid() {
        let contents = format!("0, start\n{}, end\n", "9".repeat(400));
        let err = parse_ledger(&contents, UnknownPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            ClipError::InvalidTimestamp { pair_index: 1, line: 2, .. }
        ));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let err = parse_ledger("00:01:00, start\n00:01:00, end\n", UnknownPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            ClipError::NonPositiveDuration { pair_index: 1, .. }
        ));
    }

    #[test]
    fn any_alternating_ledger_yields_half_as_many_segments() {
        for pairs in 1..8 {
            let contents: String = (0..pairs)
                .map(|i| format!("{}, start\n{}, end\n", i * 10, i * 10 + 5))
                .collect();
            let parsed = parse_ledger(&contents, UnknownPolicy::Reject).unwrap();
            assert_eq!(parsed.segments.len(), pairs);
            assert!(parsed
                .segments
                .windows(2)
                .all(|w| w[0].pair_index < w[1].pair_index));
        }
    }
}
