use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::MarkTag;

pub const LEDGER_EXTENSION: &str = "marks";
pub const UNKNOWN_RECORDING: &str = "unknown_video";

/// One persisted mark. `ordinal` is the 1-based position among the
/// non-blank lines of the ledger; it is derived on read, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRecord {
    pub ordinal: usize,
    pub timestamp_raw: String,
    pub tag: MarkTag,
}

/// Append-only `.marks` file for one recording
#[derive(Debug, Clone)]
pub struct MarkLedger {
    recording_id: String,
    path: PathBuf,
}

impl MarkLedger {
    pub fn new(marks_dir: &Path, recording_id: &str) -> Self {
        Self {
            recording_id: recording_id.to_string(),
            path: marks_dir.join(format!("{recording_id}.{LEDGER_EXTENSION}")),
        }
    }

    /// Open a ledger by explicit file path
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let recording_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN_RECORDING.to_string());
        Self { recording_id, path }
    }

    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Raw file contents; a missing ledger reads as empty
    pub fn contents(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("reading mark ledger {}", self.path.display()))
    }

    /// Number of records (non-blank lines) currently on disk
    pub fn count(&self) -> Result<usize> {
        Ok(self
            .contents()?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .count())
    }

    /// Timestamp of the last non-blank record, if any
    pub fn last_timestamp(&self) -> Result<Option<String>> {
        let contents = self.contents()?;
        Ok(contents
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| match line.split_once(',') {
                Some((ts, _)) => ts.trim().to_string(),
                None => line.trim().to_string(),
            }))
    }

    /// Records in file order. Lines that do not look like `<ts>, <tag>`
    /// are skipped here; strict validation belongs to the segment parser.
    pub fn records(&self) -> Result<Vec<MarkRecord>> {
        let contents = self.contents()?;
        let records = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .filter_map(|(idx, line)| {
                let (ts, tag) = line.split_once(',')?;
                let tag = tag.trim().parse::<MarkTag>().ok()?;
                Some(MarkRecord {
                    ordinal: idx + 1,
                    timestamp_raw: ts.trim().to_string(),
                    tag,
                })
            })
            .collect();
        Ok(records)
    }

    /// Append one record. The line is written with a single `write_all` on a
    /// file opened in append mode, so earlier records are never rewritten.
    pub fn append(&self, timestamp: &str, tag: MarkTag) -> Result<()> {
        if !is_ledger_field(timestamp) {
            anyhow::bail!(
                "refusing to append {timestamp:?} to {}: not a single-line timestamp field",
                self.path.display()
            );
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating marks directory {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening mark ledger {}", self.path.display()))?;

        let line = format!("{}, {}\n", timestamp, tag);
        file.write_all(line.as_bytes())
            .with_context(|| format!("appending to mark ledger {}", self.path.display()))?;
        file.sync_data()
            .with_context(|| format!("flushing mark ledger {}", self.path.display()))?;
        Ok(())
    }
}

/// Whether `value` fits in the timestamp column of one `<ts>, <tag>` line
pub fn is_ledger_field(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains(['\n', '\r', ','])
}

/// Derive a recording identifier from a player window title.
///
/// Titles usually carry the file name, optionally followed by
/// `" - <player>"`. The suffix naming `player_marker` is dropped, then the
/// basename without extension is used.
pub fn recording_id_from_title(title: &str, player_marker: &str) -> String {
    let mut name = title.trim();

    if let Some((head, tail)) = name.rsplit_once(" - ")
        && !player_marker.is_empty()
        && tail.to_lowercase().contains(&player_marker.to_lowercase())
    {
        name = head.trim();
    }

    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => base,
    };

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string();

    if cleaned.is_empty() {
        UNKNOWN_RECORDING.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_writes_documented_line_format() {
        let dir = tempdir().unwrap();
        let ledger = MarkLedger::new(dir.path(), "concert");

        ledger.append("00:41:58", MarkTag::Start).unwrap();
        ledger.append("UNKNOWN", MarkTag::End).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("concert.marks")).unwrap();
        assert_eq!(contents, "00:41:58, start\nUNKNOWN, end\n");
    }

    #[test]
    fn missing_ledger_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = MarkLedger::new(dir.path(), "nothing");
        assert_eq!(ledger.count().unwrap(), 0);
        assert_eq!(ledger.last_timestamp().unwrap(), None);
        assert!(ledger.records().unwrap().is_empty());
    }

    #[test]
    fn count_and_tail_ignore_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("talk.marks");
        std::fs::write(&path, "00:00:05, start\n\n00:01:10, end\n   \n\n").unwrap();

        let ledger = MarkLedger::at_path(&path);
        assert_eq!(ledger.recording_id(), "talk");
        assert_eq!(ledger.count().unwrap(), 2);
        assert_eq!(ledger.last_timestamp().unwrap().as_deref(), Some("00:01:10"));

        let records = ledger.records().unwrap();
        assert_eq!(records[1].ordinal, 2);
        assert_eq!(records[1].tag, MarkTag::End);
    }

    #[test]
    fn append_preserves_existing_records() {
        let dir = tempdir().unwrap();
        let ledger = MarkLedger::new(&dir.path().join("nested"), "clip");
        ledger.append("5", MarkTag::Start).unwrap();
        ledger.append("9", MarkTag::End).unwrap();
        ledger.append("12", MarkTag::Start).unwrap();

        assert_eq!(ledger.count().unwrap(), 3);
        assert_eq!(ledger.last_timestamp().unwrap().as_deref(), Some("12"));
    }

    #[test]
    fn append_refuses_values_that_break_the_line_format() {
        let dir = tempdir().unwrap();
        let ledger = MarkLedger::new(dir.path(), "clip");
        ledger.append("00:00:01", MarkTag::Start).unwrap();

        for bad in ["00:00:05\nhttps://x", "1, 2", "3\r", "  "] {
            assert!(ledger.append(bad, MarkTag::End).is_err(), "accepted {bad:?}");
        }
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn recording_id_strips_extension_and_player_suffix() {
        assert_eq!(recording_id_from_title("MyConcert_2025.ts", "mpv"), "MyConcert_2025");
        assert_eq!(recording_id_from_title("  talk.final.mkv - mpv ", "mpv"), "talk.final");
        assert_eq!(recording_id_from_title("/videos/a b.mp4", "mpv"), "a b");
        assert_eq!(recording_id_from_title("Live - Part 2", "mpv"), "Live - Part 2");
        assert_eq!(recording_id_from_title("", "mpv"), UNKNOWN_RECORDING);
        assert_eq!(recording_id_from_title(".hidden", "mpv"), ".hidden");
    }
}
