use anyhow::Result;
use std::path::{Path, PathBuf};

use super::align::{AlignNote, AlignedSegment};
use super::timestamp::format_timestamp;
use crate::ui::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct CutInstruction {
    /// 1-based position in the plan; drives the `clip_NNN` name
    pub sequence_index: usize,
    /// Ledger pair this clip came from
    pub pair_index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_sec: f64,
    pub end_sec: f64,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub note: AlignNote,
}

/// `clip_001.mkv`, `clip_002.mkv`, ... sharing the source's extension
pub fn clip_file_name(sequence_index: usize, source: &Path, default_extension: &str) -> String {
    let extension = source
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| default_extension.trim_start_matches('.').to_string());
    format!("clip_{sequence_index:03}.{extension}")
}

pub fn plan_cuts(
    source: &Path,
    segments: &[AlignedSegment],
    out_dir: &Path,
    default_extension: &str,
) -> Vec<CutInstruction> {
    segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            let sequence_index = idx + 1;
            CutInstruction {
                sequence_index,
                pair_index: segment.raw.pair_index,
                source: source.to_path_buf(),
                output: out_dir.join(clip_file_name(sequence_index, source, default_extension)),
                start_sec: segment.start_final,
                end_sec: segment.end_final,
                start_timestamp: format_timestamp(segment.start_final),
                end_timestamp: format_timestamp(segment.end_final),
                note: segment.note,
            }
        })
        .collect()
}

/// Runs one cut; an `Err` fails that clip only
pub trait CutExecutor {
    fn cut(&mut self, instruction: &CutInstruction) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutSummary {
    pub succeeded: usize,
    /// `(sequence_index, reason)` for each failed clip
    pub failed: Vec<(usize, String)>,
}

impl CutSummary {
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Execute the plan in order, one cut at a time, continuing past failures
pub fn execute_plan(plan: &[CutInstruction], executor: &mut dyn CutExecutor) -> CutSummary {
    let mut summary = CutSummary::default();
    let total = plan.len();

    for instruction in plan {
        emit(
            Level::Info,
            "clips.cut.started",
            &format!(
                "[{}/{}] {} → {} ({})",
                instruction.sequence_index,
                total,
                instruction.start_timestamp,
                instruction.end_timestamp,
                instruction.output.display()
            ),
            None,
        );

        match executor.cut(instruction) {
            Ok(()) => {
                summary.succeeded += 1;
                emit(
                    Level::Success,
                    "clips.cut.done",
                    &format!("Created {}", instruction.output.display()),
                    Some(serde_json::json!({
                        "clip": instruction.sequence_index,
                        "pair": instruction.pair_index,
                        "output": instruction.output.display().to_string(),
                        "start": instruction.start_timestamp,
                        "end": instruction.end_timestamp,
                        "note": instruction.note.as_str(),
                    })),
                );
            }
            Err(err) => {
                emit(
                    Level::Error,
                    "clips.cut.failed",
                    &format!(
                        "Clip {} (pair #{}) failed: {err:#}",
                        instruction.sequence_index, instruction.pair_index
                    ),
                    None,
                );
                summary
                    .failed
                    .push((instruction.sequence_index, format!("{err:#}")));
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::align::{AlignMode, Keyframes, align_segments};
    use crate::clips::parser::{UnknownPolicy, parse_ledger};

    struct ScriptedCutter {
        fail_on: Vec<usize>,
        seen: Vec<usize>,
    }

    impl CutExecutor for ScriptedCutter {
        fn cut(&mut self, instruction: &CutInstruction) -> Result<()> {
            self.seen.push(instruction.sequence_index);
            if self.fail_on.contains(&instruction.sequence_index) {
                anyhow::bail!("ffmpeg exited with status 1");
            }
            Ok(())
        }
    }

    fn sample_plan(source: &Path) -> Vec<CutInstruction> {
        let parsed = parse_ledger(
            "00:00:05, start\n00:01:10.5, end\n00:02:00, start\n00:02:30, end\n00:03:00, start\n00:03:01, end\n",
            UnknownPolicy::Reject,
        )
        .unwrap();
        let aligned = align_segments(&parsed.segments, &Keyframes::default(), AlignMode::None);
        plan_cuts(source, &aligned, Path::new("/tmp/out"), "mp4")
    }

    #[test]
    fn names_follow_sequence_and_source_extension() {
        let plan = sample_plan(Path::new("/videos/gig.mkv"));
        let names: Vec<_> = plan
            .iter()
            .map(|i| i.output.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["clip_001.mkv", "clip_002.mkv", "clip_003.mkv"]);
        assert_eq!(plan[0].start_timestamp, "00:00:05");
        assert_eq!(plan[0].end_timestamp, "00:01:10.500");
    }

    #[test]
    fn missing_extension_uses_default() {
        assert_eq!(clip_file_name(12, Path::new("raw_capture"), ".webm"), "clip_012.webm");
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let plan = sample_plan(Path::new("gig.mp4"));
        let mut cutter = ScriptedCutter {
            fail_on: vec![2],
            seen: Vec::new(),
        };
        let summary = execute_plan(&plan, &mut cutter);
        assert_eq!(cutter.seen, vec![1, 2, 3]);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.failed[0].0, 2);
    }
}
