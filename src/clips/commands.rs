use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::adjust::apply_adjustments;
use super::align::{AlignMode, AlignNote, Keyframes, align_segments};
use super::cli::{CheckArgs, ClipsCommands, CutArgs};
use super::error::ClipError;
use super::ffmpeg::{FfmpegCutter, display_command};
use super::keyframes::extract_keyframes;
use super::parser::{ParsedLedger, UnknownPolicy, parse_ledger};
use super::planner::{execute_plan, plan_cuts};
use super::timestamp::format_timestamp;
use crate::common::paths;
use crate::config::MarkcutConfig;
use crate::ui::prelude::*;

pub fn handle_clips_command(command: ClipsCommands, config: &MarkcutConfig) -> Result<()> {
    match command {
        ClipsCommands::Check(args) => handle_check(args, config),
        ClipsCommands::Cut(args) => handle_cut(args, config),
    }
}

fn require_file(path: &Path, what: &'static str) -> Result<PathBuf> {
    let path = paths::expand_path(path);
    if !path.is_file() {
        return Err(ClipError::MissingFile { what, path }.into());
    }
    Ok(path)
}

/// Read and compile a marks file, reporting skipped pairs as warnings
fn load_segments(marks: &Path, policy: UnknownPolicy) -> Result<ParsedLedger> {
    let contents = fs::read_to_string(marks)
        .with_context(|| format!("Failed to read marks file {}", marks.display()))?;
    let parsed = parse_ledger(&contents, policy)
        .with_context(|| format!("Invalid marks file {}", marks.display()))?;

    for skipped in &parsed.skipped {
        emit(
            Level::Warn,
            "clips.parse.skipped",
            &format!(
                "Skipping pair #{} (lines {}-{}): contains UNKNOWN timestamp ({}, {})",
                skipped.pair_index,
                skipped.start_line,
                skipped.end_line,
                skipped.start_raw,
                skipped.end_raw
            ),
            Some(serde_json::json!({
                "pair": skipped.pair_index,
                "start_line": skipped.start_line,
                "end_line": skipped.end_line,
            })),
        );
    }

    Ok(parsed)
}

fn handle_check(args: CheckArgs, config: &MarkcutConfig) -> Result<()> {
    let marks = require_file(&args.marks, "marks file")?;
    let policy = args.unknown.unwrap_or(config.unknown_policy);
    let parsed = load_segments(&marks, policy)?;

    emit(
        Level::Success,
        "clips.check.valid",
        &format!("{} is a valid marks file", marks.display()),
        None,
    );

    for segment in &parsed.segments {
        emit(
            Level::Info,
            "clips.check.segment",
            &format!(
                "Pair #{} (lines {}-{}): {} → {} ({:.3}s)",
                segment.pair_index,
                segment.start_line,
                segment.end_line,
                segment.start_raw,
                segment.end_raw,
                segment.duration()
            ),
            Some(serde_json::json!({
                "pair": segment.pair_index,
                "start": segment.start_sec,
                "end": segment.end_sec,
            })),
        );
    }

    let total: f64 = parsed.segments.iter().map(|s| s.duration()).sum();
    emit(
        Level::Info,
        "clips.check.summary",
        &format!(
            "{} segment(s), {} skipped, total {}",
            parsed.segments.len(),
            parsed.skipped.len(),
            format_timestamp(total)
        ),
        Some(serde_json::json!({
            "segments": parsed.segments.len(),
            "skipped": parsed.skipped.len(),
            "total_seconds": total,
        })),
    );
    Ok(())
}

fn handle_cut(args: CutArgs, config: &MarkcutConfig) -> Result<()> {
    let align_mode = match args.align_mode.as_deref() {
        Some(mode) => mode.parse::<AlignMode>()?,
        None => config.align_mode,
    };
    let policy = args.unknown.unwrap_or(config.unknown_policy);

    let video = require_file(&args.video, "video file")?;
    let marks = require_file(&args.marks, "marks file")?;
    let out_dir = match &args.out_dir {
        Some(dir) => paths::expand_path(dir),
        None => video
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    if !args.dry_run {
        which::which("ffmpeg").context("ffmpeg not found in PATH; install it or use --dry-run")?;
    }

    emit(Level::Info, "clips.cut.video", &format!("Using video: {}", video.display()), None);
    emit(Level::Info, "clips.cut.marks", &format!("Using marks: {}", marks.display()), None);
    emit(
        Level::Info,
        "clips.cut.out_dir",
        &format!("Output directory: {}", out_dir.display()),
        None,
    );

    let parsed = load_segments(&marks, policy)?;
    if parsed.segments.is_empty() {
        emit(
            Level::Warn,
            "clips.cut.nothing_to_do",
            "No valid segments left after skipping UNKNOWN entries. Nothing to do.",
            None,
        );
        return Ok(());
    }

    let keyframes = match align_mode {
        AlignMode::Keyframe => extract_keyframes(&video),
        AlignMode::None => Keyframes::default(),
    };

    let mut aligned = align_segments(&parsed.segments, &keyframes, align_mode);
    apply_adjustments(&mut aligned, &args.adjust)?;

    for segment in &aligned {
        let level = match segment.note {
            AlignNote::Degenerate | AlignNote::NoKeyframeData => Level::Warn,
            _ => Level::Info,
        };
        emit(
            level,
            "clips.align.segment",
            &format!(
                "Pair #{} (lines {}-{}): raw [{} → {}], final [{} → {}], {}",
                segment.raw.pair_index,
                segment.raw.start_line,
                segment.raw.end_line,
                segment.raw.start_raw,
                segment.raw.end_raw,
                format_timestamp(segment.start_final),
                format_timestamp(segment.end_final),
                segment.note
            ),
            Some(serde_json::json!({
                "pair": segment.raw.pair_index,
                "start_final": segment.start_final,
                "end_final": segment.end_final,
                "used_keyframe_alignment": segment.used_keyframe_alignment,
                "note": segment.note.as_str(),
            })),
        );
    }

    let plan = plan_cuts(&video, &aligned, &out_dir, &config.default_extension);

    if args.dry_run {
        for instruction in &plan {
            emit(
                Level::Info,
                "clips.cut.dry_run",
                &format!("(dry-run) {}", display_command(instruction)),
                Some(serde_json::json!({
                    "clip": instruction.sequence_index,
                    "pair": instruction.pair_index,
                    "output": instruction.output.display().to_string(),
                    "start": instruction.start_timestamp,
                    "end": instruction.end_timestamp,
                })),
            );
        }
        emit(
            Level::Info,
            "clips.cut.dry_run_done",
            &format!("Dry run: {} clip(s) planned, nothing written", plan.len()),
            None,
        );
        return Ok(());
    }

    paths::ensure_dir(&out_dir)?;
    let summary = execute_plan(&plan, &mut FfmpegCutter);

    emit(
        Level::Info,
        "clips.cut.summary",
        &format!(
            "Done. Success: {}, Fail: {}",
            summary.succeeded,
            summary.failure_count()
        ),
        Some(serde_json::json!({
            "succeeded": summary.succeeded,
            "failed": summary.failure_count(),
        })),
    );

    if summary.failure_count() > 0 {
        anyhow::bail!("{} of {} clip(s) failed", summary.failure_count(), plan.len());
    }
    Ok(())
}
