use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::capture::{CaptureOutcome, MarkCaptureMachine, SystemClock};
use super::cli::MarksCommands;
use super::clipboard::SystemClipboard;
use super::foreground::CompositorProbe;
use super::ledger::{LEDGER_EXTENSION, MarkLedger, recording_id_from_title};
use super::listener::{EventSource, run_listener};
use super::{MarkTag, UNKNOWN_TIMESTAMP};
use crate::config::MarkcutConfig;
use crate::ui::prelude::*;

pub async fn handle_marks_command(command: MarksCommands, config: &MarkcutConfig) -> Result<()> {
    match command {
        MarksCommands::Listen { events } => handle_listen(events, config).await,
        MarksCommands::Mark => handle_mark(config).await,
        MarksCommands::Show { target } => handle_show(&target, config),
        MarksCommands::Path { title } => handle_path(&title, config),
    }
}

fn build_machine(config: &MarkcutConfig) -> Result<MarkCaptureMachine> {
    let probe = CompositorProbe::detect()?;
    emit(
        Level::Debug,
        "marks.setup.compositor",
        &format!("Using {} for foreground window lookups", probe.kind().name()),
        None,
    );
    let clipboard = SystemClipboard::detect();
    emit(
        Level::Debug,
        "marks.setup.clipboard",
        &format!(
            "Reading the clipboard through {}",
            clipboard.display_server().name()
        ),
        None,
    );

    Ok(MarkCaptureMachine::new(
        &config.marks_dir,
        &config.target_window_class,
        &config.trigger_button,
        config.retry_timing(),
        Box::new(clipboard),
        Box::new(SystemClock),
        Box::new(probe),
    ))
}

async fn handle_listen(events: Option<PathBuf>, config: &MarkcutConfig) -> Result<()> {
    let machine = build_machine(config)?;
    let source = match events {
        Some(path) => EventSource::File(path),
        None => EventSource::Stdin,
    };

    emit(
        Level::Info,
        "marks.listen.started",
        &format!(
            "Listening for '{}' presses while {} is focused; marks go to {}",
            config.trigger_button,
            config.target_window_class,
            config.marks_dir.display()
        ),
        None,
    );

    let summary = run_listener(source, machine).await?;

    emit(
        Level::Info,
        "marks.listen.stopped",
        &format!(
            "Listener stopped: {} event(s), {} mark(s) recorded, {} failed",
            summary.events, summary.recorded, summary.failed
        ),
        Some(serde_json::json!({
            "events": summary.events,
            "recorded": summary.recorded,
            "ignored": summary.ignored,
            "failed": summary.failed,
            "interrupted": summary.interrupted,
        })),
    );
    Ok(())
}

async fn handle_mark(config: &MarkcutConfig) -> Result<()> {
    let mut machine = build_machine(config)?;
    let outcome = tokio::task::spawn_blocking(move || machine.trigger())
        .await
        .context("mark capture worker panicked")?;

    match outcome {
        CaptureOutcome::Recorded(_) => {}
        CaptureOutcome::NoForeground => emit(
            Level::Warn,
            "marks.mark.no_foreground",
            "No focused window; no mark recorded",
            None,
        ),
        CaptureOutcome::NotTarget { class } => emit(
            Level::Warn,
            "marks.mark.not_target",
            &format!(
                "Focused window ({class}) is not {}; no mark recorded",
                config.target_window_class
            ),
            None,
        ),
        CaptureOutcome::Failed(reason) => anyhow::bail!("no mark recorded: {reason}"),
        CaptureOutcome::Ignored => {}
    }
    Ok(())
}

/// Resolve `target` as a ledger path when it looks like one, otherwise as
/// a recording identifier inside the marks directory.
fn resolve_ledger(target: &str, marks_dir: &Path) -> MarkLedger {
    let as_path = Path::new(target);
    let looks_like_path = target.contains(std::path::MAIN_SEPARATOR)
        || as_path.extension().is_some_and(|ext| ext == LEDGER_EXTENSION)
        || as_path.is_file();
    if looks_like_path {
        MarkLedger::at_path(as_path)
    } else {
        MarkLedger::new(marks_dir, target)
    }
}

fn handle_show(target: &str, config: &MarkcutConfig) -> Result<()> {
    let ledger = resolve_ledger(target, &config.marks_dir);
    if !ledger.exists() {
        anyhow::bail!(
            "no marks recorded for '{}' ({} does not exist)",
            ledger.recording_id(),
            ledger.path().display()
        );
    }

    let records = ledger.records()?;
    let count = ledger.count()?;

    emit(
        Level::Info,
        "marks.show.header",
        &format!("{} ({})", ledger.recording_id(), ledger.path().display()),
        None,
    );
    separator();

    for record in &records {
        let unknown = record.timestamp_raw == UNKNOWN_TIMESTAMP;
        emit(
            if unknown { Level::Warn } else { Level::Info },
            "marks.show.record",
            &format!(
                "{:>4}  {:<5}  {}",
                record.ordinal,
                record.tag.as_str(),
                record.timestamp_raw
            ),
            Some(serde_json::json!({
                "line": record.ordinal,
                "tag": record.tag.as_str(),
                "timestamp": record.timestamp_raw,
            })),
        );
    }

    if records.len() != count {
        emit(
            Level::Warn,
            "marks.show.unreadable",
            &format!(
                "{} line(s) are not '<timestamp>, <tag>' records",
                count - records.len()
            ),
            None,
        );
    }

    let awaiting_end = MarkTag::for_count(count) == MarkTag::End;
    emit(
        Level::Info,
        "marks.show.summary",
        &format!(
            "{count} mark(s){}",
            if awaiting_end { ", awaiting end" } else { "" }
        ),
        Some(serde_json::json!({
            "recording": ledger.recording_id(),
            "count": count,
            "awaiting_end": awaiting_end,
        })),
    );
    Ok(())
}

fn handle_path(title: &str, config: &MarkcutConfig) -> Result<()> {
    let recording_id = recording_id_from_title(title, &config.target_window_class);
    let ledger = MarkLedger::new(&config.marks_dir, &recording_id);
    emit(
        Level::Info,
        "marks.path",
        &ledger.path().display().to_string(),
        Some(serde_json::json!({
            "recording": recording_id,
            "path": ledger.path().display().to_string(),
            "exists": ledger.exists(),
        })),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn targets_resolve_to_ids_or_paths() {
        let dir = tempdir().unwrap();
        let by_id = resolve_ledger("gig", dir.path());
        assert_eq!(by_id.path(), dir.path().join("gig.marks"));

        let by_name = resolve_ledger("other.marks", dir.path());
        assert_eq!(by_name.recording_id(), "other");
        assert_eq!(by_name.path(), Path::new("other.marks"));

        let explicit = dir.path().join("nested").join("talk.marks");
        let by_path = resolve_ledger(&explicit.display().to_string(), dir.path());
        assert_eq!(by_path.path(), explicit);
        assert_eq!(by_path.recording_id(), "talk");
    }
}
