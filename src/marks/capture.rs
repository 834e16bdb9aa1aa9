//! Mark capture: decide start/end, resolve the timestamp from the clipboard,
//! append to the recording's ledger.
//!
//! The player copies its position to the clipboard some time after the
//! gesture. A single timed read is not enough when two marks land on the
//! same second, so the clipboard is re-read while it still equals the
//! previous mark, within a fixed wait budget.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::clipboard::Clipboard;
use super::foreground::ForegroundProbe;
use super::ledger::{MarkLedger, is_ledger_field, recording_id_from_title};
use super::listener::InputEvent;
use super::{MarkTag, UNKNOWN_TIMESTAMP};
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTiming {
    /// Wait before the first read (D_init)
    pub initial_delay: Duration,
    /// Wait between re-reads (D_retry)
    pub retry_interval: Duration,
    /// Total wait budget (D_max)
    pub max_wait: Duration,
}

impl Default for RetryTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(800),
            retry_interval: Duration::from_millis(200),
            max_wait: Duration::from_millis(2000),
        }
    }
}

pub trait Clock: Send {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Transient state of one clipboard resolution; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardRetryState {
    pub reference: Option<String>,
    pub elapsed: Duration,
    pub reading: String,
    pub reads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Accept,
    /// Budget exhausted while the reading still equals the reference
    AcceptStale,
    Retry,
}

impl ClipboardRetryState {
    pub fn decide(&self, timing: &RetryTiming) -> RetryDecision {
        let Some(reference) = &self.reference else {
            return RetryDecision::Accept;
        };
        if &self.reading != reference {
            return RetryDecision::Accept;
        }
        // Checked before sleeping so the last retry never overshoots the budget
        if self.elapsed + timing.retry_interval <= timing.max_wait {
            RetryDecision::Retry
        } else {
            RetryDecision::AcceptStale
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub timestamp: String,
    pub elapsed: Duration,
    pub stale: bool,
    pub reads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    AwaitingClipboard(ClipboardRetryState),
    Resolved(Resolution),
}

/// Clipboard text that cannot be written as a single ledger field becomes
/// the sentinel, like an empty clipboard.
fn read_or_sentinel(clipboard: &mut dyn Clipboard) -> String {
    let Some(text) = clipboard.read_text() else {
        return UNKNOWN_TIMESTAMP.to_string();
    };
    let text = text.trim();
    if text.is_empty() {
        return UNKNOWN_TIMESTAMP.to_string();
    }
    if !is_ledger_field(text) {
        emit(
            Level::Debug,
            "marks.capture.unusable_clipboard",
            &format!("Clipboard text {text:?} is not a timestamp; treating it as {UNKNOWN_TIMESTAMP}"),
            None,
        );
        return UNKNOWN_TIMESTAMP.to_string();
    }
    text.to_string()
}

/// Run the clipboard retry protocol to completion. Never fails: an
/// unchanged clipboard is accepted once the budget is spent.
pub fn resolve_timestamp(
    reference: Option<String>,
    timing: &RetryTiming,
    clipboard: &mut dyn Clipboard,
    clock: &mut dyn Clock,
) -> Resolution {
    let mut state = CaptureState::Idle;
    let mut reference = reference;

    loop {
        state = match state {
            CaptureState::Idle => {
                clock.sleep(timing.initial_delay);
                CaptureState::AwaitingClipboard(ClipboardRetryState {
                    reference: reference.take(),
                    elapsed: timing.initial_delay,
                    reading: read_or_sentinel(clipboard),
                    reads: 1,
                })
            }
            CaptureState::AwaitingClipboard(mut retry) => match retry.decide(timing) {
                decision @ (RetryDecision::Accept | RetryDecision::AcceptStale) => {
                    CaptureState::Resolved(Resolution {
                        timestamp: retry.reading,
                        elapsed: retry.elapsed,
                        stale: decision == RetryDecision::AcceptStale,
                        reads: retry.reads,
                    })
                }
                RetryDecision::Retry => {
                    clock.sleep(timing.retry_interval);
                    retry.elapsed += timing.retry_interval;
                    retry.reading = read_or_sentinel(clipboard);
                    retry.reads += 1;
                    CaptureState::AwaitingClipboard(retry)
                }
            },
            CaptureState::Resolved(resolution) => return resolution,
        };
    }
}

/// Per-recording record counts: loaded from the ledger on first use, then
/// incremented locally for the rest of the process lifetime.
#[derive(Debug, Default, Clone)]
pub struct MarkCountCache {
    counts: HashMap<String, usize>,
}

impl MarkCountCache {
    pub fn count(&mut self, ledger: &MarkLedger) -> Result<usize> {
        if let Some(count) = self.counts.get(ledger.recording_id()) {
            return Ok(*count);
        }
        let count = ledger.count()?;
        self.counts.insert(ledger.recording_id().to_string(), count);
        Ok(count)
    }

    pub fn increment(&mut self, recording_id: &str) {
        *self.counts.entry(recording_id.to_string()).or_insert(0) += 1;
    }

    pub fn cached(&self, recording_id: &str) -> Option<usize> {
        self.counts.get(recording_id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkAppended {
    pub recording_id: String,
    pub ledger_path: PathBuf,
    pub ordinal: usize,
    pub tag: MarkTag,
    pub timestamp: String,
    pub stale: bool,
    pub waited: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Not the activation gesture
    Ignored,
    NoForeground,
    NotTarget { class: String },
    Recorded(MarkAppended),
    Failed(String),
}

pub struct MarkCaptureMachine {
    marks_dir: PathBuf,
    target_marker: String,
    trigger_button: String,
    timing: RetryTiming,
    clipboard: Box<dyn Clipboard>,
    clock: Box<dyn Clock>,
    foreground: Box<dyn ForegroundProbe>,
    counts: MarkCountCache,
}

impl MarkCaptureMachine {
    pub fn new(
        marks_dir: &Path,
        target_marker: &str,
        trigger_button: &str,
        timing: RetryTiming,
        clipboard: Box<dyn Clipboard>,
        clock: Box<dyn Clock>,
        foreground: Box<dyn ForegroundProbe>,
    ) -> Self {
        Self {
            marks_dir: marks_dir.to_path_buf(),
            target_marker: target_marker.to_string(),
            trigger_button: trigger_button.to_string(),
            timing,
            clipboard,
            clock,
            foreground,
            counts: MarkCountCache::default(),
        }
    }

    pub fn counts(&self) -> &MarkCountCache {
        &self.counts
    }

    /// Entry point for the listener. Errors are reported and swallowed so
    /// the caller can keep listening.
    pub fn handle_event(&mut self, event: &InputEvent) -> CaptureOutcome {
        if !event.is_qualifying(&self.trigger_button) {
            emit(
                Level::Debug,
                "marks.capture.ignored",
                &format!("Ignoring input event {event}"),
                None,
            );
            return CaptureOutcome::Ignored;
        }
        self.trigger()
    }

    /// Run one capture for whatever is focused right now
    pub fn trigger(&mut self) -> CaptureOutcome {
        match self.try_trigger() {
            Ok(outcome) => outcome,
            Err(err) => {
                emit(
                    Level::Error,
                    "marks.capture.failed",
                    &format!("No mark recorded: {err:#}"),
                    None,
                );
                CaptureOutcome::Failed(format!("{err:#}"))
            }
        }
    }

    fn try_trigger(&mut self) -> Result<CaptureOutcome> {
        let Some(window) = self.foreground.foreground()? else {
            emit(
                Level::Debug,
                "marks.capture.no_foreground",
                "No focused window; mark ignored",
                None,
            );
            return Ok(CaptureOutcome::NoForeground);
        };

        emit(
            Level::Debug,
            "marks.capture.foreground",
            &format!(
                "Foreground window: id={}, title='{}', class='{}'",
                window.id, window.title, window.class
            ),
            None,
        );

        if !window.matches_target(&self.target_marker) {
            emit(
                Level::Debug,
                "marks.capture.not_target",
                &format!(
                    "Foreground is not {}; mark ignored",
                    self.target_marker
                ),
                None,
            );
            return Ok(CaptureOutcome::NotTarget {
                class: window.class,
            });
        }

        let recording_id = recording_id_from_title(&window.title, &self.target_marker);
        let ledger = MarkLedger::new(&self.marks_dir, &recording_id);
        let appended = self.capture(&ledger)?;
        Ok(CaptureOutcome::Recorded(appended))
    }

    /// Resolve and append the next mark for `ledger`
    pub fn capture(&mut self, ledger: &MarkLedger) -> Result<MarkAppended> {
        let count = self.counts.count(ledger)?;
        let tag = MarkTag::for_count(count);
        let reference = if count > 0 {
            ledger.last_timestamp()?
        } else {
            None
        };

        let resolution = resolve_timestamp(
            reference.clone(),
            &self.timing,
            self.clipboard.as_mut(),
            self.clock.as_mut(),
        );

        if resolution.stale {
            emit(
                Level::Warn,
                "marks.capture.stale_clipboard",
                &format!(
                    "Clipboard still shows the previous mark ({}) after {} ms; recording it anyway",
                    resolution.timestamp,
                    resolution.elapsed.as_millis()
                ),
                None,
            );
        }

        ledger.append(&resolution.timestamp, tag)?;
        self.counts.increment(ledger.recording_id());

        let appended = MarkAppended {
            recording_id: ledger.recording_id().to_string(),
            ledger_path: ledger.path().to_path_buf(),
            ordinal: count + 1,
            tag,
            timestamp: resolution.timestamp,
            stale: resolution.stale,
            waited: resolution.elapsed,
        };

        emit(
            Level::Success,
            "marks.capture.appended",
            &format!(
                "{} #{}: {}, {}",
                appended.recording_id, appended.ordinal, appended.timestamp, appended.tag
            ),
            Some(serde_json::json!({
                "recording": appended.recording_id,
                "ledger": appended.ledger_path.display().to_string(),
                "line": appended.ordinal,
                "timestamp": appended.timestamp,
                "tag": appended.tag.as_str(),
                "stale": appended.stale,
                "waited_ms": appended.waited.as_millis() as u64,
            })),
        );

        Ok(appended)
    }
}
