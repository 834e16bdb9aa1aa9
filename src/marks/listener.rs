use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::capture::{CaptureOutcome, MarkCaptureMachine};
use crate::ui::prelude::*;

/// One raw input event, e.g. the line `middle press`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub button: String,
    pub pressed: bool,
}

impl InputEvent {
    pub fn press(button: &str) -> Self {
        Self {
            button: button.to_string(),
            pressed: true,
        }
    }

    pub fn release(button: &str) -> Self {
        Self {
            button: button.to_string(),
            pressed: false,
        }
    }

    /// Parse `<button> [press|release]`; a bare button name is a press
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let button = parts.next()?.to_lowercase();
        let pressed = match parts.next().map(str::to_lowercase).as_deref() {
            None | Some("press") | Some("down") | Some("pressed") => true,
            Some("release") | Some("up") | Some("released") => false,
            Some(_) => return None,
        };
        Some(Self { button, pressed })
    }

    /// Only the press of the configured button triggers a mark
    pub fn is_qualifying(&self, trigger_button: &str) -> bool {
        self.pressed && self.button.eq_ignore_ascii_case(trigger_button)
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.pressed { "press" } else { "release" };
        write!(f, "{} {}", self.button, action)
    }
}

#[derive(Debug, Clone)]
pub enum EventSource {
    Stdin,
    /// A FIFO or regular file that a window manager binding writes to
    File(PathBuf),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenSummary {
    pub events: usize,
    pub recorded: usize,
    pub ignored: usize,
    pub failed: usize,
    /// Stopped by a shutdown request rather than the end of input
    pub interrupted: bool,
}

impl ListenSummary {
    fn record(&mut self, outcome: &CaptureOutcome) {
        self.events += 1;
        match outcome {
            CaptureOutcome::Recorded(_) => self.recorded += 1,
            CaptureOutcome::Failed(_) => self.failed += 1,
            CaptureOutcome::Ignored
            | CaptureOutcome::NoForeground
            | CaptureOutcome::NotTarget { .. } => self.ignored += 1,
        }
    }
}

async fn read_events<R>(reader: R, tx: mpsc::Sender<InputEvent>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("reading input events")? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match InputEvent::parse(trimmed) {
            Some(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            None => emit(
                Level::Debug,
                "marks.listen.unparsed",
                &format!("Skipping unrecognized input event line '{trimmed}'"),
                None,
            ),
        }
    }
    Ok(())
}

/// Process events one at a time until the reader ends.
///
/// The reader task only parses and queues events. Each capture runs on the
/// blocking pool with the machine moved in and back out, so the clipboard
/// wait never stalls event delivery and a mark arriving mid-wait queues
/// behind the current one.
pub async fn listen<R>(
    reader: R,
    machine: MarkCaptureMachine,
) -> Result<(MarkCaptureMachine, ListenSummary)>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    listen_until(reader, machine, std::future::pending()).await
}

/// Like [`listen`], but also stops once `shutdown` resolves.
///
/// Shutdown is only observed between captures: a capture that has started
/// always runs its clipboard wait and ledger append to completion.
pub async fn listen_until<R, S>(
    reader: R,
    mut machine: MarkCaptureMachine,
    shutdown: S,
) -> Result<(MarkCaptureMachine, ListenSummary)>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::channel::<InputEvent>(64);
    let reader_task = tokio::spawn(read_events(reader, tx));
    tokio::pin!(shutdown);

    let mut summary = ListenSummary::default();
    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                summary.interrupted = true;
                None
            }
            event = rx.recv() => event,
        };
        let Some(event) = next else { break };

        let (returned, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = machine.handle_event(&event);
            (machine, outcome)
        })
        .await
        .context("mark capture worker panicked")?;
        machine = returned;
        summary.record(&outcome);
    }

    if summary.interrupted {
        // A pending stdin read cannot finish on its own
        reader_task.abort();
        return Ok((machine, summary));
    }

    match reader_task.await {
        Ok(result) => result?,
        Err(err) => anyhow::bail!("input event reader failed: {err}"),
    }

    Ok((machine, summary))
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        emit(
            Level::Warn,
            "marks.listen.signal",
            &format!("Cannot watch for Ctrl-C: {err}"),
            None,
        );
        std::future::pending::<()>().await;
    }
}

/// Listen on `source` until it closes or Ctrl-C is pressed
pub async fn run_listener(source: EventSource, machine: MarkCaptureMachine) -> Result<ListenSummary> {
    let (_, summary) = match source {
        EventSource::Stdin => {
            let reader = BufReader::new(tokio::io::stdin());
            listen_until(reader, machine, ctrl_c()).await?
        }
        EventSource::File(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening event source {}", path.display()))?;
            listen_until(BufReader::new(file), machine, ctrl_c()).await?
        }
    };

    if summary.interrupted {
        emit(
            Level::Info,
            "marks.listen.interrupted",
            "Interrupted; stopping mark listener",
            None,
        );
    }
    Ok(summary)
}
