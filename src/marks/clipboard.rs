use std::process::Command;

use crate::common::display_server::DisplayServer;

/// Source of the player's timestamp text
pub trait Clipboard: Send {
    /// Current clipboard text, trimmed; `None` when empty or unreadable
    fn read_text(&mut self) -> Option<String>;
}

/// Clipboard read through `wl-paste` or `xclip`
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    display: DisplayServer,
}

impl SystemClipboard {
    pub fn detect() -> Self {
        Self {
            display: DisplayServer::detect(),
        }
    }

    pub fn display_server(&self) -> DisplayServer {
        self.display
    }
}

impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        let (program, args) = self.display.get_clipboard_command();
        let output = Command::new(program).args(&args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        normalize_clipboard(&String::from_utf8_lossy(&output.stdout))
    }
}

pub fn normalize_clipboard(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
