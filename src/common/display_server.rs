use serde::{Deserialize, Serialize};
use std::env;

/// Display server types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl DisplayServer {
    /// Detect the current display server type from the session environment
    pub fn detect() -> Self {
        let session_type = env::var("XDG_SESSION_TYPE").ok();
        let wayland_display = env::var_os("WAYLAND_DISPLAY").is_some();
        let x_display = env::var_os("DISPLAY").is_some();
        Self::from_env(session_type.as_deref(), wayland_display, x_display)
    }

    fn from_env(session_type: Option<&str>, wayland_display: bool, x_display: bool) -> Self {
        // XDG_SESSION_TYPE is the most reliable signal
        if let Some(session_type) = session_type {
            match session_type.to_lowercase().as_str() {
                "wayland" => return DisplayServer::Wayland,
                "x11" => return DisplayServer::X11,
                _ => {}
            }
        }

        if wayland_display {
            return DisplayServer::Wayland;
        }
        if x_display {
            return DisplayServer::X11;
        }

        DisplayServer::Unknown
    }

    pub fn name(&self) -> &'static str {
        match self {
            DisplayServer::Wayland => "Wayland",
            DisplayServer::X11 => "X11",
            DisplayServer::Unknown => "Unknown",
        }
    }

    /// Command that prints the clipboard text to stdout
    pub fn get_clipboard_command(&self) -> (&'static str, Vec<&'static str>) {
        match self {
            DisplayServer::Wayland => ("wl-paste", vec!["--no-newline"]),
            DisplayServer::X11 => ("xclip", vec!["-selection", "clipboard", "-o"]),
            DisplayServer::Unknown => ("wl-paste", vec!["--no-newline"]), // Default to Wayland
        }
    }
}
