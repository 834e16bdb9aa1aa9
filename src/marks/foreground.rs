use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::process::Command;

/// The focused window as reported by the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundWindow {
    pub id: String,
    pub title: String,
    /// Window class (X11) or app id (Wayland)
    pub class: String,
}

impl ForegroundWindow {
    /// Case-insensitive substring match against the configured player marker
    pub fn matches_target(&self, marker: &str) -> bool {
        !marker.is_empty() && self.class.to_lowercase().contains(&marker.to_lowercase())
    }
}

pub trait ForegroundProbe: Send {
    /// `Ok(None)` when nothing is focused
    fn foreground(&mut self) -> Result<Option<ForegroundWindow>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorKind {
    Hyprland,
    Sway,
    X11,
}

impl CompositorKind {
    pub fn detect() -> Option<Self> {
        if env::var_os("HYPRLAND_INSTANCE_SIGNATURE").is_some() {
            return Some(CompositorKind::Hyprland);
        }
        if env::var_os("SWAYSOCK").is_some() {
            return Some(CompositorKind::Sway);
        }
        for var in ["XDG_SESSION_DESKTOP", "XDG_CURRENT_DESKTOP", "DESKTOP_SESSION"] {
            if let Ok(value) = env::var(var) {
                match value.to_lowercase().as_str() {
                    "hyprland" => return Some(CompositorKind::Hyprland),
                    "sway" => return Some(CompositorKind::Sway),
                    _ => {}
                }
            }
        }
        if env::var_os("DISPLAY").is_some() {
            return Some(CompositorKind::X11);
        }
        None
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompositorKind::Hyprland => "Hyprland",
            CompositorKind::Sway => "Sway",
            CompositorKind::X11 => "X11",
        }
    }
}

/// Foreground lookup through the compositor's command line tools
#[derive(Debug, Clone)]
pub struct CompositorProbe {
    kind: CompositorKind,
}

impl CompositorProbe {
    pub fn new(kind: CompositorKind) -> Self {
        Self { kind }
    }

    pub fn detect() -> Result<Self> {
        let kind = CompositorKind::detect()
            .context("No supported compositor detected (need Hyprland, Sway or an X11 session)")?;
        Ok(Self::new(kind))
    }

    pub fn kind(&self) -> CompositorKind {
        self.kind
    }
}

impl ForegroundProbe for CompositorProbe {
    fn foreground(&mut self) -> Result<Option<ForegroundWindow>> {
        match self.kind {
            CompositorKind::Hyprland => {
                let output = run_tool("hyprctl", &["activewindow", "-j"])?;
                parse_hyprland_active_window(&output)
            }
            CompositorKind::Sway => {
                let output = run_tool("swaymsg", &["-t", "get_tree"])?;
                find_sway_focused(&output)
            }
            CompositorKind::X11 => x11_foreground(),
        }
    }
}

fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute {program} {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{program} {} failed: {}", args.join(" "), stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Debug, Deserialize)]
struct HyprlandActiveWindow {
    #[serde(default)]
    address: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    title: String,
}

/// Parse `hyprctl activewindow -j`; an empty object means nothing is focused
pub fn parse_hyprland_active_window(json: &str) -> Result<Option<ForegroundWindow>> {
    let window: HyprlandActiveWindow =
        serde_json::from_str(json).context("Failed to parse hyprctl activewindow JSON output")?;
    if window.address.is_empty() {
        return Ok(None);
    }
    Ok(Some(ForegroundWindow {
        id: window.address,
        title: window.title,
        class: window.class,
    }))
}

/// Find the focused node in `swaymsg -t get_tree` output
pub fn find_sway_focused(json: &str) -> Result<Option<ForegroundWindow>> {
    let tree: Value = serde_json::from_str(json).context("Failed to parse swaymsg tree JSON")?;
    Ok(find_focused_node(&tree).map(|node| {
        let class = node
            .get("app_id")
            .and_then(Value::as_str)
            .or_else(|| {
                node.get("window_properties")
                    .and_then(|props| props.get("class"))
                    .and_then(Value::as_str)
            })
            .unwrap_or_default()
            .to_string();
        ForegroundWindow {
            id: node.get("id").map(|id| id.to_string()).unwrap_or_default(),
            title: node
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            class,
        }
    }))
}

fn find_focused_node(node: &Value) -> Option<&Value> {
    let is_window = node.get("pid").is_some();
    if is_window && node.get("focused").and_then(Value::as_bool) == Some(true) {
        return Some(node);
    }
    ["nodes", "floating_nodes"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_array))
        .flatten()
        .find_map(find_focused_node)
}

fn x11_foreground() -> Result<Option<ForegroundWindow>> {
    let id = match run_tool("xdotool", &["getactivewindow"]) {
        Ok(id) => id.trim().to_string(),
        // xdotool exits non-zero when no window has focus
        Err(_) => return Ok(None),
    };
    if id.is_empty() {
        return Ok(None);
    }
    let title = run_tool("xdotool", &["getwindowname", &id])?
        .trim()
        .to_string();
    let class_output = run_tool("xprop", &["-id", &id, "WM_CLASS"])?;
    Ok(Some(ForegroundWindow {
        id,
        title,
        class: parse_xprop_class(&class_output),
    }))
}

/// `WM_CLASS(STRING) = "instance", "Class"` → `instance Class`
pub fn parse_xprop_class(output: &str) -> String {
    let Some((_, values)) = output.split_once('=') else {
        return String::new();
    };
    values
        .split(',')
        .map(|part| part.trim().trim_matches('"'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
