use std::path::Path;
use std::process::Command;

use super::align::Keyframes;
use crate::ui::prelude::*;

/// Keyframe timestamps of the first video stream.
///
/// Any failure (ffprobe missing, non-zero exit, unusable output) yields an
/// empty list; callers treat that as "no keyframe data".
pub fn extract_keyframes(video: &Path) -> Keyframes {
    if which::which("ffprobe").is_err() {
        emit(
            Level::Warn,
            "clips.keyframes.no_ffprobe",
            "ffprobe not found in PATH; cutting at the marked timestamps",
            None,
        );
        return Keyframes::default();
    }

    let output = match Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-skip_frame",
            "nokey",
            "-show_entries",
            "frame=pts_time",
            "-of",
            "csv=p=0",
        ])
        .arg(video)
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            emit(
                Level::Warn,
                "clips.keyframes.failed",
                &format!("Failed to run ffprobe for {}: {err}", video.display()),
                None,
            );
            return Keyframes::default();
        }
    };

    if !output.status.success() {
        emit(
            Level::Warn,
            "clips.keyframes.failed",
            &format!(
                "ffprobe failed for {}: {}",
                video.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            None,
        );
        return Keyframes::default();
    }

    let keyframes = parse_keyframe_output(&String::from_utf8_lossy(&output.stdout));
    emit(
        Level::Debug,
        "clips.keyframes.extracted",
        &format!("Found {} keyframe(s) in {}", keyframes.len(), video.display()),
        None,
    );
    keyframes
}

/// One value per line; anything that is not a number is skipped
pub fn parse_keyframe_output(stdout: &str) -> Keyframes {
    let times = stdout
        .lines()
        .filter_map(|line| {
            // csv output can carry a trailing separator when a field is empty
            let value = line.trim().trim_end_matches(',');
            value.parse::<f64>().ok()
        })
        .collect();
    Keyframes::new(times)
}
