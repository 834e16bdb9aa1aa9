use anyhow::{Context, Result};
use std::ffi::OsString;
use std::process::Command;

use super::planner::{CutExecutor, CutInstruction};

/// Stream-copy cutter backed by the `ffmpeg` binary
#[derive(Debug, Default, Clone)]
pub struct FfmpegCutter;

/// Arguments for a lossless cut: every stream copied, nothing re-encoded
pub fn cut_args(instruction: &CutInstruction) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(instruction.source.clone().into_os_string());
    args.extend(
        [
            "-ss",
            instruction.start_timestamp.as_str(),
            "-to",
            instruction.end_timestamp.as_str(),
            "-c",
            "copy",
            "-map",
            "0",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(instruction.output.clone().into_os_string());
    args
}

/// Human-readable command line, for dry runs and debug output
pub fn display_command(instruction: &CutInstruction) -> String {
    let args: Vec<String> = cut_args(instruction)
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    format!("ffmpeg {}", args.join(" "))
}

impl CutExecutor for FfmpegCutter {
    fn cut(&mut self, instruction: &CutInstruction) -> Result<()> {
        let output = Command::new("ffmpeg")
            .args(cut_args(instruction))
            .output()
            .with_context(|| {
                format!(
                    "Failed to run ffmpeg to cut {}",
                    instruction.source.display()
                )
            })?;

        if !output.status.success() {
            anyhow::bail!(
                "ffmpeg exited with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::align::AlignNote;
    use std::path::PathBuf;

    #[test]
    fn cut_arguments_copy_all_streams() {
        let instruction = CutInstruction {
            sequence_index: 1,
            pair_index: 1,
            source: PathBuf::from("/videos/gig.mkv"),
            output: PathBuf::from("/out/clip_001.mkv"),
            start_sec: 5.0,
            end_sec: 70.5,
            start_timestamp: "00:00:05".to_string(),
            end_timestamp: "00:01:10.500".to_string(),
            note: AlignNote::NotRequested,
        };
        assert_eq!(
            display_command(&instruction),
            "ffmpeg -hide_banner -loglevel error -y -i /videos/gig.mkv -ss 00:00:05 -to 00:01:10.500 -c copy -map 0 /out/clip_001.mkv"
        );
    }
}
