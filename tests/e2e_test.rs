mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use utils::{path_arg, run_markcut_command};

const TWO_PAIRS: &str = "00:00:05, start\n00:01:10, end\n00:02:00, start\n00:02:30, end\n";

#[test]
fn test_check_reports_segments() -> Result<()> {
    let env = TestEnvironment::new()?;
    let marks = env.write_file("gig.marks", TWO_PAIRS)?;

    let output = run_markcut_command(&env, &["clips", "check", "--marks", &path_arg(&marks)])?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);
    assert!(output.stdout.contains("is a valid marks file"));
    assert!(output.stdout.contains("Pair #2 (lines 3-4): 00:02:00 → 00:02:30"));
    assert!(output.stdout.contains("2 segment(s), 0 skipped"));
    Ok(())
}

#[test]
fn test_check_rejects_unpaired_and_out_of_order() -> Result<()> {
    let env = TestEnvironment::new()?;

    let odd = env.write_file("odd.marks", "00:00:05, start\n00:01:10, end\n00:02:00, start\n")?;
    let output = run_markcut_command(&env, &["clips", "check", "--marks", &path_arg(&odd)])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("found 3 entries"), "stderr: {}", output.stderr);

    let swapped = env.write_file("swapped.marks", "1, start\n2, end\n\n4, end\n3, start\n")?;
    let output = run_markcut_command(&env, &["clips", "check", "--marks", &path_arg(&swapped)])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("pair #2 (lines 4 and 5)"), "stderr: {}", output.stderr);
    Ok(())
}

#[test]
fn test_unknown_policy_flag() -> Result<()> {
    let env = TestEnvironment::new()?;
    let marks = env.write_file(
        "talk.marks",
        "UNKNOWN, start\n00:00:10, end\n00:00:20, start\n00:00:30, end\n",
    )?;

    let rejected = run_markcut_command(&env, &["clips", "check", "--marks", &path_arg(&marks)])?;
    assert_eq!(rejected.exit_code, 1);
    assert!(rejected.stderr.contains("UNKNOWN timestamp"));

    let skipped = run_markcut_command(
        &env,
        &["clips", "check", "--marks", &path_arg(&marks), "--unknown", "skip"],
    )?;
    assert_eq!(skipped.exit_code, 0, "skip failed: {}", skipped.stderr);
    assert!(skipped.stderr.contains("Skipping pair #1 (lines 1-2)"));
    assert!(skipped.stdout.contains("1 segment(s), 1 skipped"));
    Ok(())
}

#[test]
fn test_cut_dry_run_plans_without_writing() -> Result<()> {
    let env = TestEnvironment::new()?;
    let video = env.write_file("gig.mkv", "not really a video")?;
    let marks = env.write_file("gig.marks", TWO_PAIRS)?;
    let out_dir = env.path().join("clips");

    let output = run_markcut_command(
        &env,
        &[
            "clips",
            "cut",
            "--video",
            &path_arg(&video),
            "--marks",
            &path_arg(&marks),
            "--out-dir",
            &path_arg(&out_dir),
            "--align-mode",
            "none",
            "--dry-run",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "dry run failed: {}", output.stderr);
    assert!(output.stdout.contains("-ss 00:00:05 -to 00:01:10 -c copy -map 0"));
    assert!(output.stdout.contains("clip_002.mkv"));
    assert!(output.stdout.contains("no alignment requested"));
    assert!(output.stdout.contains("2 clip(s) planned"));
    assert!(!out_dir.exists());
    Ok(())
}

#[test]
fn test_cut_applies_adjustments() -> Result<()> {
    let env = TestEnvironment::new()?;
    let video = env.write_file("gig.mp4", "")?;
    let marks = env.write_file("gig.marks", TWO_PAIRS)?;

    let output = run_markcut_command(
        &env,
        &[
            "clips",
            "cut",
            "--video",
            &path_arg(&video),
            "--marks",
            &path_arg(&marks),
            "--align-mode",
            "none",
            "--adjust",
            "2:end:-0.5",
            "--dry-run",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "dry run failed: {}", output.stderr);
    assert!(output.stdout.contains("-ss 00:02:00 -to 00:02:29.500"));
    assert!(output.stdout.contains("manually adjusted"));
    Ok(())
}

#[test]
fn test_cut_rejects_bad_inputs() -> Result<()> {
    let env = TestEnvironment::new()?;
    let video = env.write_file("gig.mkv", "")?;
    let marks = env.write_file("gig.marks", TWO_PAIRS)?;

    let bad_mode = run_markcut_command(
        &env,
        &[
            "clips",
            "cut",
            "--video",
            &path_arg(&video),
            "--marks",
            &path_arg(&marks),
            "--align-mode",
            "scene",
            "--dry-run",
        ],
    )?;
    assert_eq!(bad_mode.exit_code, 1);
    assert!(bad_mode.stderr.contains("unsupported alignment mode 'scene'"));

    let missing = env.path().join("missing.mkv");
    let no_video = run_markcut_command(
        &env,
        &[
            "clips",
            "cut",
            "--video",
            &path_arg(&missing),
            "--marks",
            &path_arg(&marks),
            "--dry-run",
        ],
    )?;
    assert_eq!(no_video.exit_code, 1);
    assert!(no_video.stderr.contains("video file not found"));
    Ok(())
}

#[test]
fn test_cut_with_only_unknown_pairs_is_a_no_op() -> Result<()> {
    let env = TestEnvironment::new()?;
    let video = env.write_file("gig.mkv", "")?;
    let marks = env.write_file("gig.marks", "UNKNOWN, start\nUNKNOWN, end\n")?;

    let output = run_markcut_command(
        &env,
        &[
            "clips",
            "cut",
            "--video",
            &path_arg(&video),
            "--marks",
            &path_arg(&marks),
            "--unknown",
            "skip",
            "--dry-run",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);
    assert!(output.stderr.contains("Nothing to do"));
    Ok(())
}

#[test]
fn test_json_output_is_one_event_per_line() -> Result<()> {
    let env = TestEnvironment::new()?;
    let marks = env.write_file("gig.marks", TWO_PAIRS)?;

    let output = run_markcut_command(
        &env,
        &["--output", "json", "clips", "check", "--marks", &path_arg(&marks)],
    )?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);

    let events: Vec<serde_json::Value> = output
        .stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    let summary = events
        .iter()
        .find(|event| event["code"] == "clips.check.summary")
        .expect("summary event");
    assert_eq!(summary["data"]["segments"], 2);
    assert_eq!(summary["level"], "info");
    Ok(())
}

#[test]
fn test_marks_show_and_path() -> Result<()> {
    let env = TestEnvironment::new()?;
    std::fs::write(
        env.marks_dir().join("gig.marks"),
        "00:00:05, start\n00:01:10, end\n00:02:00, start\n",
    )?;

    let show = run_markcut_command(&env, &["marks", "show", "gig"])?;
    assert_eq!(show.exit_code, 0, "show failed: {}", show.stderr);
    assert!(show.stdout.contains("3 mark(s), awaiting end"));

    let path = run_markcut_command(&env, &["marks", "path", "/videos/gig.mkv - mpv"])?;
    assert_eq!(path.exit_code, 0, "path failed: {}", path.stderr);
    assert_eq!(
        path.stdout.trim(),
        env.marks_dir().join("gig.marks").display().to_string()
    );

    let missing = run_markcut_command(&env, &["marks", "show", "nothing-here"])?;
    assert_eq!(missing.exit_code, 1);
    Ok(())
}

#[test]
fn test_missing_config_is_created_with_documentation() -> Result<()> {
    let env = TestEnvironment::new()?;
    std::fs::remove_file(env.config_path())?;
    let marks = env.write_file("gig.marks", TWO_PAIRS)?;

    let output = run_markcut_command(&env, &["clips", "check", "--marks", &path_arg(&marks)])?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);

    let written = std::fs::read_to_string(env.config_path())?;
    assert!(written.contains("trigger_button = \"middle\"  # "));
    assert!(written.contains("unknown_policy = \"reject\""));
    Ok(())
}

#[test]
fn test_completions_generate() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = run_markcut_command(&env, &["completions", "generate", "bash"])?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("_markcut"));
    Ok(())
}
