use std::path::PathBuf;
use std::process::{Command, Output};

fn vidcollage(args: &[&str]) -> Output {
    let exe = PathBuf::from(env!("CARGO_BIN_EXE_vidcollage"));
    Command::new(exe).args(args).output().unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

#[test]
fn no_tiles_prints_usage_and_fails() {
    let out = vidcollage(&[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("tile_spec"));
}

#[test]
fn help_exits_with_failure_status() {
    for flag in ["-h", "--help"] {
        let out = vidcollage(&[flag]);
        assert_eq!(out.status.code(), Some(1), "{flag}");
        let text = String::from_utf8_lossy(&out.stdout);
        assert!(text.contains("--codec"), "{flag}: {text}");
    }
}

#[test]
fn unknown_option_fails() {
    let out = vidcollage(&["--bogus", "a.mp4@10x10+0+0"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn malformed_spec_fails_with_diagnostic_and_usage() {
    let out = vidcollage(&["clip.mp4@320x240+10"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("malformed tile spec"), "{err}");
    assert!(err.contains("Usage"), "{err}");
}

#[test]
fn codec_must_be_four_characters() {
    let out = vidcollage(&["-c", "xvi", "a.mp4@10x10+0+0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("FOURCC"));

    let out = vidcollage(&["--codec", "xvidx", "a.mp4@10x10+0+0"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn fps_must_be_positive() {
    for fps in ["0", "-3"] {
        let out = vidcollage(&["-f", fps, "a.mp4@10x10+0+0"]);
        assert_eq!(out.status.code(), Some(1), "fps {fps}");
        assert!(stderr(&out).contains("FPS must be a positive integer"));
    }
    let out = vidcollage(&["--fps", "fast", "a.mp4@10x10+0+0"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unsupported_codec_fails_writer_open() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("never.avi");
    let out_arg = out_path.to_string_lossy().to_string();

    // The missing source degrades to an unpainted tile; the writer is what fails.
    let out = vidcollage(&[
        "-c",
        "ZZZZ",
        "-o",
        out_arg.as_str(),
        "does-not-exist.mp4@16x16+0+0",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("failed to open video writer"));
    assert!(!out_path.exists());
}

#[test]
fn version_succeeds() {
    let out = vidcollage(&["--version"]);
    assert!(out.status.success());
}
