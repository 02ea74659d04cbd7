//! Decoding through the system `ffprobe`/`ffmpeg` binaries.
//!
//! Each source is probed once with `ffprobe`, then decoded by one long-lived `ffmpeg` process
//! that streams packed RGB24 frames on stdout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;

use crate::foundation::core::CanvasSize;
use crate::foundation::error::{CollageError, CollageResult};
use crate::media::source::{FrameSource, SourceProvider};

/// Stream facts reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub size: CanvasSize,
    pub frame_count: u64,
}

/// Probe the first video stream of `source_path`.
pub fn probe_video(source_path: &Path) -> CollageResult<VideoSourceInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-count_packets",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,nb_frames,nb_read_packets",
            "-of",
            "json",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| CollageError::source(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CollageError::source(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(source_path, &out.stdout)
}

fn parse_probe_json(source_path: &Path, json: &[u8]) -> CollageResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        width: Option<u32>,
        height: Option<u32>,
        nb_frames: Option<String>,
        nb_read_packets: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| CollageError::source(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed.streams.first().ok_or_else(|| {
        CollageError::source(format!(
            "no video stream found in '{}'",
            source_path.display()
        ))
    })?;

    let size = CanvasSize {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    };
    if size.is_empty() {
        return Err(CollageError::source(format!(
            "'{}' reports an empty frame size {size}",
            source_path.display()
        )));
    }

    let count = |s: &Option<String>| s.as_deref().and_then(|v| v.trim().parse::<u64>().ok());
    let frame_count = count(&stream.nb_frames)
        .filter(|&n| n > 0)
        .or_else(|| count(&stream.nb_read_packets))
        .unwrap_or(0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        size,
        frame_count,
    })
}

/// [`SourceProvider`] backed by `ffprobe` + `ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegProvider;

impl SourceProvider for FfmpegProvider {
    fn open(&self, path: &Path) -> CollageResult<Box<dyn FrameSource>> {
        let info = probe_video(path)?;
        tracing::debug!(
            path = %path.display(),
            size = %info.size,
            frames = info.frame_count,
            "probed source"
        );
        Ok(Box::new(FfmpegSource::new(info)))
    }
}

/// One `ffmpeg` decoder process, spawned on the first read.
pub struct FfmpegSource {
    info: VideoSourceInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    finished: bool,
}

impl FfmpegSource {
    pub fn new(info: VideoSourceInfo) -> Self {
        Self {
            info,
            child: None,
            stdout: None,
            stderr_drain: None,
            finished: false,
        }
    }

    fn spawn(&mut self) -> CollageResult<()> {
        let mut child = decoder_command(&self.info.source_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CollageError::source(format!(
                    "failed to spawn ffmpeg decoder for '{}': {e}",
                    self.info.source_path.display()
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CollageError::source("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CollageError::source("failed to open ffmpeg stderr (unexpected)"))?;
        self.stderr_drain = Some(std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        }));
        self.stdout = Some(stdout);
        self.child = Some(child);
        Ok(())
    }

    /// Reap the decoder after end of stream and surface a non-zero exit.
    fn finish(&mut self) -> CollageResult<()> {
        self.finished = true;
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| {
            CollageError::source(format!("failed to wait for ffmpeg decoder: {e}"))
        })?;
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();
        if !status.success() {
            return Err(CollageError::source(format!(
                "ffmpeg decoder for '{}' exited with status {status}: {}",
                self.info.source_path.display(),
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> u64 {
        self.info.frame_count
    }

    fn read_next_frame(&mut self) -> CollageResult<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }
        if self.child.is_none() {
            self.spawn()?;
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.info.size.rgb24_len()];
        let filled = read_full(stdout, &mut buf).map_err(|e| {
            CollageError::source(format!(
                "failed to read frame from '{}': {e}",
                self.info.source_path.display()
            ))
        })?;

        if filled < buf.len() {
            if filled > 0 {
                tracing::warn!(
                    path = %self.info.source_path.display(),
                    got = filled,
                    expected = buf.len(),
                    "discarding truncated trailing frame"
                );
            }
            self.finish()?;
            return Ok(None);
        }

        RgbImage::from_raw(self.info.size.width, self.info.size.height, buf)
            .map(Some)
            .ok_or_else(|| CollageError::source("decoded frame buffer has the wrong size"))
    }

    fn release(&mut self) {
        self.finished = true;
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Decoder invocation for `source_path`.
///
/// Autorotation is disabled so frames keep the coded size that `ffprobe` reports; a rotated
/// stream would otherwise arrive transposed with the same byte count.
fn decoder_command(source_path: &Path) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
        .arg(source_path)
        .args([
            "-map",
            "0:v:0",
            "-an",
            "-vsync",
            "passthrough",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "pipe:1",
        ]);
    cmd
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Return `true` when both `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}
