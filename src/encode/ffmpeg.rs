use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fourcc, FrameIndex};
use crate::foundation::error::{CollageError, CollageResult};
use crate::media::ffmpeg::is_ffmpeg_on_path;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output video path; the container follows the extension.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// ffmpeg encoder selected for a FOURCC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderChoice {
    pub encoder: &'static str,
    pub pix_fmt: &'static str,
    /// Chroma-subsampled output needs even frame dimensions.
    pub needs_even_size: bool,
}

/// Map a FOURCC (case-insensitive) to an ffmpeg encoder.
pub fn encoder_for(fourcc: Fourcc) -> Option<EncoderChoice> {
    let (encoder, pix_fmt, needs_even_size) = match &fourcc.canonical() {
        b"XVID" | b"DIVX" | b"DX50" | b"FMP4" | b"MP4V" => ("mpeg4", "yuv420p", true),
        b"MJPG" => ("mjpeg", "yuvj420p", true),
        b"H264" | b"X264" | b"AVC1" => ("libx264", "yuv420p", true),
        b"HEVC" | b"H265" | b"HVC1" => ("libx265", "yuv420p", true),
        b"VP80" => ("libvpx", "yuv420p", true),
        b"VP90" => ("libvpx-vp9", "yuv420p", true),
        b"FFV1" => ("ffv1", "bgr0", false),
        b"I420" | b"IYUV" => ("rawvideo", "yuv420p", true),
        b"PNG " => ("png", "rgb24", false),
        _ => return None,
    };
    Some(EncoderChoice {
        encoder,
        pix_fmt,
        needs_even_size,
    })
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB24 canvases to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }

    fn wait_child(&mut self) -> CollageResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| CollageError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CollageError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| CollageError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(CollageError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> CollageResult<()> {
        if cfg.size.is_empty() {
            return Err(CollageError::writer_open(format!(
                "output size {} must be non-zero",
                cfg.size
            )));
        }
        let choice = encoder_for(cfg.codec).ok_or_else(|| {
            CollageError::writer_open(format!("unsupported codec '{}'", cfg.codec))
        })?;
        if choice.needs_even_size
            && (!cfg.size.width.is_multiple_of(2) || !cfg.size.height.is_multiple_of(2))
        {
            return Err(CollageError::writer_open(format!(
                "codec '{}' needs even output dimensions, canvas is {}",
                cfg.codec, cfg.size
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(CollageError::writer_open(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(CollageError::writer_open(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &cfg.size.to_string(),
            "-r",
            &cfg.fps.get().to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            choice.encoder,
            "-pix_fmt",
            choice.pix_fmt,
        ]);
        if wants_codec_tag(&self.opts.out_path) {
            cmd.args(["-vtag", cfg.codec.as_str()]);
        }
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            CollageError::writer_open(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CollageError::writer_open("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CollageError::writer_open("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            out = %self.opts.out_path.display(),
            encoder = choice.encoder,
            size = %cfg.size,
            fps = cfg.fps.get(),
            "spawned ffmpeg encoder"
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> CollageResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CollageError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(CollageError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width() != cfg.size.width || frame.height() != cfg.size.height {
            return Err(CollageError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}",
                frame.width(),
                frame.height(),
                cfg.size
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CollageError::encode("ffmpeg sink is already finalized"));
        };
        stdin.write_all(frame.as_raw()).map_err(|e| {
            CollageError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> CollageResult<()> {
        if self.child.is_none() {
            return Err(CollageError::encode("ffmpeg sink not started"));
        }
        self.wait_child()?;
        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Closing stdin lets ffmpeg finalize whatever was written before an aborted run.
        if let Err(e) = self.wait_child() {
            tracing::warn!("ffmpeg encoder did not shut down cleanly: {e}");
        }
    }
}

/// AVI-style containers carry the FOURCC as the stream tag.
fn wants_codec_tag(out_path: &Path) -> bool {
    out_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avi"))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CollageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            CollageError::writer_open(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}
