use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig, check_frame};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{WaterfallError, WaterfallResult};
use crate::raster::buffer::PixelBuffer;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Intermediate video path (mp4 container).
    pub out_path: PathBuf,
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

/// Streams raw RGBA8 frames into a system `ffmpeg` producing an h264 video.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

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
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> WaterfallResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(WaterfallError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(WaterfallError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(WaterfallError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&self.opts.out_path);

        tracing::debug!(out = %self.opts.out_path.display(), "spawning ffmpeg video encoder");
        let mut child = cmd.spawn().map_err(|e| {
            WaterfallError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WaterfallError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| WaterfallError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &PixelBuffer) -> WaterfallResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| WaterfallError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(WaterfallError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        check_frame(cfg, frame)?;
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(WaterfallError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_bytes()).map_err(|e| {
            WaterfallError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> WaterfallResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| WaterfallError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            WaterfallError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| WaterfallError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| WaterfallError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(WaterfallError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    // A sink dropped mid-stream still owns a running ffmpeg; close its input and reap it so
    // the intermediate file is released before cleanup.
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> WaterfallResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Fps;

    fn cfg(width: u32, height: u32) -> SinkConfig {
        SinkConfig {
            width,
            height,
            fps: Fps::new(30, 1).unwrap(),
        }
    }

    #[test]
    fn begin_rejects_odd_and_empty_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.path().join("v.mp4")));
        assert!(sink.begin(cfg(0, 10)).is_err());
        assert!(sink.begin(cfg(11, 10)).is_err());
        assert!(sink.begin(cfg(10, 9)).is_err());
    }

    #[test]
    fn begin_refuses_existing_output_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("v.mp4");
        std::fs::write(&out, b"x").unwrap();
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            out_path: out,
            overwrite: false,
        });
        let err = sink.begin(cfg(10, 10)).unwrap_err().to_string();
        assert!(err.contains("already exists"), "{err}");
    }

    #[test]
    fn push_and_end_before_begin_fail() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
        let frame = PixelBuffer::new(2, 2).unwrap();
        assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
        assert!(sink.end().is_err());
    }

    #[test]
    fn ensure_parent_dir_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a").join("b").join("out.gif");
        ensure_parent_dir(&out).unwrap();
        assert!(out.parent().unwrap().is_dir());
        ensure_parent_dir(Path::new("bare.gif")).unwrap();
    }
}
