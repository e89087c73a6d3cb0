use std::path::Path;
use std::process::{Command, Stdio};

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::{WaterfallError, WaterfallResult};

/// Extract an optimized 256-color palette from `video` into `palette` (a PNG).
pub fn generate_palette(video: &Path, palette: &Path) -> WaterfallResult<()> {
    let mut cmd = ffmpeg_base();
    cmd.arg("-i")
        .arg(video)
        .args(["-vf", "palettegen"])
        .arg(palette);
    run("palettegen", cmd)
}

/// Re-encode `video` as an animated GIF at `out`, constrained to `palette`.
pub fn apply_palette(video: &Path, palette: &Path, out: &Path) -> WaterfallResult<()> {
    ensure_parent_dir(out)?;
    let mut cmd = ffmpeg_base();
    cmd.arg("-i")
        .arg(video)
        .arg("-i")
        .arg(palette)
        .args(["-filter_complex", "paletteuse"])
        .arg(out);
    run("paletteuse", cmd)
}

fn ffmpeg_base() -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .args(["-hide_banner", "-loglevel", "error", "-y"]);
    cmd
}

fn run(pass: &str, mut cmd: Command) -> WaterfallResult<()> {
    tracing::debug!(pass, "running ffmpeg pass");
    let output = cmd.output().map_err(|e| {
        WaterfallError::encode(format!(
            "failed to spawn ffmpeg for {pass} (is it installed and on PATH?): {e}"
        ))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WaterfallError::encode(format!(
            "ffmpeg {pass} exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::ffmpeg::is_ffmpeg_on_path;

    #[test]
    fn missing_video_reports_failing_pass() {
        if !is_ffmpeg_on_path() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let err = generate_palette(&dir.path().join("nope.mp4"), &dir.path().join("p.png"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("palettegen"), "{err}");
    }
}
