use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path},
    encode::palette::{apply_palette, generate_palette},
    encode::sink::{FrameSink, SinkConfig},
    foundation::core::FrameIndex,
    foundation::error::{WaterfallError, WaterfallResult},
    raster::buffer::PixelBuffer,
    raster::resample::fit_canvas,
    render::composite::composite,
    settings::RenderSettings,
    sim::particle::FloatingImage,
    sim::spawn::Spawner,
};

/// Counters reported after a render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub lead_in_frames: u64,
    pub waterfall_frames: u64,
    pub particles_spawned: u64,
    /// Seed actually used, after resolving `seed = 0`.
    pub seed: u64,
}

/// Frames between `info`-level progress lines.
const PROGRESS_EVERY: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    LeadIn { emitted: u32 },
    Waterfall { tick: u32 },
    Done,
}

/// Frame-by-frame waterfall simulation.
///
/// Frames come out in three strictly sequential phases:
/// 1. `delay` copies of the fitted canvas.
/// 2. `waterfall_frames` ticks; each tick spawns particles (while `tick < img_gen_frames`),
///    steps every live particle and composites all of them, in spawn order, onto a copy of
///    the canvas.
/// 3. Done: no more frames.
///
/// Particles are never removed; once their opacity and scale have clamped they keep
/// falling at steady state.
pub struct WaterfallRenderer<'a> {
    settings: &'a RenderSettings,
    base: &'a PixelBuffer,
    canvas: PixelBuffer,
    frame: PixelBuffer,
    particles: Vec<FloatingImage>,
    spawner: Spawner,
    phase: Phase,
    next_idx: u64,
    stats: RenderStats,
}

impl<'a> WaterfallRenderer<'a> {
    /// Validate `settings` and fit `base` into the output bounds.
    pub fn new(settings: &'a RenderSettings, base: &'a PixelBuffer) -> WaterfallResult<Self> {
        settings.validate()?;
        let canvas = fit_canvas(base, settings.max_width, settings.max_height)?;
        let frame = canvas.clone();
        let seed = Spawner::resolve_seed(settings.seed);
        tracing::info!(
            seed,
            width = canvas.width(),
            height = canvas.height(),
            "prepared waterfall canvas"
        );

        Ok(Self {
            settings,
            base,
            canvas,
            frame,
            particles: Vec::new(),
            spawner: Spawner::new(seed),
            phase: Phase::LeadIn { emitted: 0 },
            next_idx: 0,
            stats: RenderStats {
                seed,
                ..RenderStats::default()
            },
        })
    }

    /// The fitted base image every frame starts from.
    pub fn canvas(&self) -> &PixelBuffer {
        &self.canvas
    }

    pub fn particles(&self) -> &[FloatingImage] {
        &self.particles
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn sink_config(&self) -> WaterfallResult<SinkConfig> {
        Ok(SinkConfig {
            width: self.canvas.width(),
            height: self.canvas.height(),
            fps: self.settings.fps()?,
        })
    }

    /// Produce the next frame, or `None` once every frame has been emitted.
    pub fn next_frame(&mut self) -> WaterfallResult<Option<(FrameIndex, &PixelBuffer)>> {
        self.settle_phase();
        let idx = FrameIndex(self.next_idx);
        match self.phase {
            Phase::LeadIn { emitted } => {
                self.phase = Phase::LeadIn {
                    emitted: emitted + 1,
                };
                self.next_idx += 1;
                self.stats.frames_total += 1;
                self.stats.lead_in_frames += 1;
                Ok(Some((idx, &self.canvas)))
            }
            Phase::Waterfall { tick } => {
                self.advance_tick(tick)?;
                self.phase = Phase::Waterfall { tick: tick + 1 };
                self.next_idx += 1;
                self.stats.frames_total += 1;
                self.stats.waterfall_frames += 1;
                Ok(Some((idx, &self.frame)))
            }
            Phase::Done => Ok(None),
        }
    }

    /// Stream every frame into `sink`, bracketed by `begin`/`end`.
    pub fn render(&mut self, sink: &mut dyn FrameSink) -> WaterfallResult<RenderStats> {
        let cfg = self.sink_config()?;
        let total = self.settings.total_frames();
        sink.begin(cfg)?;
        while let Some((idx, frame)) = self.next_frame()? {
            sink.push_frame(idx, frame)?;
            let done = idx.0 + 1;
            if is_progress_frame(done, total) {
                tracing::info!(frame = done, total, particles = self.particles.len(), "rendering");
            } else {
                tracing::debug!(frame = done, total, "emitted frame");
            }
        }
        sink.end()?;
        Ok(self.stats)
    }

    fn settle_phase(&mut self) {
        if let Phase::LeadIn { emitted } = self.phase
            && emitted >= self.settings.delay
        {
            tracing::info!(
                frames = self.settings.waterfall_frames,
                "starting waterfall"
            );
            self.phase = Phase::Waterfall { tick: 0 };
        }
        if let Phase::Waterfall { tick } = self.phase
            && tick >= self.settings.waterfall_frames
        {
            tracing::info!(particles = self.particles.len(), "all frames rendered");
            self.phase = Phase::Done;
        }
    }

    fn advance_tick(&mut self, tick: u32) -> WaterfallResult<()> {
        self.frame.copy_from(&self.canvas)?;

        if tick < self.settings.img_gen_frames {
            let count = self.spawner.spawn_count(self.settings);
            for _ in 0..count {
                self.particles.push(self.spawner.spawn(self.settings));
            }
            self.stats.particles_spawned += u64::from(count);
        }

        for p in &mut self.particles {
            p.step(self.settings.gravity);
        }
        for p in &self.particles {
            composite(&mut self.frame, self.base, p, self.settings.scale_multiplier);
        }
        Ok(())
    }
}

fn is_progress_frame(done: u64, total: u64) -> bool {
    done.is_multiple_of(PROGRESS_EVERY) || done == total
}

/// Options for [`render_to_gif`].
#[derive(Clone, Debug, Default)]
pub struct RenderToGifOpts {
    /// Directory for the intermediate video and palette. Defaults to the system temp dir.
    pub work_dir: Option<PathBuf>,
}

/// Render `base` as a waterfall GIF at `out_path`.
///
/// Frames are streamed into a system `ffmpeg` producing an intermediate h264 video, which is
/// then turned into a GIF with a `palettegen` + `paletteuse` pass pair. The intermediate video
/// and palette are removed on every return path, including errors.
#[tracing::instrument(skip_all, fields(out = %out_path.display()))]
pub fn render_to_gif(
    settings: &RenderSettings,
    base: &PixelBuffer,
    out_path: &Path,
    opts: &RenderToGifOpts,
) -> WaterfallResult<RenderStats> {
    let mut renderer = WaterfallRenderer::new(settings, base)?;
    if !is_ffmpeg_on_path() {
        return Err(WaterfallError::encode(
            "ffmpeg is required for GIF rendering, but was not found on PATH",
        ));
    }

    let work_dir = opts.work_dir.clone().unwrap_or_else(std::env::temp_dir);
    let intermediates = Intermediates::new(&work_dir)?;

    let fps = settings.fps()?;
    tracing::info!(
        frames = settings.total_frames(),
        fps = fps.as_f64(),
        secs = fps.frames_to_secs(settings.total_frames()),
        "rendering"
    );
    let stats = {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&intermediates.video));
        renderer.render(&mut sink)?
    };

    tracing::info!("generating palette");
    generate_palette(&intermediates.video, &intermediates.palette)?;
    tracing::info!("generating gif");
    apply_palette(&intermediates.video, &intermediates.palette, out_path)?;

    tracing::info!("cleaning up");
    drop(intermediates);
    Ok(stats)
}

/// Intermediate video + palette paths, deleted on drop.
struct Intermediates {
    video: PathBuf,
    palette: PathBuf,
}

impl Intermediates {
    fn new(work_dir: &Path) -> WaterfallResult<Self> {
        std::fs::create_dir_all(work_dir)
            .with_context(|| format!("create work dir '{}'", work_dir.display()))?;
        let stem = format!(
            "waterfall_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        );
        Ok(Self {
            video: work_dir.join(format!("{stem}.mp4")),
            palette: work_dir.join(format!("{stem}.png")),
        })
    }
}

impl Drop for Intermediates {
    fn drop(&mut self) {
        for path in [&self.video, &self.palette] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to remove intermediate: {e}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::sink::InMemorySink;
    use crate::foundation::core::Rgba8;

    fn base() -> PixelBuffer {
        let mut buf = PixelBuffer::new(16, 8).unwrap();
        for y in 0..8 {
            for x in 0..16 {
                buf.set(x, y, Rgba8::opaque((x * 16) as u8, (y * 32) as u8, 90));
            }
        }
        buf
    }

    fn small_settings() -> RenderSettings {
        RenderSettings {
            delay: 2,
            waterfall_frames: 3,
            img_gen_frames: 2,
            max_width: 8,
            max_height: 8,
            seed: 5,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn new_rejects_invalid_settings() {
        let settings = RenderSettings {
            framerate: 0,
            ..small_settings()
        };
        let base = base();
        assert!(WaterfallRenderer::new(&settings, &base).is_err());
    }

    #[test]
    fn lead_in_frames_are_the_fitted_canvas() {
        let settings = small_settings();
        let base = base();
        let mut r = WaterfallRenderer::new(&settings, &base).unwrap();
        assert_eq!((r.canvas().width(), r.canvas().height()), (8, 4));
        let canvas = r.canvas().clone();

        for expected in 0..2 {
            let (idx, frame) = r.next_frame().unwrap().unwrap();
            assert_eq!(idx, FrameIndex(expected));
            assert_eq!(frame, &canvas);
        }
        assert!(r.particles().is_empty());

        let (idx, _) = r.next_frame().unwrap().unwrap();
        assert_eq!(idx, FrameIndex(2));
        assert!(!r.particles().is_empty());
    }

    #[test]
    fn next_frame_stops_after_all_phases() {
        let settings = small_settings();
        let base = base();
        let mut r = WaterfallRenderer::new(&settings, &base).unwrap();
        let mut n = 0;
        while r.next_frame().unwrap().is_some() {
            n += 1;
        }
        assert_eq!(n, 5);
        assert!(r.next_frame().unwrap().is_none());
        let stats = r.stats();
        assert_eq!(stats.frames_total, 5);
        assert_eq!(stats.lead_in_frames, 2);
        assert_eq!(stats.waterfall_frames, 3);
        assert_eq!(stats.seed, 5);
    }

    #[test]
    fn zero_delay_starts_with_waterfall() {
        let settings = RenderSettings {
            delay: 0,
            ..small_settings()
        };
        let base = base();
        let mut r = WaterfallRenderer::new(&settings, &base).unwrap();
        let _ = r.next_frame().unwrap().unwrap();
        assert!(!r.particles().is_empty());
    }

    #[test]
    fn render_brackets_sink() {
        let settings = small_settings();
        let base = base();
        let mut r = WaterfallRenderer::new(&settings, &base).unwrap();
        let mut sink = InMemorySink::new();
        let stats = r.render(&mut sink).unwrap();
        assert!(sink.is_finished());
        assert_eq!(sink.frames().len() as u64, stats.frames_total);
        let cfg = sink.config().unwrap();
        assert_eq!((cfg.width, cfg.height, cfg.fps.num), (8, 4, 30));
    }

    #[test]
    fn progress_is_reported_every_ten_frames_and_at_the_end() {
        let reported: Vec<u64> = (1..=25).filter(|&d| is_progress_frame(d, 25)).collect();
        assert_eq!(reported, vec![10, 20, 25]);
        assert!(is_progress_frame(3, 3));
        assert!(!is_progress_frame(2, 3));
    }

    #[test]
    fn intermediates_are_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let guard = Intermediates::new(dir.path()).unwrap();
        std::fs::write(&guard.video, b"v").unwrap();
        std::fs::write(&guard.palette, b"p").unwrap();
        let (video, palette) = (guard.video.clone(), guard.palette.clone());
        drop(guard);
        assert!(!video.exists());
        assert!(!palette.exists());

        // Missing files are fine.
        drop(Intermediates::new(dir.path()).unwrap());
    }
}
