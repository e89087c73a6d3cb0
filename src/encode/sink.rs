use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WaterfallError, WaterfallResult};
use crate::raster::buffer::PixelBuffer;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

impl SinkConfig {
    /// Size in bytes of one raw RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Consumer of raw RGBA8 frames.
///
/// Ordering contract: `push_frame` is called with strictly increasing, gap-free indices
/// starting at 0, between one `begin` and one `end`.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> WaterfallResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &PixelBuffer) -> WaterfallResult<()>;
    fn end(&mut self) -> WaterfallResult<()>;
}

/// Keeps every frame in memory. Used by tests and tooling.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Vec<u8>)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Raw frame bytes in push order.
    pub fn frames(&self) -> &[(FrameIndex, Vec<u8>)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> WaterfallResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &PixelBuffer) -> WaterfallResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| WaterfallError::encode("in-memory sink not started"))?;
        check_frame(&cfg, frame)?;
        self.frames.push((idx, frame.as_bytes().to_vec()));
        Ok(())
    }

    fn end(&mut self) -> WaterfallResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Reject frames whose dimensions differ from the sink configuration.
pub fn check_frame(cfg: &SinkConfig, frame: &PixelBuffer) -> WaterfallResult<()> {
    if frame.width() != cfg.width || frame.height() != cfg.height {
        return Err(WaterfallError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width(),
            frame.height(),
            cfg.width,
            cfg.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SinkConfig {
        SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(30, 1).unwrap(),
        }
    }

    #[test]
    fn in_memory_sink_records_frames_in_order() {
        let mut sink = InMemorySink::new();
        sink.begin(cfg()).unwrap();
        let frame = PixelBuffer::new(2, 2).unwrap();
        sink.push_frame(FrameIndex(0), &frame).unwrap();
        sink.push_frame(FrameIndex(1), &frame).unwrap();
        sink.end().unwrap();

        assert!(sink.is_finished());
        assert_eq!(sink.config(), Some(cfg()));
        let idx: Vec<_> = sink.frames().iter().map(|(i, _)| i.0).collect();
        assert_eq!(idx, vec![0, 1]);
        assert!(sink.frames().iter().all(|(_, b)| b.len() == cfg().frame_len()));
    }

    #[test]
    fn in_memory_sink_rejects_wrong_size_and_unstarted_push() {
        let mut sink = InMemorySink::new();
        let frame = PixelBuffer::new(2, 2).unwrap();
        assert!(sink.push_frame(FrameIndex(0), &frame).is_err());

        sink.begin(cfg()).unwrap();
        let wrong = PixelBuffer::new(4, 2).unwrap();
        assert!(sink.push_frame(FrameIndex(0), &wrong).is_err());
    }
}
