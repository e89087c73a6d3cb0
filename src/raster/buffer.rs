use crate::foundation::core::Rgba8;
use crate::foundation::error::{WaterfallError, WaterfallResult};

/// Fixed-size RGBA8 raster, tightly packed, row-major.
///
/// Reads outside `[0, width) x [0, height)` yield [`Rgba8::TRANSPARENT`] and writes outside it
/// are dropped. Compositing relies on this to let particles drift off-canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> WaterfallResult<Self> {
        if width == 0 || height == 0 {
            return Err(WaterfallError::validation(format!(
                "pixel buffer dimensions must be non-zero (got {width}x{height})"
            )));
        }
        Ok(Self {
            width,
            height,
            data: vec![0u8; byte_len(width, height)],
        })
    }

    /// Wrap existing RGBA8 bytes. `data.len()` must equal `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> WaterfallResult<Self> {
        if width == 0 || height == 0 {
            return Err(WaterfallError::validation(format!(
                "pixel buffer dimensions must be non-zero (got {width}x{height})"
            )));
        }
        if data.len() != byte_len(width, height) {
            return Err(WaterfallError::validation(format!(
                "rgba8 data length {} does not match {width}x{height}x4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Allocate a buffer with every pixel set to `px`.
    pub fn filled(width: u32, height: u32, px: Rgba8) -> WaterfallResult<Self> {
        let mut out = Self::new(width, height)?;
        for chunk in out.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px.to_array());
        }
        Ok(out)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw frame bytes, exactly `width * height * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: i64, y: i64) -> Rgba8 {
        match self.offset(x, y) {
            Some(i) => Rgba8::from_slice(&self.data[i..i + 4]),
            None => Rgba8::TRANSPARENT,
        }
    }

    pub fn set(&mut self, x: i64, y: i64, px: Rgba8) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&px.to_array());
        }
    }

    /// Overwrite this buffer with the contents of `src`. Dimensions must match.
    pub fn copy_from(&mut self, src: &PixelBuffer) -> WaterfallResult<()> {
        if self.width != src.width || self.height != src.height {
            return Err(WaterfallError::validation(format!(
                "copy_from size mismatch: {}x{} <- {}x{}",
                self.width, self.height, src.width, src.height
            )));
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}
