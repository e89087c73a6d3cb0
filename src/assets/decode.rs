use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{WaterfallError, WaterfallResult};
use crate::raster::buffer::PixelBuffer;

/// Decode any format supported by `image` into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> WaterfallResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_rgba8(width, height, rgba.into_raw())
}

pub fn decode_image_file(path: &Path) -> WaterfallResult<PixelBuffer> {
    if !path.is_file() {
        return Err(WaterfallError::input(format!(
            "input file '{}' does not exist",
            path.display()
        )));
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("read input image '{}'", path.display()))?;
    decode_image(&bytes)
        .map_err(|e| WaterfallError::input(format!("'{}': {e:#}", path.display())))
}
