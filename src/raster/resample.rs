use crate::foundation::error::{WaterfallError, WaterfallResult};
use crate::raster::buffer::PixelBuffer;

/// Nearest-neighbor resize of `src` to `width x height`.
///
/// Destination pixel `(x, y)` samples `src(floor(x * src_w / width), floor(y * src_h / height))`.
pub fn resize(src: &PixelBuffer, width: u32, height: u32) -> WaterfallResult<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(WaterfallError::validation(format!(
            "resize target must be non-zero (got {width}x{height})"
        )));
    }
    if width == src.width() && height == src.height() {
        return Ok(src.clone());
    }

    let mut out = PixelBuffer::new(width, height)?;
    let sw = u64::from(src.width());
    let sh = u64::from(src.height());
    for y in 0..u64::from(height) {
        let sy = (y * sh / u64::from(height)) as i64;
        for x in 0..u64::from(width) {
            let sx = (x * sw / u64::from(width)) as i64;
            out.set(x as i64, y as i64, src.get(sx, sy));
        }
    }
    Ok(out)
}

/// Largest aspect-preserving size within `max_width x max_height`, rounded down to even.
///
/// Fits to `max_height` first; when that overflows `max_width` the fit is redone against
/// `max_width` instead. Even dimensions are required by yuv420p encoding.
pub fn fit_dimensions(
    base_width: u32,
    base_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if base_width == 0 || base_height == 0 {
        return (0, 0);
    }
    let aspect = f64::from(base_width) / f64::from(base_height);
    let mut w = (f64::from(max_height) * aspect) as u32;
    let mut h = max_height;
    if w > max_width {
        w = max_width;
        h = (f64::from(max_width) / aspect) as u32;
    }
    (w & !1, h & !1)
}

/// Resize `base` with [`fit_dimensions`], failing when the fit collapses to nothing.
pub fn fit_canvas(
    base: &PixelBuffer,
    max_width: u32,
    max_height: u32,
) -> WaterfallResult<PixelBuffer> {
    let (w, h) = fit_dimensions(base.width(), base.height(), max_width, max_height);
    if w == 0 || h == 0 {
        return Err(WaterfallError::validation(format!(
            "image {}x{} cannot be fitted into {max_width}x{max_height} with even dimensions",
            base.width(),
            base.height()
        )));
    }
    resize(base, w, h)
}
