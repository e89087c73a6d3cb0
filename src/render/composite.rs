use std::ops::Range;

use crate::foundation::core::Rgba8;
use crate::raster::buffer::PixelBuffer;
use crate::sim::particle::FloatingImage;

/// Linear RGB blend of `src` over `dst`: `dst + (src - dst) * opacity` per channel.
///
/// Alpha is a pure overlay: the destination alpha is kept and the source alpha is ignored.
pub fn blend_rgb(dst: Rgba8, src: Rgba8, opacity: f32) -> Rgba8 {
    let mix = |d: u8, s: u8| -> u8 {
        let d = f32::from(d);
        ((f32::from(s) - d) * opacity + d) as u8
    };
    Rgba8 {
        r: mix(dst.r, src.r),
        g: mix(dst.g, src.g),
        b: mix(dst.b, src.b),
        a: dst.a,
    }
}

/// Draw `particle` onto `frame`, sampling its pixels from `base`.
///
/// The footprint is `frame` scaled by `particle.scale * scale_multiplier` and centered at the
/// particle position. Each footprint pixel maps proportionally back into `base`
/// (nearest-neighbor); pixels landing outside `frame` are dropped.
pub fn composite(
    frame: &mut PixelBuffer,
    base: &PixelBuffer,
    particle: &FloatingImage,
    scale_multiplier: f32,
) {
    let (fw, fh) = (frame.width(), frame.height());
    let (img_w, img_h) = particle.footprint(fw, fh, scale_multiplier);
    if img_w <= 0 || img_h <= 0 {
        return;
    }

    let (cx, cy) = particle.center_px(fw, fh);
    let left = cx - img_w as f32 / 2.0;
    let top = cy - img_h as f32 / 2.0;
    let base_w = i64::from(base.width());
    let base_h = i64::from(base.height());

    for y in visible_span(top, fh, img_h) {
        let dy = (y as f32 + top).floor() as i64;
        if dy < 0 || dy >= i64::from(fh) {
            continue;
        }
        let sy = y * base_h / img_h;
        for x in visible_span(left, fw, img_w) {
            let dx = (x as f32 + left).floor() as i64;
            if dx < 0 || dx >= i64::from(fw) {
                continue;
            }
            let sx = x * base_w / img_w;
            let floating = base.get(sx, sy);
            let current = frame.get(dx, dy);
            frame.set(dx, dy, blend_rgb(current, floating, particle.opacity));
        }
    }
}

/// Footprint offsets that can land inside `0..extent` once shifted by `offset`, padded by one
/// on each side for float rounding. The caller still bounds-checks every pixel.
fn visible_span(offset: f32, extent: u32, len: i64) -> Range<i64> {
    let start = ((-offset).floor() as i64).saturating_sub(1).max(0);
    let end = ((extent as f32 - offset).ceil() as i64)
        .saturating_add(1)
        .min(len);
    start..end.max(start)
}
