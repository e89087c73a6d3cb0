/// One falling copy of the source image.
///
/// Position and velocity are canvas fractions: `(0.5, 0.5)` is the canvas center and a
/// velocity of `0.01` moves one percent of the canvas per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatingImage {
    pub pos_x: f32,
    pub pos_y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub target_opacity: f32,
    pub opacity_inc: f32,
    pub opacity: f32,
    pub scale_inc: f32,
    pub scale: f32,
}

impl FloatingImage {
    /// Advance by one tick: move, apply gravity, then grow opacity and scale toward their caps.
    pub fn step(&mut self, gravity: f32) {
        self.pos_x += self.vel_x;
        self.pos_y += self.vel_y;
        self.vel_y += gravity;

        self.opacity += self.opacity_inc;
        if self.opacity >= self.target_opacity {
            self.opacity = self.target_opacity;
        }
        self.scale += self.scale_inc;
        if self.scale >= 1.0 {
            self.scale = 1.0;
        }
    }

    /// Current footprint in pixels for a `canvas_w x canvas_h` frame.
    pub fn footprint(&self, canvas_w: u32, canvas_h: u32, scale_multiplier: f32) -> (i64, i64) {
        let s = self.scale * scale_multiplier;
        (
            (canvas_w as f32 * s) as i64,
            (canvas_h as f32 * s) as i64,
        )
    }

    /// Footprint center in pixels.
    pub fn center_px(&self, canvas_w: u32, canvas_h: u32) -> (f32, f32) {
        (self.pos_x * canvas_w as f32, self.pos_y * canvas_h as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(opacity_inc: f32, scale_inc: f32) -> FloatingImage {
        FloatingImage {
            pos_x: 0.5,
            pos_y: 0.1,
            vel_x: 0.01,
            vel_y: -0.02,
            target_opacity: 0.7,
            opacity_inc,
            opacity: 0.0,
            scale_inc,
            scale: 0.0,
        }
    }

    #[test]
    fn step_moves_then_accelerates() {
        let mut p = particle(0.1, 0.1);
        p.step(0.005);
        assert!((p.pos_x - 0.51).abs() < 1e-6);
        assert!((p.pos_y - 0.08).abs() < 1e-6);
        assert!((p.vel_y + 0.015).abs() < 1e-6);
        assert_eq!(p.vel_x, 0.01);

        p.step(0.005);
        // Second tick uses the velocity updated by the first.
        assert!((p.pos_y - 0.065).abs() < 1e-6);
    }

    #[test]
    fn opacity_and_scale_are_monotone_and_clamped() {
        for (oi, si) in [(0.001, 0.003), (0.07, 0.13), (0.7, 1.0), (5.0, 9.0)] {
            let mut p = particle(oi, si);
            let mut prev = p;
            for _ in 0..2000 {
                p.step(0.001);
                assert!(p.opacity >= prev.opacity);
                assert!(p.scale >= prev.scale);
                assert!(p.opacity <= p.target_opacity);
                assert!(p.scale <= 1.0);
                prev = p;
            }
            assert_eq!(p.opacity, p.target_opacity);
            assert_eq!(p.scale, 1.0);
        }
    }

    #[test]
    fn footprint_scales_with_multiplier() {
        let mut p = particle(0.1, 0.1);
        p.scale = 0.5;
        assert_eq!(p.footprint(200, 100, 1.0), (100, 50));
        assert_eq!(p.footprint(200, 100, 0.5), (50, 25));
        p.scale = 0.0;
        assert_eq!(p.footprint(200, 100, 1.0), (0, 0));
        assert_eq!(p.center_px(200, 100), (100.0, 10.0));
    }
}
