use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::settings::RenderSettings;
use crate::sim::particle::FloatingImage;

/// Seeded source of particle parameters.
///
/// Every value is drawn uniformly from its `[min, max]` range in [`RenderSettings`]; equal bounds
/// yield the bound itself without consuming randomness.
#[derive(Clone, Debug)]
pub struct Spawner {
    rng: StdRng,
    seed: u64,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Resolve the configured seed, replacing `0` with a fresh random one.
    pub fn resolve_seed(configured: u64) -> u64 {
        if configured != 0 {
            return configured;
        }
        loop {
            let s: u64 = rand::rng().random();
            if s != 0 {
                return s;
            }
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of particles to spawn this tick.
    pub fn spawn_count(&mut self, settings: &RenderSettings) -> u32 {
        self.uniform_u32(settings.min_img_per_frame, settings.max_img_per_frame)
    }

    pub fn spawn(&mut self, settings: &RenderSettings) -> FloatingImage {
        let pos_x = self.uniform_f32(settings.min_spawn_x, settings.max_spawn_x);
        let pos_y = self.uniform_f32(settings.min_spawn_y, settings.max_spawn_y);
        let vel_x = self.uniform_f32(settings.min_horiz_speed, settings.max_horiz_speed);
        let vel_y = self.uniform_f32(settings.min_vert_speed, settings.max_vert_speed);
        let target_opacity = self.uniform_f32(settings.min_opacity, settings.max_opacity);
        let opacity_steps = self
            .uniform_u32(settings.min_opacity_inc, settings.max_opacity_inc)
            .max(1);
        let scale_steps = self
            .uniform_u32(settings.min_scale_inc, settings.max_scale_inc)
            .max(1);
        let scale = self.uniform_f32(settings.min_init_scale, settings.max_init_scale);

        FloatingImage {
            pos_x,
            pos_y,
            vel_x,
            vel_y,
            target_opacity,
            opacity_inc: target_opacity / opacity_steps as f32,
            opacity: 0.0,
            scale_inc: 1.0 / scale_steps as f32,
            scale,
        }
    }

    fn uniform_f32(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    fn uniform_u32(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_particles() {
        let settings = RenderSettings::default();
        let mut a = Spawner::new(7);
        let mut b = Spawner::new(7);
        for _ in 0..50 {
            assert_eq!(a.spawn_count(&settings), b.spawn_count(&settings));
            assert_eq!(a.spawn(&settings), b.spawn(&settings));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let settings = RenderSettings::default();
        let a: Vec<_> = {
            let mut s = Spawner::new(1);
            (0..8).map(|_| s.spawn(&settings)).collect()
        };
        let b: Vec<_> = {
            let mut s = Spawner::new(2);
            (0..8).map(|_| s.spawn(&settings)).collect()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn degenerate_ranges_are_deterministic() {
        let settings = RenderSettings {
            min_spawn_x: 0.25,
            max_spawn_x: 0.25,
            min_spawn_y: 0.75,
            max_spawn_y: 0.75,
            min_horiz_speed: 0.0,
            max_horiz_speed: 0.0,
            min_vert_speed: -0.01,
            max_vert_speed: -0.01,
            min_opacity: 0.5,
            max_opacity: 0.5,
            min_opacity_inc: 5,
            max_opacity_inc: 5,
            min_scale_inc: 4,
            max_scale_inc: 4,
            min_init_scale: 0.0,
            max_init_scale: 0.0,
            ..RenderSettings::default()
        };
        let p = Spawner::new(99).spawn(&settings);
        assert_eq!(
            p,
            FloatingImage {
                pos_x: 0.25,
                pos_y: 0.75,
                vel_x: 0.0,
                vel_y: -0.01,
                target_opacity: 0.5,
                opacity_inc: 0.1,
                opacity: 0.0,
                scale_inc: 0.25,
                scale: 0.0,
            }
        );
    }

    #[test]
    fn drawn_values_stay_in_range() {
        let settings = RenderSettings::default();
        let mut s = Spawner::new(3);
        for _ in 0..500 {
            let n = s.spawn_count(&settings);
            assert!((settings.min_img_per_frame..=settings.max_img_per_frame).contains(&n));
            let p = s.spawn(&settings);
            assert!((settings.min_spawn_x..=settings.max_spawn_x).contains(&p.pos_x));
            assert!((settings.min_opacity..=settings.max_opacity).contains(&p.target_opacity));
            assert!(p.opacity_inc > 0.0 && p.opacity_inc <= p.target_opacity);
            assert!(p.scale_inc > 0.0 && p.scale_inc <= 1.0);
            assert_eq!(p.opacity, 0.0);
        }
    }

    #[test]
    fn resolve_seed_keeps_explicit_seed() {
        assert_eq!(Spawner::resolve_seed(1234), 1234);
        assert_ne!(Spawner::resolve_seed(0), 0);
    }
}
