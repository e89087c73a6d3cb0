use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Fps;
use crate::foundation::error::{WaterfallError, WaterfallResult};

/// Every tunable of a waterfall render.
///
/// Positions, speeds and gravity are fractions of the canvas size (per tick). The
/// `*_opacity_inc` and `*_scale_inc` values are step counts: a particle reaches its target
/// opacity (or full scale) after that many ticks.
///
/// Built once before rendering and only read afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Static frames of the unmodified image before the waterfall starts.
    pub delay: u32,
    pub waterfall_frames: u32,
    /// Ticks (from the first waterfall frame) during which new particles spawn.
    pub img_gen_frames: u32,
    pub min_img_per_frame: u32,
    pub max_img_per_frame: u32,

    pub min_spawn_x: f32,
    pub max_spawn_x: f32,
    pub min_spawn_y: f32,
    pub max_spawn_y: f32,
    pub min_horiz_speed: f32,
    pub max_horiz_speed: f32,
    pub min_vert_speed: f32,
    pub max_vert_speed: f32,
    /// Added to vertical speed every tick.
    pub gravity: f32,

    pub min_opacity: f32,
    pub max_opacity: f32,
    pub min_opacity_inc: u32,
    pub max_opacity_inc: u32,
    pub min_scale_inc: u32,
    pub max_scale_inc: u32,
    pub min_init_scale: f32,
    pub max_init_scale: f32,
    /// Footprint size relative to the canvas at full particle scale.
    pub scale_multiplier: f32,

    pub max_width: u32,
    pub max_height: u32,
    pub framerate: u32,
    /// RNG seed; `0` picks a fresh seed at startup.
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            delay: 20,
            waterfall_frames: 120,
            img_gen_frames: 60,
            min_img_per_frame: 1,
            max_img_per_frame: 2,
            min_spawn_x: 0.0,
            max_spawn_x: 1.0,
            min_spawn_y: 0.0,
            max_spawn_y: 0.4,
            min_horiz_speed: -0.004,
            max_horiz_speed: 0.004,
            min_vert_speed: -0.015,
            max_vert_speed: 0.0,
            gravity: 0.0008,
            min_opacity: 0.35,
            max_opacity: 0.85,
            min_opacity_inc: 10,
            max_opacity_inc: 30,
            min_scale_inc: 20,
            max_scale_inc: 60,
            min_init_scale: 0.0,
            max_init_scale: 0.05,
            scale_multiplier: 0.3,
            max_width: 480,
            max_height: 480,
            framerate: 30,
            seed: 0,
        }
    }
}

impl RenderSettings {
    /// Load settings from a JSON file. Missing fields keep their defaults.
    pub fn from_json_path(path: &Path) -> WaterfallResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> WaterfallResult<Self> {
        serde_json::from_str(text).map_err(|e| WaterfallError::serde(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> WaterfallResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| WaterfallError::serde(e.to_string()))
    }

    /// Total number of frames a render emits.
    pub fn total_frames(&self) -> u64 {
        u64::from(self.delay) + u64::from(self.waterfall_frames)
    }

    pub fn fps(&self) -> WaterfallResult<Fps> {
        Fps::new(self.framerate, 1)
    }

    pub fn validate(&self) -> WaterfallResult<()> {
        if self.framerate == 0 {
            return Err(WaterfallError::validation("framerate must be non-zero"));
        }
        if self.max_width < 2 || self.max_height < 2 {
            return Err(WaterfallError::validation(
                "max-width and max-height must be at least 2",
            ));
        }

        check_range_u32(
            "img-per-frame",
            self.min_img_per_frame,
            self.max_img_per_frame,
        )?;
        check_range_u32("opacity-inc", self.min_opacity_inc, self.max_opacity_inc)?;
        check_range_u32("scale-inc", self.min_scale_inc, self.max_scale_inc)?;
        if self.min_opacity_inc == 0 || self.min_scale_inc == 0 {
            return Err(WaterfallError::validation(
                "opacity-inc and scale-inc step counts must be >= 1",
            ));
        }

        check_range_f32("spawn-x", self.min_spawn_x, self.max_spawn_x)?;
        check_range_f32("spawn-y", self.min_spawn_y, self.max_spawn_y)?;
        check_range_f32("horiz-speed", self.min_horiz_speed, self.max_horiz_speed)?;
        check_range_f32("vert-speed", self.min_vert_speed, self.max_vert_speed)?;
        check_range_f32("opacity", self.min_opacity, self.max_opacity)?;
        check_range_f32("init-scale", self.min_init_scale, self.max_init_scale)?;

        if self.min_opacity < 0.0 || self.max_opacity > 1.0 {
            return Err(WaterfallError::validation(
                "opacity range must lie within [0, 1]",
            ));
        }
        if self.min_init_scale < 0.0 || self.max_init_scale > 1.0 {
            return Err(WaterfallError::validation(
                "init-scale range must lie within [0, 1]",
            ));
        }
        if !self.gravity.is_finite() {
            return Err(WaterfallError::validation("gravity must be finite"));
        }
        if !self.scale_multiplier.is_finite() || self.scale_multiplier < 0.0 {
            return Err(WaterfallError::validation(
                "scale-multiplier must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

fn check_range_u32(name: &str, min: u32, max: u32) -> WaterfallResult<()> {
    if min > max {
        return Err(WaterfallError::validation(format!(
            "min-{name} ({min}) must be <= max-{name} ({max})"
        )));
    }
    Ok(())
}

fn check_range_f32(name: &str, min: f32, max: f32) -> WaterfallResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(WaterfallError::validation(format!(
            "min-{name}/max-{name} must be finite"
        )));
    }
    if min > max {
        return Err(WaterfallError::validation(format!(
            "min-{name} ({min}) must be <= max-{name} ({max})"
        )));
    }
    Ok(())
}
