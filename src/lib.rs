//! Waterfall turns a single still image into a looping animation: scaled, fading copies of the
//! image spawn, drift, fall under gravity and fade in over the original.
//!
//! - Decode an image with [`decode_image_file`]
//! - Drive frames with a [`WaterfallRenderer`] into any [`FrameSink`]
//! - Or produce a palette-optimized GIF end to end with [`render_to_gif`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

/// Encoding collaborators.
pub mod encode;
pub mod raster;
pub mod render;
pub mod settings;
pub mod sim;

pub use crate::assets::decode::{decode_image, decode_image_file};
pub use crate::foundation::core::{Fps, FrameIndex, Rgba8};
pub use crate::foundation::error::{WaterfallError, WaterfallResult};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::raster::buffer::PixelBuffer;
pub use crate::raster::resample::{fit_canvas, fit_dimensions, resize};
pub use crate::render::composite::{blend_rgb, composite};
pub use crate::render::pipeline::{RenderStats, RenderToGifOpts, WaterfallRenderer, render_to_gif};
pub use crate::settings::RenderSettings;
pub use crate::sim::particle::FloatingImage;
pub use crate::sim::spawn::Spawner;
