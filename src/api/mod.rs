//! Contains the [`ImagePipeline`] builder for the high level API.

mod image_pipeline;

pub use image_pipeline::ImagePipeline;

/// The default number of colors in the palette.
pub const DEFAULT_PALETTE_SIZE: u32 = 8;
