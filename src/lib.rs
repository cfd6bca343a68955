//! A library for reducing an image to a small palette of colors using k-means clustering.
//!
//! `kpalette` groups the pixels of an image into `k` clusters with Lloyd's algorithm,
//! replaces each pixel with the mean color of its cluster,
//! and can place the result next to the original image for comparison.
//!
//! # Features
//! To reduce dependencies and compile times, `kpalette` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate, including reading and writing image files.
//! - `cli`: builds the `kpalette` binary.
//!
//! # High-Level API
//! To get started with the high-level API, see [`ImagePipeline`].
//! For the lower level building blocks, see [`kmeans::quantize`], [`reconstruct`],
//! and [`compose_side_by_side`].
//! ```no_run
//! # use kpalette::{ImagePipeline, KmeansOptions};
//! # fn main() -> Result<(), kpalette::Error> {
//! let img = kpalette::open_image("some image.png")?;
//!
//! let mut pipeline = ImagePipeline::try_from(&img)?;
//! pipeline
//!     .palette_size(16)
//!     .kmeans_options(KmeansOptions::new().seed(42).runs(3));
//!
//! // Run the pipeline in parallel to get the original and quantized images side by side
//! let comparison = pipeline.side_by_side_rgbimage_par()?;
//! kpalette::save_image(&comparison, "comparison.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the options and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod color_counts;
mod error;
mod grid;
mod traits;
mod types;

#[cfg(feature = "image")]
mod io;

pub mod kmeans;

pub use api::*;
pub use color_counts::*;
pub use error::Error;
pub use grid::*;
pub use kmeans::{Centroids, KmeansOptions};
pub use traits::*;
pub use types::*;

#[cfg(feature = "image")]
pub use io::{open_image, save_image};

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;
