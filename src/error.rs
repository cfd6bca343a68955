//! Contains the crate-wide [`Error`] type.

use crate::AboveMaxLen;
#[cfg(feature = "image")]
use std::path::PathBuf;
use thiserror::Error;

/// The errors that can occur while quantizing, reconstructing, or composing images.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested number of clusters was `0` or greater than the number of pixels.
    #[error("invalid cluster count {k}, expected a value in the range 1..={max}")]
    InvalidClusterCount {
        /// The requested number of clusters.
        k: u32,
        /// The maximum number of clusters, i.e., the number of pixels.
        max: u32,
    },
    /// No pixels were provided to the quantizer.
    #[error("cannot quantize an empty set of pixels")]
    EmptyInput,
    /// The number of labels does not match the dimensions of the image.
    #[error("got {len} labels for an image of {width}x{height} pixels")]
    ShapeMismatch {
        /// The number of labels or pixels provided.
        len: usize,
        /// The expected width.
        width: u32,
        /// The expected height.
        height: u32,
    },
    /// A label does not refer to a color in the palette.
    #[error("label {label} is out of range for a palette of {palette_len} colors")]
    LabelOutOfRange {
        /// The offending label.
        label: u32,
        /// The number of colors in the palette.
        palette_len: usize,
    },
    /// Two images cannot be placed side by side because their heights differ.
    #[error("cannot place an image of height {right} next to an image of height {left}")]
    DimensionMismatch {
        /// The height of the left image.
        left: u32,
        /// The height of the right image.
        right: u32,
    },
    /// Two images placed side by side would be wider than `u32::MAX` pixels.
    #[error("cannot place an image of width {right} next to an image of width {left}, the result is too wide")]
    WidthOverflow {
        /// The width of the left image.
        left: u32,
        /// The width of the right image.
        right: u32,
    },
    /// The input has more pixels than supported.
    #[error("too many pixels: {0}")]
    TooManyPixels(#[from] AboveMaxLen<u32>),
    /// The image file could not be opened or decoded.
    #[cfg(feature = "image")]
    #[error("failed to decode image {}", .path.display())]
    ImageDecode {
        /// The path of the image file.
        path: PathBuf,
        /// The underlying decoding error.
        #[source]
        source: image::ImageError,
    },
    /// The image could not be encoded or written to disk.
    #[cfg(feature = "image")]
    #[error("failed to write image {}", .path.display())]
    ImageWrite {
        /// The path of the output file.
        path: PathBuf,
        /// The underlying encoding or I/O error.
        #[source]
        source: image::ImageError,
    },
}
