//! Contains various types needed across the crate.

use crate::MAX_PIXELS;
use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
};
#[cfg(feature = "image")]
use {
    image::RgbImage,
    palette::{cast::ComponentsAs, Srgb},
};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// A simple new type wrapper around `&'a [Color]` with the invariant that the length of the
/// inner slice must not be greater than [`MAX_PIXELS`].
///
/// The order of the slice is the row-major order of the image it came from,
/// and it is preserved by every function in this crate.
///
/// # Examples
/// From a raw color slice:
/// ```
/// # use kpalette::{ColorSlice, AboveMaxLen};
/// # use palette::Srgb;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let srgb = vec![Srgb::new(0, 0, 0)];
/// let colors: ColorSlice<_> = srgb.as_slice().try_into()?;
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use kpalette::ColorSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let colors = ColorSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorSlice<'a, Color>(&'a [Color]);

impl<'a, Color> Clone for ColorSlice<'a, Color> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, Color> Copy for ColorSlice<'a, Color> {}

impl<'a, Color> ColorSlice<'a, Color> {
    /// Returns the length of the slice as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_colors(&self) -> u32 {
        self.0.len() as u32
    }

    /// Returns the inner slice.
    #[must_use]
    pub const fn as_slice(&self) -> &'a [Color] {
        self.0
    }
}

impl<'a, Color> AsRef<[Color]> for ColorSlice<'a, Color> {
    fn as_ref(&self) -> &[Color] {
        self
    }
}

impl<'a, Color> Deref for ColorSlice<'a, Color> {
    type Target = [Color];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, Color> TryFrom<&'a [Color]> for ColorSlice<'a, Color> {
    type Error = AboveMaxLen<u32>;

    fn try_from(slice: &'a [Color]) -> Result<Self, Self::Error> {
        if slice.len() <= MAX_PIXELS as usize {
            Ok(Self(slice))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for ColorSlice<'a, Srgb<u8>> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        if pixels <= MAX_PIXELS as usize {
            let buf = &image.as_raw()[..(pixels * 3)];
            Ok(Self(buf.components_as()))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

/// The output struct returned by the quantization functions.
///
/// It contains the color `palette` (one centroid per cluster), alongside `counts` which has
/// the number of pixels assigned to each cluster, and `labels` which holds
/// the cluster index of each input pixel (in the same order as the input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeOutput<Color> {
    /// The cluster centroids, rounded to the nearest color.
    ///
    /// The colors in the palette are not guaranteed to be unique.
    pub palette: Vec<Color>,
    /// The number of pixels that were assigned to each color in `palette`.
    ///
    /// Each count is not guaranteed to be non-zero.
    pub counts: Vec<u32>,
    /// The index into `palette` for each input pixel.
    pub labels: Vec<u32>,
}

impl<Color> Default for QuantizeOutput<Color> {
    fn default() -> Self {
        Self {
            palette: Vec::new(),
            counts: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl<Color: Copy> QuantizeOutput<Color> {
    /// Returns the color assigned to each pixel, in input order.
    #[must_use]
    pub fn remapped_colors(&self) -> Vec<Color> {
        self.labels
            .iter()
            .map(|&label| self.palette[label as usize])
            .collect()
    }
}
