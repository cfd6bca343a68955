//! Contains the code for color/pixel deduplication and associated traits and types.

use crate::{ColorComponents, ColorSlice};
use palette::cast::AsArrays;
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::marker::PhantomData;
#[cfg(feature = "image")]
use {crate::AboveMaxLen, image::RgbImage, palette::Srgb};

/// A generalization trait over regular [`ColorSlice`]s and deduplicated pixels like [`IndexedColorCounts`].
pub trait ColorCounts<Color, Component, const N: usize>
where
    Color: ColorComponents<Component, N>,
{
    /// The slice of colors to quantize.
    ///
    /// The colors need not be unique,
    /// but the length of this slice must not be greater than [`MAX_PIXELS`](crate::MAX_PIXELS).
    fn colors(&self) -> &[Color];

    /// The total number of pixels/colors in the (original) color slice.
    ///
    /// For [`ColorSlice`]s, this is simply the length of the slice.
    /// For deduplicated pixels like [`IndexedColorCounts`],
    /// this is the length of the input [`ColorSlice`] before deduplication.
    /// This must be equal to the sum of `counts` (or `num_colors` if `counts` is `None`).
    fn total_count(&self) -> u32;

    /// The number of pixels corresponding to each `Color` in the slice returned by `colors`.
    ///
    /// For [`ColorSlice`]s, this returns `None`, indicating each `Color` has a count of `1`.
    /// For deduplicated pixels, each count indicates the number times
    /// each unique color was present in the original color slice.
    ///
    /// Each count must be nonzero, and the returned slice (if any)
    /// must have the same length as the slice returned by `colors`.
    fn counts(&self) -> Option<&[u32]>;

    /// A slice of indices into the color slice returned by `colors`, one for each original pixel.
    /// This is used to retain the original color slice/image after deduplication.
    ///
    /// Each index must be valid index into the slice returned by `colors`.
    fn indices(&self) -> Option<&[u32]>;

    /// The slice returned by `colors` casted to a slice of component arrays.
    fn color_components(&self) -> &[[Component; N]] {
        self.colors().as_arrays()
    }

    /// The length of the slice returned by `colors` as a `u32`.
    #[allow(clippy::cast_possible_truncation)]
    fn num_colors(&self) -> u32 {
        self.len() as u32
    }

    /// The length of the slice returned by `colors`.
    fn len(&self) -> usize {
        self.colors().len()
    }

    /// Whether or not the slice returned by `colors` is empty.
    fn is_empty(&self) -> bool {
        self.colors().is_empty()
    }

    /// Maps a label for each color in `colors` to a label for each original pixel.
    fn expand_labels(&self, labels: Vec<u32>) -> Vec<u32> {
        match self.indices() {
            Some(indices) => indices.iter().map(|&i| labels[i as usize]).collect(),
            None => labels,
        }
    }
}

impl<'a, Color, Component, const N: usize> ColorCounts<Color, Component, N>
    for ColorSlice<'a, Color>
where
    Color: ColorComponents<Component, N>,
{
    fn colors(&self) -> &[Color] {
        self
    }

    fn total_count(&self) -> u32 {
        self.num_colors()
    }

    fn counts(&self) -> Option<&[u32]> {
        None
    }

    fn indices(&self) -> Option<&[u32]> {
        None
    }

    fn num_colors(&self) -> u32 {
        self.num_colors()
    }

    fn len(&self) -> usize {
        self.as_ref().len()
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }
}

impl<Color, Component, const N: usize> ColorCounts<Color, Component, N>
    for IndexedColorCounts<Color, Component, N>
where
    Color: ColorComponents<Component, N>,
{
    fn colors(&self) -> &[Color] {
        &self.colors
    }

    fn counts(&self) -> Option<&[u32]> {
        Some(&self.counts)
    }

    fn indices(&self) -> Option<&[u32]> {
        Some(&self.indices)
    }

    fn total_count(&self) -> u32 {
        self.total_count
    }
}

/// Deduplicated colors and their frequency counts, alongside an index into the
/// unique colors for each pixel of the original input.
///
/// The unique colors are sorted in ascending order of their components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedColorCounts<Color, Component, const N: usize>
where
    Color: ColorComponents<Component, N>,
{
    /// The unique colors.
    colors: Vec<Color>,
    /// The number of times each unique color was present in the original input.
    counts: Vec<u32>,
    /// The index into `colors` for each pixel of the original input.
    indices: Vec<u32>,
    /// The length of the original input.
    total_count: u32,
    /// Needed for the `Component` generic parameter.
    _phantom: PhantomData<Component>,
}

impl<Color, Component, const N: usize> IndexedColorCounts<Color, Component, N>
where
    Color: ColorComponents<Component, N>,
    Component: Ord,
{
    /// Builds the unique colors, counts, and indices from an order of the input
    /// in which equal colors are adjacent.
    fn from_sorted_order(colors: ColorSlice<Color>, order: &[u32]) -> Self {
        let components = colors.as_slice().as_arrays();

        let mut unique = Vec::<Color>::new();
        let mut counts = Vec::<u32>::new();
        let mut indices = vec![0; colors.len()];

        for &i in order {
            let i = i as usize;
            let is_new = unique
                .as_arrays()
                .last()
                .map_or(true, |last| *last != components[i]);

            if is_new {
                unique.push(colors[i]);
                counts.push(0);
            }

            let last = counts.len() - 1;
            counts[last] += 1;
            #[allow(clippy::cast_possible_truncation)]
            {
                indices[i] = last as u32;
            }
        }

        Self {
            colors: unique,
            counts,
            indices,
            total_count: colors.num_colors(),
            _phantom: PhantomData,
        }
    }

    /// Deduplicates the given colors.
    #[must_use]
    pub fn new(colors: ColorSlice<Color>) -> Self {
        let components = colors.as_slice().as_arrays();
        let mut order = (0..colors.num_colors()).collect::<Vec<_>>();
        order.sort_unstable_by(|&a, &b| components[a as usize].cmp(&components[b as usize]));
        Self::from_sorted_order(colors, &order)
    }

    /// Gets the slice of unique colors.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Gets the count of each unique color.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Gets the index into the unique colors for each original pixel.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The number of unique colors.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_colors(&self) -> u32 {
        self.colors.len() as u32
    }

    /// The number of pixels in the original input.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Whether there are no colors at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(feature = "threads")]
impl<Color, Component, const N: usize> IndexedColorCounts<Color, Component, N>
where
    Color: ColorComponents<Component, N> + Send + Sync,
    Component: Ord + Send + Sync,
{
    /// Deduplicates the given colors in parallel.
    #[must_use]
    pub fn new_par(colors: ColorSlice<Color>) -> Self {
        let components = colors.as_slice().as_arrays();
        let mut order = (0..colors.num_colors()).collect::<Vec<_>>();
        order.par_sort_unstable_by(|&a, &b| components[a as usize].cmp(&components[b as usize]));
        Self::from_sorted_order(colors, &order)
    }
}

#[cfg(feature = "image")]
impl IndexedColorCounts<Srgb<u8>, u8, 3> {
    /// Deduplicates the pixels of an [`RgbImage`].
    ///
    /// Fails if the image has more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
    pub fn try_from_rgbimage(image: &RgbImage) -> Result<Self, AboveMaxLen<u32>> {
        ColorSlice::try_from(image).map(Self::new)
    }

    /// Deduplicates the pixels of an [`RgbImage`] in parallel.
    ///
    /// Fails if the image has more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
    #[cfg(feature = "threads")]
    pub fn try_from_rgbimage_par(image: &RgbImage) -> Result<Self, AboveMaxLen<u32>> {
        ColorSlice::try_from(image).map(Self::new_par)
    }
}
