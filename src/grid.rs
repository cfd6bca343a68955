//! Contains [`PixelGrid`] and the functions to rebuild and combine images.

use crate::{ColorSlice, Error};
#[cfg(feature = "image")]
use {
    image::RgbImage,
    palette::{
        cast::{ComponentsAs, IntoComponents},
        Srgb,
    },
};

/// A 2D image stored as a flat, row-major `Vec` of pixels.
///
/// The length of `pixels` is always equal to `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid<Color> {
    /// The width in pixels.
    width: u32,
    /// The height in pixels.
    height: u32,
    /// The pixels in row-major order.
    pixels: Vec<Color>,
}

impl<Color> PixelGrid<Color> {
    /// Creates a new [`PixelGrid`] from row-major pixels.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `pixels.len()` is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, Error> {
        if pixels.len() as u64 == u64::from(width) * u64::from(height) {
            Ok(Self { width, height, pixels })
        } else {
            Err(Error::ShapeMismatch { len: pixels.len(), width, height })
        }
    }

    /// The width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The `(width, height)` of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Consumes the grid and returns its pixels.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Color> {
        self.pixels
    }

    /// Gets the pixel at column `x` and row `y`, if in bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<&Color> {
        if x < self.width && y < self.height {
            self.pixels.get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Iterates over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        // chunks_exact panics on a zero chunk size
        self.pixels.chunks_exact((self.width as usize).max(1))
    }

    /// Views the pixels as a [`ColorSlice`].
    ///
    /// # Errors
    /// Returns [`Error::TooManyPixels`] if the grid has more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
    pub fn color_slice(&self) -> Result<ColorSlice<'_, Color>, Error> {
        Ok(ColorSlice::try_from(self.pixels.as_slice())?)
    }
}

#[cfg(feature = "image")]
impl From<&RgbImage> for PixelGrid<Srgb<u8>> {
    fn from(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let len = width as usize * height as usize;
        let pixels: &[Srgb<u8>] = image.as_raw()[..(len * 3)].components_as();
        Self { width, height, pixels: pixels.to_vec() }
    }
}

#[cfg(feature = "image")]
impl From<PixelGrid<Srgb<u8>>> for RgbImage {
    fn from(grid: PixelGrid<Srgb<u8>>) -> Self {
        let PixelGrid { width, height, pixels } = grid;
        let buf: Vec<u8> = pixels.into_components();

        #[allow(clippy::expect_used)]
        {
            // the grid invariant makes buf exactly width * height * 3 long
            RgbImage::from_vec(width, height, buf).expect("grid has width * height pixels")
        }
    }
}

/// Builds an image by replacing each label with its palette color.
///
/// `labels` are in row-major order, so the pixel at `(x, y)` is `palette[labels[y * width + x]]`.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if `labels.len()` is not `width * height`,
/// and [`Error::LabelOutOfRange`] if a label is not a valid index into `palette`.
pub fn reconstruct<Color: Copy>(
    width: u32,
    height: u32,
    labels: &[u32],
    palette: &[Color],
) -> Result<PixelGrid<Color>, Error> {
    if labels.len() as u64 != u64::from(width) * u64::from(height) {
        return Err(Error::ShapeMismatch { len: labels.len(), width, height });
    }

    let pixels = labels
        .iter()
        .map(|&label| {
            palette
                .get(label as usize)
                .copied()
                .ok_or(Error::LabelOutOfRange { label, palette_len: palette.len() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PixelGrid { width, height, pixels })
}

/// Places `left` and `right` next to each other in a new image.
///
/// The result is `left.width() + right.width()` pixels wide and as tall as both inputs.
///
/// # Errors
/// Returns [`Error::DimensionMismatch`] if the heights of the two grids differ,
/// and [`Error::WidthOverflow`] if the combined width does not fit in a `u32`.
pub fn compose_side_by_side<Color: Copy>(
    left: &PixelGrid<Color>,
    right: &PixelGrid<Color>,
) -> Result<PixelGrid<Color>, Error> {
    if left.height != right.height {
        return Err(Error::DimensionMismatch { left: left.height, right: right.height });
    }

    let width = left
        .width
        .checked_add(right.width)
        .ok_or(Error::WidthOverflow { left: left.width, right: right.width })?;
    let mut pixels = Vec::with_capacity(left.pixels.len() + right.pixels.len());
    for y in 0..left.height as usize {
        let l = left.width as usize;
        let r = right.width as usize;
        pixels.extend_from_slice(&left.pixels[(y * l)..((y + 1) * l)]);
        pixels.extend_from_slice(&right.pixels[(y * r)..((y + 1) * r)]);
    }

    Ok(PixelGrid { width, height: left.height, pixels })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use palette::Srgb;

    fn grid(width: u32, height: u32, offset: u8) -> PixelGrid<Srgb<u8>> {
        #[allow(clippy::cast_possible_truncation)]
        let pixels = (0..(width * height))
            .map(|i| Srgb::new(i as u8, offset, (i / width) as u8))
            .collect();
        PixelGrid::new(width, height, pixels).unwrap()
    }

    #[test]
    fn new_checks_shape() {
        assert!(PixelGrid::new(2, 3, vec![0u8; 6]).is_ok());
        assert!(matches!(
            PixelGrid::new(2, 3, vec![0u8; 5]),
            Err(Error::ShapeMismatch { len: 5, width: 2, height: 3 })
        ));
    }

    #[test]
    fn reconstruct_places_palette_colors_in_row_major_order() {
        let palette = [Srgb::new(1, 1, 1), Srgb::new(2, 2, 2), Srgb::new(3, 3, 3)];
        let labels = [0, 1, 2, 2, 1, 0];

        let image = reconstruct(3, 2, &labels, &palette).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get(0, 0), Some(&palette[0]));
        assert_eq!(image.get(2, 0), Some(&palette[2]));
        assert_eq!(image.get(0, 1), Some(&palette[2]));
        assert_eq!(image.get(2, 1), Some(&palette[0]));
        assert_eq!(image.get(3, 1), None);
    }

    #[test]
    fn reconstruct_checks_shape_and_labels() {
        let palette = [Srgb::new(1, 1, 1)];

        assert!(matches!(
            reconstruct(2, 2, &[0, 0, 0], &palette),
            Err(Error::ShapeMismatch { len: 3, width: 2, height: 2 })
        ));
        assert!(matches!(
            reconstruct(1, 2, &[0, 1], &palette),
            Err(Error::LabelOutOfRange { label: 1, palette_len: 1 })
        ));
    }

    #[test]
    fn reconstruct_quantized_output_keeps_shape() {
        let colors = test_data_1024();
        let slice = ColorSlice::try_from(colors.as_slice()).unwrap();
        let output = crate::kmeans::quantize(slice, 8, &crate::KmeansOptions::new()).unwrap();

        let image = reconstruct(32, 32, &output.labels, &output.palette).unwrap();
        assert_eq!(image.dimensions(), (32, 32));
        assert_eq!(image.pixels(), output.remapped_colors());
        assert!(image.pixels().iter().all(|color| output.palette.contains(color)));
    }

    #[test]
    fn side_by_side_halves_are_the_inputs() {
        let left = grid(4, 3, 0);
        let right = grid(4, 3, 100);

        let combined = compose_side_by_side(&left, &right).unwrap();
        assert_eq!(combined.dimensions(), (8, 3));

        for (row, (l, r)) in combined.rows().zip(left.rows().zip(right.rows())) {
            assert_eq!(&row[..4], l);
            assert_eq!(&row[4..], r);
        }
    }

    #[test]
    fn side_by_side_allows_different_widths() {
        let left = grid(2, 3, 0);
        let right = grid(5, 3, 1);

        let combined = compose_side_by_side(&left, &right).unwrap();
        assert_eq!(combined.dimensions(), (7, 3));
        assert_eq!(combined.get(1, 2), left.get(1, 2));
        assert_eq!(combined.get(6, 2), right.get(4, 2));
    }

    #[test]
    fn side_by_side_requires_equal_heights() {
        let left = grid(4, 3, 0);
        let right = grid(4, 2, 0);

        assert!(matches!(
            compose_side_by_side(&left, &right),
            Err(Error::DimensionMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn side_by_side_width_must_fit() {
        let left = PixelGrid::<Srgb<u8>>::new(u32::MAX, 0, Vec::new()).unwrap();
        let right = PixelGrid::new(1, 0, Vec::new()).unwrap();

        assert!(matches!(
            compose_side_by_side(&left, &right),
            Err(Error::WidthOverflow { left: u32::MAX, right: 1 })
        ));

        let right = PixelGrid::new(0, 0, Vec::new()).unwrap();
        assert_eq!(compose_side_by_side(&left, &right).unwrap().width(), u32::MAX);
    }

    #[test]
    #[cfg(feature = "image")]
    fn rgbimage_round_trip() {
        let grid = grid(5, 4, 7);
        let image = RgbImage::from(grid.clone());
        assert_eq!(image.dimensions(), (5, 4));
        assert_eq!(image.get_pixel(3, 2).0, [13, 7, 2]);
        assert_eq!(PixelGrid::from(&image), grid);
    }
}
