//! Contains the [`ImagePipeline`] builder struct for the high level API.

use super::DEFAULT_PALETTE_SIZE;
use crate::{
    compose_side_by_side,
    kmeans::{self, KmeansOptions},
    reconstruct, ColorSlice, Error, PixelGrid, QuantizeOutput,
};
use palette::Srgb;
use tracing::info;
#[cfg(feature = "image")]
use {crate::AboveMaxLen, image::RgbImage};

/// A builder struct to specify options to quantize an image.
///
/// # Examples
/// To start, create a [`ImagePipeline`] from a [`RgbImage`] (note that the `image` feature is needed):
/// ```no_run
/// # use kpalette::ImagePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = kpalette::open_image("some image.png")?;
/// let mut pipeline = ImagePipeline::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
///
/// Then, you can change different options like the number of colors in the palette:
/// ```
/// # use kpalette::{ImagePipeline, KmeansOptions};
/// # use palette::Srgb;
/// # fn main() -> Result<(), kpalette::Error> {
/// # let srgb = vec![Srgb::new(0, 0, 0); 4];
/// # let mut pipeline = ImagePipeline::new(srgb.as_slice().try_into()?, 2, 2)?;
/// let pipeline = pipeline
///     .palette_size(2)
///     .kmeans_options(KmeansOptions::new().seed(7).runs(3));
/// # Ok(())
/// # }
/// ```
///
/// Finally, run the pipeline:
/// ```
/// # use kpalette::ImagePipeline;
/// # use palette::Srgb;
/// # fn main() -> Result<(), kpalette::Error> {
/// # let srgb = vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)];
/// # let mut pipeline = ImagePipeline::new(srgb.as_slice().try_into()?, 2, 1)?;
/// # pipeline.palette_size(2);
/// let output = pipeline.quantize()?;
/// let image = pipeline.quantized_grid()?;
/// assert_eq!(image.pixels(), srgb);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct ImagePipeline<'a> {
    /// The input image as a flat slice of pixels.
    pub(crate) colors: ColorSlice<'a, Srgb<u8>>,
    /// The dimensions of the image.
    pub(crate) dimensions: (u32, u32),
    /// The number of colors to put in the palette.
    pub(crate) k: u32,
    /// The options for k-means.
    pub(crate) kmeans_options: KmeansOptions<Srgb<u8>>,
    /// Whether or not to deduplicate the input pixels/colors.
    pub(crate) dedup_pixels: bool,
}

impl<'a> ImagePipeline<'a> {
    /// Creates a new [`ImagePipeline`] with default options
    /// and does not validate the size of the input image/slice.
    fn new_unchecked(colors: ColorSlice<'a, Srgb<u8>>, width: u32, height: u32) -> Self {
        Self {
            colors,
            dimensions: (width, height),
            k: DEFAULT_PALETTE_SIZE,
            kmeans_options: KmeansOptions::new(),
            dedup_pixels: true,
        }
    }

    /// Creates a new [`ImagePipeline`] with default options.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the length of `colors` is not equal to `width * height`.
    pub fn new(colors: ColorSlice<'a, Srgb<u8>>, width: u32, height: u32) -> Result<Self, Error> {
        if colors.len() as u64 == u64::from(width) * u64::from(height) {
            Ok(Self::new_unchecked(colors, width, height))
        } else {
            Err(Error::ShapeMismatch { len: colors.len(), width, height })
        }
    }

    /// Sets the number of colors in the palette.
    ///
    /// The default palette size is [`DEFAULT_PALETTE_SIZE`](crate::DEFAULT_PALETTE_SIZE).
    pub fn palette_size(&mut self, k: u32) -> &mut Self {
        self.k = k;
        self
    }

    /// Sets the options for k-means.
    ///
    /// See [`KmeansOptions`] for the defaults.
    pub fn kmeans_options(&mut self, options: KmeansOptions<Srgb<u8>>) -> &mut Self {
        self.kmeans_options = options;
        self
    }

    /// Sets whether or not to deduplicate pixels in the image.
    ///
    /// Deduplication makes k-means much faster on images with many repeated colors.
    /// Lloyd iterations give the same result either way, but k-means++ may pick different
    /// starting centroids, so the palette can differ unless initial centroids are provided.
    /// It is recommended to keep this option as default,
    /// unless the image is very small or most pixels are their own unique color.
    ///
    /// The default value is `true`.
    pub fn dedup_pixels(&mut self, dedup_pixels: bool) -> &mut Self {
        self.dedup_pixels = dedup_pixels;
        self
    }

    /// The `(width, height)` of the input image.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// The input image as a [`PixelGrid`].
    #[must_use]
    pub fn original_grid(&self) -> PixelGrid<Srgb<u8>> {
        let (width, height) = self.dimensions;
        #[allow(clippy::expect_used)]
        {
            // checked on construction
            PixelGrid::new(width, height, self.colors.to_vec()).expect("pixels match dimensions")
        }
    }

    /// Logs the result of a finished run.
    fn log_output(&self, output: &QuantizeOutput<Srgb<u8>>) {
        let (width, height) = self.dimensions;
        let used = output.counts.iter().filter(|&&count| count > 0).count();
        info!(width, height, k = self.k, used, dedup = self.dedup_pixels, "quantized image");
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for ImagePipeline<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        Ok(Self::new_unchecked(
            image.try_into()?,
            image.width(),
            image.height(),
        ))
    }
}

impl<'a> ImagePipeline<'a> {
    /// Runs k-means and returns the palette, cluster sizes, and the label of each pixel.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for an image with no pixels,
    /// and [`Error::InvalidClusterCount`] if the palette size is `0` or larger than the number of pixels.
    pub fn quantize(&self) -> Result<QuantizeOutput<Srgb<u8>>, Error> {
        let Self { colors, k, dedup_pixels, .. } = *self;
        let options = &self.kmeans_options;

        let output = if dedup_pixels {
            kmeans::quantize(colors, k, options)?
        } else {
            kmeans::indexed_palette(&colors, k, options)?
        };

        self.log_output(&output);
        Ok(output)
    }

    /// Runs the pipeline and returns the quantized image.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn quantized_grid(&self) -> Result<PixelGrid<Srgb<u8>>, Error> {
        let (width, height) = self.dimensions;
        let output = self.quantize()?;
        reconstruct(width, height, &output.labels, &output.palette)
    }

    /// Runs the pipeline and returns the original image on the left
    /// and the quantized image on the right.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn side_by_side_grid(&self) -> Result<PixelGrid<Srgb<u8>>, Error> {
        compose_side_by_side(&self.original_grid(), &self.quantized_grid()?)
    }
}

#[cfg(feature = "threads")]
impl<'a> ImagePipeline<'a> {
    /// Runs k-means in parallel and returns the palette, cluster sizes, and the label of each pixel.
    ///
    /// The output is identical to [`ImagePipeline::quantize`].
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn quantize_par(&self) -> Result<QuantizeOutput<Srgb<u8>>, Error> {
        let Self { colors, k, dedup_pixels, .. } = *self;
        let options = &self.kmeans_options;

        let output = if dedup_pixels {
            kmeans::quantize_par(colors, k, options)?
        } else {
            kmeans::indexed_palette_par(&colors, k, options)?
        };

        self.log_output(&output);
        Ok(output)
    }

    /// Runs the pipeline in parallel and returns the quantized image.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn quantized_grid_par(&self) -> Result<PixelGrid<Srgb<u8>>, Error> {
        let (width, height) = self.dimensions;
        let output = self.quantize_par()?;
        reconstruct(width, height, &output.labels, &output.palette)
    }

    /// Runs the pipeline in parallel and returns the original image on the left
    /// and the quantized image on the right.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn side_by_side_grid_par(&self) -> Result<PixelGrid<Srgb<u8>>, Error> {
        compose_side_by_side(&self.original_grid(), &self.quantized_grid_par()?)
    }
}

#[cfg(feature = "image")]
impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline and returns the quantized image.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn quantized_rgbimage(&self) -> Result<RgbImage, Error> {
        self.quantized_grid().map(RgbImage::from)
    }

    /// Runs the pipeline and returns the original and quantized images side by side.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn side_by_side_rgbimage(&self) -> Result<RgbImage, Error> {
        self.side_by_side_grid().map(RgbImage::from)
    }
}

#[cfg(all(feature = "threads", feature = "image"))]
impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline in parallel and returns the quantized image.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn quantized_rgbimage_par(&self) -> Result<RgbImage, Error> {
        self.quantized_grid_par().map(RgbImage::from)
    }

    /// Runs the pipeline in parallel and returns the original and quantized images side by side.
    ///
    /// # Errors
    /// See [`ImagePipeline::quantize`].
    pub fn side_by_side_rgbimage_par(&self) -> Result<RgbImage, Error> {
        self.side_by_side_grid_par().map(RgbImage::from)
    }
}
