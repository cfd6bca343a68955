//! Color quantization using k-means clustering (Lloyd's algorithm).
//!
//! Each run is seeded with a greedy, count-weighted k-means++ and then alternates between
//! assigning every color to its nearest centroid and moving every centroid to the mean of its colors.
//! A run stops once no color changes cluster, once the total squared centroid shift drops to
//! [`KmeansOptions::tolerance`], or after [`KmeansOptions::max_iterations`] iterations.
//!
//! Results are fully determined by the input, the number of clusters, and the [`KmeansOptions`]
//! (including the seed), and the parallel functions return exactly the same output
//! as their single-threaded counterparts.
//!
//! # Examples
//! ```
//! # use kpalette::{kmeans::{self, KmeansOptions}, ColorSlice};
//! # use palette::Srgb;
//! # fn main() -> Result<(), kpalette::Error> {
//! let pixels = vec![
//!     Srgb::new(0, 0, 0),
//!     Srgb::new(0, 0, 0),
//!     Srgb::new(255, 255, 255),
//!     Srgb::new(255, 255, 255),
//! ];
//! let colors = ColorSlice::try_from(pixels.as_slice())?;
//!
//! let output = kmeans::quantize(colors, 2, &KmeansOptions::new().seed(42))?;
//! assert_eq!(output.labels[0], output.labels[1]);
//! assert_ne!(output.labels[1], output.labels[2]);
//! # Ok(())
//! # }
//! ```

mod lloyd;
mod plus_plus;

use crate::{
    AboveMaxLen, ColorCounts, ColorSlice, Error, IndexedColorCounts, QuantizeOutput, Rgb8,
    MAX_PIXELS,
};
use lloyd::State;
use palette::cast;
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::array;
use tracing::debug;
use wide::{f32x8, CmpLt};

/// The default maximum number of Lloyd iterations per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 300;

/// The default convergence threshold on the total squared centroid shift.
pub const DEFAULT_TOLERANCE: f32 = 1e-4;

/// User provided starting centroids for k-means.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Centroids<Color>(Vec<Color>);

impl<Color> Centroids<Color> {
    /// Gets the inner `Vec` of colors.
    #[must_use]
    pub fn into_inner(self) -> Vec<Color> {
        self.0
    }

    /// Creates a new [`Centroids`] by truncating the colors to a max length of [`MAX_PIXELS`].
    #[must_use]
    pub fn from_truncated(mut centroids: Vec<Color>) -> Self {
        centroids.truncate(MAX_PIXELS as usize);
        Self(centroids)
    }

    /// The number of centroids.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn num_colors(&self) -> u32 {
        self.0.len() as u32
    }
}

impl<Color> AsRef<[Color]> for Centroids<Color> {
    fn as_ref(&self) -> &[Color] {
        &self.0
    }
}

impl<Color> From<Centroids<Color>> for Vec<Color> {
    fn from(value: Centroids<Color>) -> Self {
        value.into_inner()
    }
}

impl<Color> TryFrom<Vec<Color>> for Centroids<Color> {
    type Error = AboveMaxLen<u32>;

    fn try_from(colors: Vec<Color>) -> Result<Self, Self::Error> {
        if colors.len() <= MAX_PIXELS as usize {
            Ok(Self(colors))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use kpalette::kmeans::KmeansOptions;
/// let options = KmeansOptions::new()
///     .max_iterations(100)
///     .runs(4)
///     .seed(42);
/// # let options: KmeansOptions<()> = options; // satisfy type inference
/// ```
#[derive(Debug, Clone)]
pub struct KmeansOptions<Color> {
    /// The seed value for the random number generator.
    seed: u64,
    /// The maximum number of Lloyd iterations in each run.
    max_iterations: u32,
    /// Convergence threshold on the total squared centroid shift.
    tolerance: f32,
    /// The number of differently seeded runs.
    runs: u32,
    /// The initial colors/centroids to use.
    initial_centroids: Option<Centroids<Color>>,
}

impl<Color> Default for KmeansOptions<Color> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Color> KmeansOptions<Color> {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seed: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            runs: 1,
            initial_centroids: None,
        }
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the maximum number of Lloyd iterations for each run.
    ///
    /// The default is [`DEFAULT_MAX_ITERATIONS`].
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the threshold on the sum of squared centroid movements
    /// below which a run is considered converged.
    ///
    /// The default is [`DEFAULT_TOLERANCE`].
    #[must_use]
    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the number of runs with different k-means++ seedings.
    /// The run with the lowest inertia is returned. A value of `0` is treated as `1`.
    ///
    /// The default is `1`.
    #[must_use]
    pub fn runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    /// Sets the initial centroids.
    ///
    /// If fewer than `k` centroids are given, the remaining ones are chosen by k-means++.
    /// If `k` or more are given, only the first `k` are used and only a single run is performed.
    #[must_use]
    pub fn initial_centroids(mut self, centroids: Centroids<Color>) -> Self {
        self.initial_centroids = Some(centroids);
        self
    }

    /// Gets the seed value.
    #[must_use]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Gets the maximum number of iterations per run.
    #[must_use]
    pub const fn get_max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Gets the convergence tolerance.
    #[must_use]
    pub const fn get_tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Gets the number of runs.
    #[must_use]
    pub const fn get_runs(&self) -> u32 {
        self.runs
    }
}

/// Squared euclidean distance between two points.
#[inline]
pub(crate) fn squared_distance(x: [f32; 3], y: [f32; 3]) -> f32 {
    let mut dist = 0.0;
    for c in 0..3 {
        let d = x[c] - y[c];
        dist += d * d;
    }
    dist
}

/// Converts `u8` components to `f32` components.
#[inline]
pub(crate) fn to_f32(color: [u8; 3]) -> [f32; 3] {
    color.map(f32::from)
}

/// Rounds a centroid component to the nearest `u8`.
#[inline]
fn round_component(value: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// Lays out the centroids as chunks of 8 for [`simd_argmin`].
/// Unused lanes in the last chunk are filled with infinity.
fn simd_chunks(centroids: &[[f32; 3]]) -> Vec<[f32x8; 3]> {
    let mut components = Vec::with_capacity(centroids.len().div_ceil(8));
    let chunks = centroids.chunks_exact(8);
    components.extend(
        chunks
            .clone()
            .map(|chunk| array::from_fn(|i| f32x8::new(array::from_fn(|j| chunk[j][i])))),
    );

    if !chunks.remainder().is_empty() {
        let mut arr = [[f32::INFINITY; 8]; 3];
        for (i, color) in chunks.remainder().iter().enumerate() {
            for (arr, &c) in arr.iter_mut().zip(color) {
                arr[i] = c;
            }
        }
        components.push(arr.map(f32x8::new));
    }

    components
}

/// Returns the index of the centroid nearest to `query`, preferring the lowest index on ties.
#[inline]
#[allow(clippy::float_cmp)]
fn simd_argmin(points: &[[f32x8; 3]], query: [f32; 3]) -> u32 {
    let mut cur_chunk = f32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    let query = query.map(f32x8::splat);

    for chunk in points {
        let distance = {
            let d0 = query[0] - chunk[0];
            let d1 = query[1] - chunk[1];
            let d2 = query[2] - chunk[2];
            d0 * d0 + d1 * d1 + d2 * d2
        };

        let mask = distance.cmp_lt(min_distance);
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = mask.blend(distance, min_distance);
        cur_chunk += f32x8::ONE;
    }

    let mut min_index = u32::MAX;
    let mut min_dist = f32::INFINITY;
    for (lane, (&dist, &chunk)) in min_distance
        .as_array_ref()
        .iter()
        .zip(min_chunk.as_array_ref())
        .enumerate()
    {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = chunk as u32 * 8 + lane as u32;
        if dist < min_dist || (dist == min_dist && index < min_index) {
            min_dist = dist;
            min_index = index;
        }
    }

    min_index
}

/// Checks that `k` is a valid number of clusters for `color_counts`.
fn validate<Color>(color_counts: &impl ColorCounts<Color, u8, 3>, k: u32) -> Result<(), Error>
where
    Color: Rgb8,
{
    let total = color_counts.total_count();
    if color_counts.is_empty() {
        Err(Error::EmptyInput)
    } else if k == 0 || k > total {
        Err(Error::InvalidClusterCount { k, max: total })
    } else {
        Ok(())
    }
}

/// The output when there are no more colors than clusters: each color becomes its own cluster.
/// Leftover clusters are empty and repeat the last color.
fn trivial_output<Color>(color_counts: &impl ColorCounts<Color, u8, 3>, k: u32) -> QuantizeOutput<Color>
where
    Color: Rgb8,
{
    let colors = color_counts.colors();
    let k = k as usize;

    let mut palette = colors.to_vec();
    let mut counts = color_counts
        .counts()
        .map_or_else(|| vec![1; colors.len()], <[u32]>::to_vec);

    #[allow(clippy::cast_possible_truncation)]
    let labels = (0..colors.len() as u32).collect();

    if let Some(&last) = colors.last() {
        palette.resize(k, last);
    }
    counts.resize(k, 0);

    QuantizeOutput {
        palette,
        counts,
        labels: color_counts.expand_labels(labels),
    }
}

/// Runs k-means with `assign` as the assignment step and returns the best run.
fn run<'a, Color>(
    color_counts: &'a impl ColorCounts<Color, u8, 3>,
    k: u32,
    options: &KmeansOptions<Color>,
    assign: impl Fn(&mut State<'a>) -> usize,
) -> Result<QuantizeOutput<Color>, Error>
where
    Color: Rgb8,
{
    validate(color_counts, k)?;

    if color_counts.num_colors() <= k {
        debug!(
            k,
            colors = color_counts.num_colors(),
            "no more colors than clusters, skipping k-means"
        );
        return Ok(trivial_output(color_counts, k));
    }

    let points = color_counts.color_components();
    let weights = color_counts.counts();
    let k = k as usize;

    let seeds = options
        .initial_centroids
        .as_ref()
        .map_or(&[][..], AsRef::as_ref)
        .iter()
        .take(k)
        .map(|&color| to_f32(cast::into_array(color)))
        .collect::<Vec<_>>();

    let runs = if seeds.len() == k {
        1
    } else {
        options.runs.max(1)
    };

    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(options.seed);
    let mut best: Option<(f64, State<'_>)> = None;

    for run in 0..runs {
        let centroids = plus_plus::initial_centroids(points, weights, k, &seeds, &mut rng);
        let mut state = State::new(points, weights, centroids);
        let summary = state.run(options.max_iterations, options.tolerance, &assign);

        debug!(
            run,
            k,
            iterations = summary.iterations,
            inertia = summary.inertia,
            stop = ?summary.stop,
            "finished k-means run"
        );

        if best
            .as_ref()
            .map_or(true, |&(inertia, _)| summary.inertia < inertia)
        {
            best = Some((summary.inertia, state));
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let output = best.map_or_else(
        || trivial_output(color_counts, k as u32),
        |(_, state)| state.into_output(color_counts),
    );

    Ok(output)
}

/// Computes a palette of `k` colors for the given colors and assigns each color to one of them.
///
/// `color_counts` can be a plain [`ColorSlice`] or deduplicated colors like [`IndexedColorCounts`].
/// The returned `labels` are always per pixel of the original input.
///
/// # Errors
/// Returns [`Error::EmptyInput`] if there are no colors,
/// and [`Error::InvalidClusterCount`] if `k` is `0` or larger than the total number of pixels.
pub fn indexed_palette<Color>(
    color_counts: &impl ColorCounts<Color, u8, 3>,
    k: u32,
    options: &KmeansOptions<Color>,
) -> Result<QuantizeOutput<Color>, Error>
where
    Color: Rgb8,
{
    run(color_counts, k, options, State::assign)
}

/// Same as [`indexed_palette`], but the assignment step runs in parallel.
///
/// The output is identical to the single-threaded version.
///
/// # Errors
/// See [`indexed_palette`].
#[cfg(feature = "threads")]
pub fn indexed_palette_par<Color>(
    color_counts: &impl ColorCounts<Color, u8, 3>,
    k: u32,
    options: &KmeansOptions<Color>,
) -> Result<QuantizeOutput<Color>, Error>
where
    Color: Rgb8,
{
    run(color_counts, k, options, State::assign_par)
}

/// Quantizes the given pixels down to `k` colors.
///
/// The pixels are deduplicated first, which gives the same clustering as working on
/// every pixel but is much faster on real images.
///
/// # Errors
/// Returns [`Error::EmptyInput`] if there are no pixels,
/// and [`Error::InvalidClusterCount`] if `k` is `0` or larger than the number of pixels.
pub fn quantize<Color>(
    colors: ColorSlice<Color>,
    k: u32,
    options: &KmeansOptions<Color>,
) -> Result<QuantizeOutput<Color>, Error>
where
    Color: Rgb8,
{
    validate(&colors, k)?;
    indexed_palette(&IndexedColorCounts::new(colors), k, options)
}

/// Same as [`quantize`], but deduplication and the assignment step run in parallel.
///
/// The output is identical to the single-threaded version.
///
/// # Errors
/// See [`quantize`].
#[cfg(feature = "threads")]
pub fn quantize_par<Color>(
    colors: ColorSlice<Color>,
    k: u32,
    options: &KmeansOptions<Color>,
) -> Result<QuantizeOutput<Color>, Error>
where
    Color: Rgb8,
{
    validate(&colors, k)?;
    indexed_palette_par(&IndexedColorCounts::new_par(colors), k, options)
}

/// Builds the palette from the final centroids.
pub(crate) fn round_centroids<Color>(centroids: &[[f64; 3]]) -> Vec<Color>
where
    Color: Rgb8,
{
    centroids
        .iter()
        .map(|centroid| cast::from_array(centroid.map(round_component)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use ordered_float::OrderedFloat;
    use palette::Srgb;

    fn slice(colors: &[Srgb<u8>]) -> ColorSlice<Srgb<u8>> {
        ColorSlice::try_from(colors).unwrap()
    }

    fn assert_valid_output(output: &QuantizeOutput<Srgb<u8>>, k: u32, num_pixels: usize) {
        assert_eq!(output.palette.len(), k as usize);
        assert_eq!(output.counts.len(), k as usize);
        assert_eq!(output.labels.len(), num_pixels);
        assert!(output.labels.iter().all(|&label| label < k));

        let mut counts = vec![0; k as usize];
        for &label in &output.labels {
            counts[label as usize] += 1;
        }
        assert_eq!(counts, output.counts);
    }

    #[test]
    fn empty_input() {
        let colors = slice(&[]);
        assert!(matches!(
            quantize(colors, 0, &KmeansOptions::new()),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            quantize(colors, 4, &KmeansOptions::new()),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn invalid_cluster_count() {
        let colors = test_data_256();
        let colors = slice(&colors);

        assert!(matches!(
            quantize(colors, 0, &KmeansOptions::new()),
            Err(Error::InvalidClusterCount { k: 0, max: 256 })
        ));
        assert!(matches!(
            quantize(colors, 257, &KmeansOptions::new()),
            Err(Error::InvalidClusterCount { k: 257, max: 256 })
        ));
        assert!(matches!(
            indexed_palette(&colors, 257, &KmeansOptions::new()),
            Err(Error::InvalidClusterCount { k: 257, max: 256 })
        ));
    }

    #[test]
    fn output_has_k_colors_and_a_label_per_pixel() {
        let colors = test_data_1024();
        for k in [1, 2, 3, 8, 16, 100, 1000, 1024] {
            let output = quantize(slice(&colors), k, &KmeansOptions::new()).unwrap();
            assert_valid_output(&output, k, colors.len());

            for (&label, &color) in output.labels.iter().zip(&output.remapped_colors()) {
                assert_eq!(output.palette[label as usize], color);
            }
        }
    }

    #[test]
    fn same_seed_gives_same_output() {
        let colors = test_data_1024();
        let options = KmeansOptions::new().seed(7).runs(3);

        let first = quantize(slice(&colors), 16, &options).unwrap();
        let second = quantize(slice(&colors), 16, &options).unwrap();
        assert_eq!(first, second);

        let first = indexed_palette(&slice(&colors), 16, &options).unwrap();
        let second = indexed_palette(&slice(&colors), 16, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_cluster_is_global_mean() {
        let colors = [
            Srgb::new(0, 10, 200),
            Srgb::new(10, 20, 100),
            Srgb::new(20, 30, 0),
            Srgb::new(30, 41, 1),
        ];

        let output = quantize(slice(&colors), 1, &KmeansOptions::new()).unwrap();
        assert_eq!(output.palette, [Srgb::new(15, 25, 75)]);
        assert_eq!(output.counts, [4]);
        assert_eq!(output.labels, [0; 4]);

        let output = indexed_palette(&slice(&colors), 1, &KmeansOptions::new()).unwrap();
        assert_eq!(output.palette, [Srgb::new(15, 25, 75)]);
    }

    #[test]
    fn one_cluster_per_pixel_is_lossless() {
        let colors = test_data_1024();
        let k = colors.len() as u32;

        let output = quantize(slice(&colors), k, &KmeansOptions::new()).unwrap();
        assert_valid_output(&output, k, colors.len());
        assert_eq!(output.remapped_colors(), colors);

        let output = indexed_palette(&slice(&colors), k, &KmeansOptions::new()).unwrap();
        assert_valid_output(&output, k, colors.len());
        assert_eq!(output.remapped_colors(), colors);
    }

    #[test]
    fn one_cluster_per_unique_color_is_lossless() {
        let colors = test_data_256();
        let k = colors.len() as u32;
        let pixels = [colors.as_slice(); 3].concat();

        // k < N, but k equals the number of unique colors
        for options in [KmeansOptions::new(), KmeansOptions::new().seed(3)] {
            let output = quantize(slice(&pixels), k, &options).unwrap();
            assert_valid_output(&output, k, pixels.len());
            assert_eq!(output.remapped_colors(), pixels);
        }
    }

    #[test]
    fn more_clusters_than_unique_colors() {
        let pixels = [Srgb::new(1, 2, 3), Srgb::new(4, 5, 6), Srgb::new(1, 2, 3)];

        let output = quantize(slice(&pixels), 3, &KmeansOptions::new()).unwrap();
        assert_valid_output(&output, 3, pixels.len());
        assert_eq!(output.counts, [2, 1, 0]);
        assert_eq!(output.remapped_colors(), pixels);
    }

    #[test]
    fn two_distinct_colors_two_clusters() {
        let black = Srgb::new(0, 0, 0);
        let white = Srgb::new(255, 255, 255);
        let pixels = [black, black, white, white];

        for seed in 0..8 {
            let options = KmeansOptions::new().seed(seed);
            let output = quantize(slice(&pixels), 2, &options).unwrap();
            assert_valid_output(&output, 2, pixels.len());

            let mut palette = output.palette.clone();
            palette.sort_by_key(|srgb| srgb.into_components());
            assert_eq!(palette, [black, white]);

            assert_eq!(output.labels[0], output.labels[1]);
            assert_eq!(output.labels[2], output.labels[3]);
            assert_ne!(output.labels[0], output.labels[2]);
            assert_eq!(output.remapped_colors(), pixels);
        }

        // a raw slice goes through k-means proper instead of the trivial path
        let output = indexed_palette(&slice(&pixels), 2, &KmeansOptions::new()).unwrap();
        assert_eq!(output.remapped_colors(), pixels);
    }

    #[test]
    fn initial_centroids_are_honored() {
        let black = Srgb::new(0, 0, 0);
        let white = Srgb::new(255, 255, 255);
        let pixels = [black, Srgb::new(2, 2, 2), white, Srgb::new(250, 250, 250)];

        let options = KmeansOptions::new()
            .initial_centroids(Centroids::try_from(vec![white, black]).unwrap());
        let output = quantize(slice(&pixels), 2, &options).unwrap();

        assert_eq!(output.palette, [Srgb::new(253, 253, 253), Srgb::new(1, 1, 1)]);
        assert_eq!(output.labels, [1, 1, 0, 0]);
        assert_eq!(output.counts, [2, 2]);
    }

    #[test]
    fn empty_clusters_are_relocated() {
        let a = Srgb::new(0, 0, 0);
        let b = Srgb::new(10, 10, 10);
        let c = Srgb::new(250, 250, 250);
        let pixels = [a, b, c, a, b, c, a, b, c];

        // the green centroid is farther than the others from every pixel
        let initial = vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255), Srgb::new(0, 255, 0)];
        let options = KmeansOptions::new().initial_centroids(Centroids::try_from(initial).unwrap());

        let output = quantize(slice(&pixels), 3, &options).unwrap();
        assert_valid_output(&output, 3, pixels.len());
        assert_eq!(output.palette, [a, c, b]);
        assert_eq!(output.counts, [3, 3, 3]);
        assert_eq!(output.remapped_colors(), pixels);

        let output = indexed_palette(&slice(&pixels), 3, &options).unwrap();
        assert_valid_output(&output, 3, pixels.len());
        assert_eq!(output.remapped_colors(), pixels);
    }

    #[test]
    fn deduplicated_and_raw_input_agree() {
        let colors = test_data_256();
        let pixels = [colors.as_slice(); 2].concat();
        let initial = colors[..12].to_vec();
        let options = KmeansOptions::new()
            .initial_centroids(Centroids::try_from(initial).unwrap())
            .max_iterations(1000)
            .tolerance(0.0);

        let deduplicated = quantize(slice(&pixels), 12, &options).unwrap();
        let raw = indexed_palette(&slice(&pixels), 12, &options).unwrap();
        assert_eq!(deduplicated, raw);
    }

    #[test]
    fn more_runs_never_increase_inertia() {
        fn inertia(output: &QuantizeOutput<Srgb<u8>>, colors: &[Srgb<u8>]) -> f64 {
            output
                .labels
                .iter()
                .zip(colors)
                .map(|(&label, &color)| {
                    let centroid = to_f32(cast::into_array(output.palette[label as usize]));
                    f64::from(squared_distance(centroid, to_f32(cast::into_array(color))))
                })
                .sum()
        }

        let colors = test_data_1024();
        let single = quantize(slice(&colors), 8, &KmeansOptions::new().runs(1)).unwrap();
        let multi = quantize(slice(&colors), 8, &KmeansOptions::new().runs(6)).unwrap();

        // the rounded palettes are within rounding error of the true centroids
        let slack = 0.75 * 3.0 * colors.len() as f64;
        assert!(inertia(&multi, &colors) <= inertia(&single, &colors) + slack);
    }

    #[test]
    fn nearest_neighbor_matches_naive_oracle() {
        let k = 249; // use non-multiple of 8 to test remainder handling
        let centroids = test_data_256()[..k]
            .iter()
            .map(|&color| to_f32(cast::into_array(color)))
            .collect::<Vec<_>>();
        let chunks = simd_chunks(&centroids);

        for color in test_data_1024() {
            let color = to_f32(cast::into_array(color));
            let expected = centroids
                .iter()
                .enumerate()
                .min_by_key(|&(_, &centroid)| OrderedFloat(squared_distance(centroid, color)))
                .map(|(i, _)| i as u32)
                .unwrap();

            assert_eq!(simd_argmin(&chunks, color), expected);
        }
    }

    #[test]
    fn nearest_neighbor_ties_prefer_lowest_index() {
        let mut centroids = vec![[100.0, 100.0, 100.0]; 20];
        centroids[3] = [0.0, 0.0, 0.0];
        centroids[11] = [0.0, 0.0, 0.0];
        centroids[17] = [0.0, 0.0, 0.0];
        let chunks = simd_chunks(&centroids);

        assert_eq!(simd_argmin(&chunks, [1.0, 1.0, 1.0]), 3);
        assert_eq!(simd_argmin(&chunks, [99.0, 99.0, 99.0]), 0);

        let centroids = vec![[5.0, 5.0, 5.0]; 13];
        assert_eq!(simd_argmin(&simd_chunks(&centroids), [0.0, 0.0, 0.0]), 0);
    }

    #[test]
    fn rounding_is_to_nearest() {
        let palette = round_centroids::<Srgb<u8>>(&[[0.49, 0.5, 254.6], [-0.2, 127.5, 300.0]]);
        assert_eq!(palette, [Srgb::new(0, 1, 255), Srgb::new(0, 128, 255)]);
    }

    #[test]
    fn mean_just_below_half_rounds_down() {
        let mut pixels = vec![Srgb::new(127, 0, 0); 524_289];
        pixels.extend(std::iter::repeat(Srgb::new(128, 0, 0)).take(524_287));

        let output = quantize(slice(&pixels), 1, &KmeansOptions::new()).unwrap();
        assert_eq!(output.palette, [Srgb::new(127, 0, 0)]);
        assert_eq!(output.counts, [1_048_576]);
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let colors = [test_data_1024().as_slice(); 4].concat();
        let options = KmeansOptions::new().seed(11).runs(2);

        for k in [1, 5, 64] {
            let single = quantize(slice(&colors), k, &options).unwrap();
            let par = quantize_par(slice(&colors), k, &options).unwrap();
            assert_eq!(single, par);

            let single = indexed_palette(&slice(&colors), k, &options).unwrap();
            let par = indexed_palette_par(&slice(&colors), k, &options).unwrap();
            assert_eq!(single, par);
        }
    }
}
