use super::{round_centroids, simd_argmin, simd_chunks, squared_distance, to_f32};
use crate::{ColorCounts, QuantizeOutput, Rgb8};
use ordered_float::OrderedFloat;
#[cfg(feature = "threads")]
use rayon::prelude::*;
use tracing::trace;
use wide::f32x8;

/// Why a k-means run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Stop {
    /// No color changed cluster.
    Converged,
    /// The centroids moved less than the tolerance.
    Tolerance,
    /// The iteration cap was reached.
    MaxIterations,
}

/// Summary of a single k-means run.
#[derive(Debug, Clone, Copy)]
pub(super) struct Summary {
    pub(super) iterations: u32,
    pub(super) inertia: f64,
    pub(super) stop: Stop,
}

/// Label for colors that have not been assigned yet.
const UNASSIGNED: u32 = u32::MAX;

/// The state of a single run of Lloyd's algorithm.
pub(super) struct State<'a> {
    /// The colors to cluster.
    points: &'a [[u8; 3]],
    /// The number of pixels for each color, or `None` if each color is one pixel.
    weights: Option<&'a [u32]>,
    /// The current centroids.
    centroids: Vec<[f32; 3]>,
    /// The exact (weighted) mean of each cluster, used for the final palette.
    means: Vec<[f64; 3]>,
    /// `centroids` laid out for [`simd_argmin`].
    chunks: Vec<[f32x8; 3]>,
    /// The cluster of each color.
    labels: Vec<u32>,
}

impl<'a> State<'a> {
    pub(super) fn new(
        points: &'a [[u8; 3]],
        weights: Option<&'a [u32]>,
        centroids: Vec<[f32; 3]>,
    ) -> Self {
        Self {
            points,
            weights,
            chunks: simd_chunks(&centroids),
            means: centroids.iter().map(|centroid| centroid.map(f64::from)).collect(),
            centroids,
            labels: vec![UNASSIGNED; points.len()],
        }
    }

    #[inline]
    fn weight(&self, i: usize) -> u64 {
        self.weights.map_or(1, |weights| u64::from(weights[i]))
    }

    /// Assigns each color to its nearest centroid and returns the number of colors that changed cluster.
    pub(super) fn assign(&mut self) -> usize {
        let chunks = &self.chunks;
        self.labels
            .iter_mut()
            .zip(self.points)
            .map(|(label, &point)| {
                let nearest = simd_argmin(chunks, to_f32(point));
                let changed = *label != nearest;
                *label = nearest;
                usize::from(changed)
            })
            .sum()
    }

    /// Same as [`State::assign`], but in parallel.
    #[cfg(feature = "threads")]
    pub(super) fn assign_par(&mut self) -> usize {
        let chunks = &self.chunks;
        self.labels
            .par_iter_mut()
            .zip(self.points)
            .map(|(label, &point)| {
                let nearest = simd_argmin(chunks, to_f32(point));
                let changed = *label != nearest;
                *label = nearest;
                usize::from(changed)
            })
            .sum()
    }

    /// Moves the farthest colors into empty clusters.
    ///
    /// A color is only taken from a cluster that has other colors left,
    /// so no new empty clusters are created. Returns the number of relocated colors.
    fn relocate_empty_clusters(&mut self) -> usize {
        let Self { points, centroids, means, labels, .. } = self;

        let mut members = vec![0u32; centroids.len()];
        for &label in labels.iter() {
            members[label as usize] += 1;
        }

        if !members.contains(&0) {
            return 0;
        }

        let mut distances = points
            .iter()
            .zip(labels.iter())
            .map(|(&point, &label)| squared_distance(to_f32(point), centroids[label as usize]))
            .collect::<Vec<_>>();

        let mut relocated = 0;
        for cluster in 0..centroids.len() {
            if members[cluster] != 0 {
                continue;
            }

            // ties go to the lowest index
            let farthest = distances
                .iter()
                .enumerate()
                .filter(|&(i, _)| members[labels[i] as usize] > 1)
                .max_by(|&(i, &a), &(j, &b)| OrderedFloat(a).cmp(&OrderedFloat(b)).then(j.cmp(&i)))
                .map(|(i, _)| i);

            let Some(i) = farthest else {
                continue;
            };

            members[labels[i] as usize] -= 1;
            members[cluster] = 1;
            #[allow(clippy::cast_possible_truncation)]
            {
                labels[i] = cluster as u32;
            }
            centroids[cluster] = to_f32(points[i]);
            means[cluster] = points[i].map(f64::from);
            distances[i] = 0.0;
            relocated += 1;
        }

        relocated
    }

    /// Moves each centroid to the (weighted) mean of its colors
    /// and returns the total squared distance the centroids moved.
    ///
    /// Centroids of empty clusters are left unchanged.
    fn update(&mut self) -> f64 {
        let k = self.centroids.len();
        let mut sums = vec![[0u64; 3]; k];
        let mut totals = vec![0u64; k];

        for (i, (&point, &label)) in self.points.iter().zip(&self.labels).enumerate() {
            let weight = self.weight(i);
            let label = label as usize;
            for (sum, c) in sums[label].iter_mut().zip(point) {
                *sum += weight * u64::from(c);
            }
            totals[label] += weight;
        }

        let mut shift = 0.0;
        for (((centroid, old), sum), &total) in self
            .centroids
            .iter_mut()
            .zip(&mut self.means)
            .zip(&sums)
            .zip(&totals)
        {
            if total == 0 {
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let mean = sum.map(|s| s as f64 / total as f64);
            shift += old.iter().zip(&mean).map(|(a, b)| (a - b) * (a - b)).sum::<f64>();
            *old = mean;
            #[allow(clippy::cast_possible_truncation)]
            {
                *centroid = mean.map(|c| c as f32);
            }
        }

        self.chunks = simd_chunks(&self.centroids);
        shift
    }

    /// The weighted sum of squared distances from each color to its centroid.
    fn inertia(&self) -> f64 {
        self.points
            .iter()
            .zip(&self.labels)
            .enumerate()
            .map(|(i, (&point, &label))| {
                #[allow(clippy::cast_precision_loss)]
                let weight = self.weight(i) as f64;
                weight
                    * f64::from(squared_distance(
                        to_f32(point),
                        self.centroids[label as usize],
                    ))
            })
            .sum()
    }

    /// Runs Lloyd iterations until convergence or `max_iterations`,
    /// using `assign` as the assignment step.
    pub(super) fn run(
        &mut self,
        max_iterations: u32,
        tolerance: f32,
        assign: &impl Fn(&mut Self) -> usize,
    ) -> Summary {
        let mut iterations = 0;
        let mut stop = Stop::MaxIterations;

        while iterations < max_iterations {
            iterations += 1;

            let changed = assign(self);
            if changed == 0 {
                stop = Stop::Converged;
                break;
            }

            let relocated = self.relocate_empty_clusters();
            let shift = self.update();
            trace!(iterations, changed, relocated, shift, "k-means iteration");

            if shift <= f64::from(tolerance) {
                stop = Stop::Tolerance;
                break;
            }
        }

        if stop != Stop::Converged {
            // labels must match the final centroids
            assign(self);
        }

        Summary { iterations, inertia: self.inertia(), stop }
    }

    /// Consumes the state and builds the output for the original pixels.
    pub(super) fn into_output<Color>(
        self,
        color_counts: &impl ColorCounts<Color, u8, 3>,
    ) -> QuantizeOutput<Color>
    where
        Color: Rgb8,
    {
        let mut counts = vec![0u32; self.centroids.len()];
        for (i, &label) in self.labels.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                counts[label as usize] += self.weight(i) as u32;
            }
        }

        QuantizeOutput {
            palette: round_centroids(&self.means),
            counts,
            labels: color_counts.expand_labels(self.labels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: u8) -> [u8; 3] {
        [v, v, v]
    }

    #[test]
    fn update_uses_weighted_means() {
        let points = [gray(0), gray(10), gray(200)];
        let weights = [3u32, 1, 5];
        let mut state = State::new(
            &points,
            Some(&weights[..]),
            vec![[0.0, 0.0, 0.0], [255.0, 255.0, 255.0]],
        );

        assert_eq!(state.assign(), 3);
        assert_eq!(state.labels, [0, 0, 1]);

        let shift = state.update();
        assert_eq!(state.centroids, [[2.5; 3], [200.0; 3]]);
        assert_eq!(state.means, [[2.5; 3], [200.0; 3]]);
        assert!((shift - (3.0 * 2.5 * 2.5 + 3.0 * 55.0 * 55.0)).abs() < 1e-3);

        // labels are unchanged by the new centroids
        assert_eq!(state.assign(), 0);
    }

    #[test]
    fn means_keep_full_precision() {
        // 127.4999990463... is 127.5 as an f32
        let points = [[127, 0, 0], [128, 0, 0]];
        let weights = [524_289u32, 524_287];
        let mut state = State::new(&points, Some(&weights[..]), vec![[0.0; 3]]);

        state.assign();
        state.update();
        assert_eq!(state.centroids[0][0], 127.5);
        assert!(state.means[0][0] < 127.5);
        assert_eq!(round_centroids::<palette::Srgb<u8>>(&state.means)[0].red, 127);
    }

    #[test]
    fn empty_cluster_keeps_centroid_without_donor() {
        let points = [gray(5)];
        let mut state = State::new(&points, None, vec![[5.0; 3], [100.0; 3]]);

        state.assign();
        assert_eq!(state.relocate_empty_clusters(), 0);
        state.update();
        assert_eq!(state.centroids, [[5.0; 3], [100.0; 3]]);
    }

    #[test]
    fn empty_cluster_takes_farthest_color() {
        let points = [gray(0), gray(20), gray(1), gray(250)];
        let mut state = State::new(&points, None, vec![[0.0; 3], [255.0; 3], [255.0, 0.0, 0.0]]);

        state.assign();
        assert_eq!(state.labels, [0, 0, 0, 1]);
        assert_eq!(state.relocate_empty_clusters(), 1);
        assert_eq!(state.labels, [0, 2, 0, 1]);
        assert_eq!(state.centroids[2], [20.0; 3]);
        assert_eq!(state.means[2], [20.0; 3]);
    }

    #[test]
    fn run_stops_when_labels_converge() {
        let points = [gray(0), gray(2), gray(100), gray(102)];
        let mut state = State::new(&points, None, vec![[0.0; 3], [2.0; 3]]);

        let summary = state.run(300, 0.0, &State::assign);
        assert_eq!(summary.stop, Stop::Converged);
        assert_eq!(state.labels, [0, 0, 1, 1]);
        assert_eq!(state.centroids, [[1.0; 3], [101.0; 3]]);
        assert!((summary.inertia - 12.0).abs() < 1e-6);
    }

    #[test]
    fn run_respects_iteration_cap() {
        let points = [gray(0), gray(2), gray(100), gray(102)];
        let mut state = State::new(&points, None, vec![[0.0; 3], [2.0; 3]]);

        let summary = state.run(1, 0.0, &State::assign);
        assert_eq!(summary.stop, Stop::MaxIterations);
        assert_eq!(summary.iterations, 1);
        // labels are reassigned to the moved centroids
        assert_eq!(state.labels, [0, 0, 1, 1]);
    }
}
