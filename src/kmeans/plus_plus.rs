//! Greedy k-means++ seeding, weighted by the pixel count of each color.

use super::{squared_distance, to_f32};
use rand::{distributions::WeightedIndex, prelude::Distribution};
use rand_distr::{weighted_alias::WeightedAliasIndex, Uniform};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// Samples the index of the first centroid with probability proportional to its pixel count.
fn first_index(rng: &mut Xoroshiro128PlusPlus, len: usize, weights: Option<&[u32]>) -> usize {
    // WeightedAliasIndex::new only fails on an empty or all zero input,
    // neither of which a ColorCounts implementor produces for len > 0
    let alias = weights
        .map(|weights| WeightedAliasIndex::new(weights.iter().copied().map(u64::from).collect()));

    match alias {
        Some(Ok(distribution)) => distribution.sample(rng),
        _ => Uniform::new(0, len).sample(rng),
    }
}

/// Chooses `k` initial centroids for the given colors.
///
/// `seeds` are taken as the first centroids.
/// Each further centroid is the best of `2 + ln(k)` candidates sampled with probability
/// proportional to weight times the squared distance to the nearest chosen centroid,
/// where the best candidate leaves the smallest total weighted squared distance.
/// Colors already chosen as centroids have zero distance and so are never sampled again,
/// unless every color coincides with a centroid.
pub(super) fn initial_centroids(
    points: &[[u8; 3]],
    weights: Option<&[u32]>,
    k: usize,
    seeds: &[[f32; 3]],
    rng: &mut Xoroshiro128PlusPlus,
) -> Vec<[f32; 3]> {
    let len = points.len();
    let weight = |i: usize| weights.map_or(1.0, |weights| f64::from(weights[i]));

    let mut centroids = Vec::with_capacity(k);
    centroids.extend(seeds.iter().take(k).copied());
    if centroids.len() == k || len == 0 {
        return centroids;
    }

    if centroids.is_empty() {
        centroids.push(to_f32(points[first_index(rng, len, weights)]));
    }

    let mut min_distances = points
        .iter()
        .map(|&point| {
            let point = to_f32(point);
            let nearest = centroids
                .iter()
                .map(|&centroid| squared_distance(point, centroid))
                .fold(f32::INFINITY, f32::min);
            f64::from(nearest)
        })
        .collect::<Vec<_>>();

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let trials = 2 + (k as f64).ln() as usize;

    let mut candidate_distances = vec![0.0; len];
    let mut best_distances = vec![0.0; len];

    while centroids.len() < k {
        let potentials = min_distances
            .iter()
            .enumerate()
            .map(|(i, &d)| weight(i) * d)
            .collect::<Vec<_>>();

        let distribution = WeightedIndex::new(&potentials).ok();

        let mut best: Option<(f64, usize)> = None;
        for _ in 0..trials {
            let candidate = match &distribution {
                Some(distribution) => distribution.sample(rng),
                None => Uniform::new(0, len).sample(rng),
            };

            let center = to_f32(points[candidate]);
            let mut potential = 0.0;
            for (i, (&point, &current)) in points.iter().zip(&min_distances).enumerate() {
                let d = f64::from(squared_distance(to_f32(point), center)).min(current);
                candidate_distances[i] = d;
                potential += weight(i) * d;
            }

            if best.map_or(true, |(best, _)| potential < best) {
                best = Some((potential, candidate));
                std::mem::swap(&mut best_distances, &mut candidate_distances);
            }
        }

        let Some((_, candidate)) = best else {
            break;
        };

        centroids.push(to_f32(points[candidate]));
        std::mem::swap(&mut min_distances, &mut best_distances);
    }

    centroids
}
