//! Deterministic k-means with silhouette-driven k selection.

use crate::core::Result;

use super::super::{ClusterRequest, ClusterResponse, ClusteringBackend};
use super::{cosine_distance, distance_matrix, response_from_assignments, silhouette_score};

const MAX_ITERATIONS: usize = 100;

pub struct KmeansBackend;

impl ClusteringBackend for KmeansBackend {
    fn fit(&self, request: &ClusterRequest) -> Result<ClusterResponse> {
        let ids: Vec<String> = request.vectors.iter().map(|(id, _)| id.clone()).collect();
        let vectors: Vec<Vec<f64>> = request.vectors.iter().map(|(_, v)| v.clone()).collect();
        let n = vectors.len();

        // Too few points to split: everything in one cluster
        if n <= 2 {
            return Ok(response_from_assignments(&ids, &vec![0; n]));
        }

        let matrix = distance_matrix(&vectors);
        let k_max = request.params.max_clusters.min(n - 1);

        let mut best: Option<(f64, Vec<usize>, usize)> = None;
        for k in 2..=k_max.max(2) {
            let assignments = lloyd(&vectors, k);
            let score = silhouette_score(&matrix, &assignments, k);
            let better = match &best {
                Some((best_score, _, _)) => score > *best_score + 1e-12,
                None => true,
            };
            if better {
                best = Some((score, assignments, k));
            }
        }

        let (_, assignments, _) = best.expect("k sweep always evaluates at least k = 2");
        Ok(response_from_assignments(&ids, &assignments))
    }
}

/// Lloyd's algorithm with farthest-point seeding. Ties in both seeding and
/// assignment break toward the lowest index, so the result is a pure
/// function of the input ordering (which the dispatcher has sorted).
fn lloyd(vectors: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = vectors.len();
    let dim = vectors[0].len();
    let mut centers = seed_centers(vectors, k);
    let mut assignments = vec![0usize; n];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, vector) in vectors.iter().enumerate() {
            let nearest = nearest_center(vector, &centers);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (vector, &a) in vectors.iter().zip(&assignments) {
            counts[a] += 1;
            for (s, v) in sums[a].iter_mut().zip(vector) {
                *s += v;
            }
        }
        for (center, (sum, &count)) in centers.iter_mut().zip(sums.iter().zip(&counts)) {
            if count > 0 {
                *center = sum.iter().map(|s| s / count as f64).collect();
            }
            // Empty centers keep their previous position
        }
    }
    assignments
}

/// Farthest-point seeding: start from index 0, then repeatedly take the
/// point farthest from its nearest chosen center.
fn seed_centers(vectors: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut centers = vec![vectors[0].clone()];
    while centers.len() < k {
        let mut best_idx = 0;
        let mut best_distance = -1.0;
        for (i, vector) in vectors.iter().enumerate() {
            let nearest = centers
                .iter()
                .map(|c| cosine_distance(vector, c))
                .fold(f64::INFINITY, f64::min);
            if nearest > best_distance + 1e-12 {
                best_distance = nearest;
                best_idx = i;
            }
        }
        centers.push(vectors[best_idx].clone());
    }
    centers
}

fn nearest_center(vector: &[f64], centers: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, center) in centers.iter().enumerate() {
        let d = cosine_distance(vector, center);
        if d < best_distance - 1e-12 {
            best_distance = d;
            best = i;
        }
    }
    best
}
