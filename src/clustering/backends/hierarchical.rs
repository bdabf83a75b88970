//! Agglomerative hierarchical clustering over cosine distance.
//!
//! Inter-cluster distances are recomputed from the point matrix on every
//! merge. Stale-index shortcuts are how agglomerative implementations go
//! non-deterministic; recomputation is O(n^3) but this runs on test suites,
//! not point clouds.

use crate::core::Result;

use super::super::{ClusterRequest, ClusterResponse, ClusteringBackend, Linkage};
use super::{distance_matrix, response_from_assignments};

/// Merge cut-off used when no target cluster count is configured.
const DEFAULT_CUT_DISTANCE: f64 = 0.5;

pub struct HierarchicalBackend;

impl ClusteringBackend for HierarchicalBackend {
    fn fit(&self, request: &ClusterRequest) -> Result<ClusterResponse> {
        let ids: Vec<String> = request.vectors.iter().map(|(id, _)| id.clone()).collect();
        let vectors: Vec<Vec<f64>> = request.vectors.iter().map(|(_, v)| v.clone()).collect();
        let n = vectors.len();
        if n == 0 {
            return Ok(response_from_assignments(&ids, &[]));
        }

        let matrix = distance_matrix(&vectors);
        let target = request.params.hierarchical_n_clusters;
        let linkage = request.params.hierarchical_linkage;

        let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        while clusters.len() > target.unwrap_or(1).max(1) {
            let Some((i, j, distance)) = closest_pair(&clusters, &matrix, linkage) else {
                break;
            };
            if target.is_none() && distance > DEFAULT_CUT_DISTANCE {
                break;
            }
            let merged = clusters.swap_remove(j);
            clusters[i].extend(merged);
            clusters[i].sort_unstable();
            // Keep cluster order stable after swap_remove
            clusters.sort_by_key(|c| c[0]);
        }

        let mut assignments = vec![0usize; n];
        for (cluster_idx, members) in clusters.iter().enumerate() {
            for &point in members {
                assignments[point] = cluster_idx;
            }
        }
        Ok(response_from_assignments(&ids, &assignments))
    }
}

/// The pair of clusters with minimal linkage distance; ties break toward
/// the lexicographically smallest index pair.
fn closest_pair(
    clusters: &[Vec<usize>],
    matrix: &[Vec<f64>],
    linkage: Linkage,
) -> Option<(usize, usize, f64)> {
    if clusters.len() < 2 {
        return None;
    }
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let d = linkage_distance(&clusters[i], &clusters[j], matrix, linkage);
            let better = match best {
                Some((_, _, best_d)) => d < best_d - 1e-12,
                None => true,
            };
            if better {
                best = Some((i, j, d));
            }
        }
    }
    best
}

fn linkage_distance(a: &[usize], b: &[usize], matrix: &[Vec<f64>], linkage: Linkage) -> f64 {
    match linkage {
        Linkage::Single => pairwise(a, b, matrix).fold(f64::INFINITY, f64::min),
        Linkage::Complete => pairwise(a, b, matrix).fold(0.0, f64::max),
        Linkage::Average => {
            let count = (a.len() * b.len()) as f64;
            pairwise(a, b, matrix).sum::<f64>() / count
        }
        // Ward's criterion: merge cost grows with both cluster sizes and
        // the mean squared separation.
        Linkage::Ward => {
            let count = (a.len() * b.len()) as f64;
            let mean_sq = pairwise(a, b, matrix).map(|d| d * d).sum::<f64>() / count;
            let weight = (a.len() * b.len()) as f64 / (a.len() + b.len()) as f64;
            (weight * mean_sq).sqrt()
        }
    }
}

fn pairwise<'a>(
    a: &'a [usize],
    b: &'a [usize],
    matrix: &'a [Vec<f64>],
) -> impl Iterator<Item = f64> + 'a {
    a.iter()
        .flat_map(move |&i| b.iter().map(move |&j| matrix[i][j]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{Algorithm, ClusteringParams};

    fn request(vectors: Vec<(String, Vec<f64>)>, n_clusters: Option<usize>) -> ClusterRequest {
        let params = ClusteringParams {
            hierarchical_n_clusters: n_clusters,
            ..ClusteringParams::default()
        };
        ClusterRequest {
            vectors,
            algorithm: Algorithm::Hierarchical,
            params,
            debug: false,
        }
    }

    fn two_groups() -> Vec<(String, Vec<f64>)> {
        vec![
            ("a0".to_string(), vec![1.0, 0.0, 0.0]),
            ("a1".to_string(), vec![0.98, 0.02, 0.0]),
            ("a2".to_string(), vec![0.99, 0.01, 0.0]),
            ("b0".to_string(), vec![0.0, 0.0, 1.0]),
            ("b1".to_string(), vec![0.0, 0.02, 0.98]),
        ]
    }

    #[test]
    fn test_explicit_cluster_count() {
        let response = HierarchicalBackend
            .fit(&request(two_groups(), Some(2)))
            .unwrap();
        assert_eq!(response.clusters.len(), 2);
    }

    #[test]
    fn test_default_cut_separates_distant_groups() {
        let response = HierarchicalBackend.fit(&request(two_groups(), None)).unwrap();
        assert_eq!(response.clusters.len(), 2);
        let sizes: Vec<usize> = {
            let mut v: Vec<usize> = response.clusters.values().map(Vec::len).collect();
            v.sort_unstable();
            v
        };
        assert_eq!(sizes, vec![2, 3]);
    }

    #[test]
    fn test_single_point() {
        let response = HierarchicalBackend
            .fit(&request(vec![("only".to_string(), vec![1.0])], None))
            .unwrap();
        assert_eq!(response.clusters.len(), 1);
    }

    #[test]
    fn test_deterministic_across_linkages() {
        for linkage in [
            Linkage::Single,
            Linkage::Complete,
            Linkage::Average,
            Linkage::Ward,
        ] {
            let mut req = request(two_groups(), Some(2));
            req.params.hierarchical_linkage = linkage;
            let first = HierarchicalBackend.fit(&req).unwrap();
            let second = HierarchicalBackend.fit(&req).unwrap();
            assert_eq!(first.clusters, second.clusters, "{linkage:?}");
        }
    }
}
