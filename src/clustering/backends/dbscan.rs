//! DBSCAN over cosine distance, with a derived default eps.

use std::collections::VecDeque;

use crate::core::Result;

use super::super::{ClusterRequest, ClusterResponse, ClusteringBackend};
use super::{distance_matrix, response_from_assignments};

const UNVISITED: usize = usize::MAX - 1;
const NOISE: usize = usize::MAX;

pub struct DbscanBackend;

impl ClusteringBackend for DbscanBackend {
    fn fit(&self, request: &ClusterRequest) -> Result<ClusterResponse> {
        let ids: Vec<String> = request.vectors.iter().map(|(id, _)| id.clone()).collect();
        let vectors: Vec<Vec<f64>> = request.vectors.iter().map(|(_, v)| v.clone()).collect();
        let n = vectors.len();
        if n == 0 {
            return Ok(response_from_assignments(&ids, &[]));
        }

        let matrix = distance_matrix(&vectors);
        let eps = request
            .params
            .dbscan_eps
            .unwrap_or_else(|| derive_eps(&matrix));
        // A suite smaller than min_samples could never grow a core point;
        // clamp so a pair of identical tests still clusters.
        let min_samples = request.params.dbscan_min_samples.clamp(1, n);

        let assignments = scan(&matrix, eps, min_samples);
        Ok(response_from_assignments(&ids, &assignments))
    }
}

/// Default eps: the median nearest-neighbor distance, bounded away from
/// zero so exact duplicates still count as neighbors. The median keeps one
/// outlier from inflating eps until everything merges.
fn derive_eps(matrix: &[Vec<f64>]) -> f64 {
    let n = matrix.len();
    if n < 2 {
        return 0.1;
    }
    let mut nearest: Vec<f64> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| matrix[i][j])
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    nearest.sort_by(|a, b| a.partial_cmp(b).unwrap());
    nearest[(n - 1) / 2].max(1e-6).min(1.0)
}

fn scan(matrix: &[Vec<f64>], eps: f64, min_samples: usize) -> Vec<usize> {
    let n = matrix.len();
    let mut labels = vec![UNVISITED; n];
    let mut cluster = 0usize;

    for point in 0..n {
        if labels[point] != UNVISITED {
            continue;
        }
        let neighbors = region_query(matrix, point, eps);
        if neighbors.len() < min_samples {
            labels[point] = NOISE;
            continue;
        }

        labels[point] = cluster;
        let mut queue: VecDeque<usize> = neighbors.into_iter().collect();
        while let Some(next) = queue.pop_front() {
            if labels[next] == NOISE {
                labels[next] = cluster;
            }
            if labels[next] != UNVISITED {
                continue;
            }
            labels[next] = cluster;
            let next_neighbors = region_query(matrix, next, eps);
            if next_neighbors.len() >= min_samples {
                queue.extend(next_neighbors);
            }
        }
        cluster += 1;
    }
    labels
}

/// All points within eps of `point`, the point itself included.
fn region_query(matrix: &[Vec<f64>], point: usize, eps: f64) -> Vec<usize> {
    (0..matrix.len())
        .filter(|&j| matrix[point][j] <= eps)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{Algorithm, ClusteringParams};
    use crate::core::NOISE_CLUSTER;

    fn request(vectors: Vec<(String, Vec<f64>)>) -> ClusterRequest {
        ClusterRequest {
            vectors,
            algorithm: Algorithm::Dbscan,
            params: ClusteringParams::default(),
            debug: false,
        }
    }

    #[test]
    fn test_pair_of_identical_tests_clusters() {
        let req = request(vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0]),
        ]);
        let response = DbscanBackend.fit(&req).unwrap();
        assert_eq!(response.clusters.len(), 1);
        assert_eq!(response.clusters[&0].len(), 2);
    }

    #[test]
    fn test_outliers_land_in_noise_bucket() {
        let mut vectors = Vec::new();
        for i in 0..5 {
            vectors.push((format!("core{i}"), vec![1.0, 0.0, 0.0]));
        }
        vectors.push(("outlier1".to_string(), vec![0.0, 1.0, 0.0]));
        vectors.push(("outlier2".to_string(), vec![0.0, 0.0, 1.0]));

        let mut req = request(vectors);
        req.params.dbscan_eps = Some(0.05);
        let response = DbscanBackend.fit(&req).unwrap();

        let noise = &response.clusters[&NOISE_CLUSTER];
        assert!(noise.contains(&"outlier1".to_string()));
        assert!(noise.contains(&"outlier2".to_string()));
        assert_eq!(response.clusters[&0].len(), 5);
    }

    #[test]
    fn test_empty_input() {
        let response = DbscanBackend.fit(&request(vec![])).unwrap();
        assert!(response.clusters.is_empty());
    }

    #[test]
    fn test_derived_eps_groups_duplicates() {
        // No explicit eps: three exact duplicates and one far point
        let vectors = vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0]),
            ("c".to_string(), vec![1.0, 0.0]),
            ("d".to_string(), vec![0.0, 1.0]),
        ];
        let response = DbscanBackend.fit(&request(vectors)).unwrap();
        let dup_cluster = response
            .clusters
            .iter()
            .find(|(&id, _)| id != NOISE_CLUSTER)
            .map(|(_, members)| members.clone())
            .unwrap();
        assert!(dup_cluster.contains(&"a".to_string()));
        assert!(dup_cluster.contains(&"c".to_string()));
    }
}
