//! Clustering dispatch: hand semantic vectors to a clustering collaborator
//! and validate the partition it returns.
//!
//! The collaborator contract is a serialization boundary. A request carries
//! `(test_id, vector)` pairs, an algorithm selector and its parameters; a
//! response carries `cluster_id -> members` plus free-form metadata. The
//! bundled backends run in-process, but anything honoring the payload shape
//! (subprocess, RPC) can stand in for them.

pub mod backends;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::time::Duration;

use tracing::info;

use crate::core::{ClusterId, ClusterPartition, Error, Result, TestFeature, NOISE_CLUSTER};

/// Algorithm selector for the clustering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Kmeans,
    #[default]
    Dbscan,
    Hierarchical,
}

impl Algorithm {
    pub fn display_name(&self) -> &str {
        match self {
            Algorithm::Kmeans => "kmeans",
            Algorithm::Dbscan => "dbscan",
            Algorithm::Hierarchical => "hierarchical",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kmeans" | "k-means" => Ok(Algorithm::Kmeans),
            "dbscan" => Ok(Algorithm::Dbscan),
            "hierarchical" => Ok(Algorithm::Hierarchical),
            other => Err(format!("unknown clustering algorithm: {other}")),
        }
    }
}

/// Linkage criterion for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Single,
    Complete,
    Average,
    #[default]
    Ward,
}

impl std::str::FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "ward" => Ok(Linkage::Ward),
            other => Err(format!("unknown linkage: {other}")),
        }
    }
}

/// Parameters forwarded to the clustering collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringParams {
    pub min_cluster_size: usize,
    pub max_clusters: usize,
    pub dbscan_eps: Option<f64>,
    pub dbscan_min_samples: usize,
    pub hierarchical_n_clusters: Option<usize>,
    pub hierarchical_linkage: Linkage,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            max_clusters: 50,
            dbscan_eps: None,
            dbscan_min_samples: 3,
            hierarchical_n_clusters: None,
            hierarchical_linkage: Linkage::Ward,
        }
    }
}

/// Wire-shaped request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub vectors: Vec<(String, Vec<f64>)>,
    pub algorithm: Algorithm,
    pub params: ClusteringParams,
    pub debug: bool,
}

/// Wire-shaped response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub clusters: HashMap<ClusterId, Vec<String>>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A clustering collaborator: fits a partition over labeled vectors.
pub trait ClusteringBackend: Send {
    fn fit(&self, request: &ClusterRequest) -> Result<ClusterResponse>;
}

/// Resolve the bundled in-process backend for an algorithm.
pub fn backend_for(algorithm: Algorithm) -> Box<dyn ClusteringBackend> {
    match algorithm {
        Algorithm::Kmeans => Box::new(backends::KmeansBackend),
        Algorithm::Dbscan => Box::new(backends::DbscanBackend),
        Algorithm::Hierarchical => Box::new(backends::HierarchicalBackend),
    }
}

/// Dispatch one clustering call, guard it with `timeout`, and validate the
/// returned partition against the inputs.
pub fn dispatch(
    features: &[TestFeature],
    algorithm: Algorithm,
    params: &ClusteringParams,
    timeout: Duration,
) -> Result<ClusterPartition> {
    // Sorted inputs make every backend independent of store iteration order.
    let mut vectors: Vec<(String, Vec<f64>)> = features
        .iter()
        .map(|f| (f.test_id.clone(), f.vector.clone()))
        .collect();
    vectors.sort_by(|a, b| a.0.cmp(&b.0));

    let request = ClusterRequest {
        vectors,
        algorithm,
        params: params.clone(),
        debug: false,
    };

    info!(
        algorithm = algorithm.display_name(),
        tests = request.vectors.len(),
        "dispatching clustering request"
    );

    let response = run_with_timeout(request.clone(), timeout)?;
    let partition = normalize_response(response, &request)?;
    validate_partition(&partition, &request)?;
    Ok(partition)
}

/// Run the backend on a worker thread so a wedged collaborator cannot hang
/// the run past its deadline. The rest of the pipeline blocks here; one
/// dispatcher call is in flight per run.
fn run_with_timeout(request: ClusterRequest, timeout: Duration) -> Result<ClusterResponse> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let backend = backend_for(request.algorithm);
        let _ = tx.send(backend.fit(&request));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::clustering("timeout")),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(Error::clustering("clustering backend terminated without a result"))
        }
    }
}

/// Relabel non-noise clusters to consecutive ids (ordered by their smallest
/// member) and demote clusters below `min_cluster_size` to the noise bucket.
fn normalize_response(
    response: ClusterResponse,
    request: &ClusterRequest,
) -> Result<ClusterPartition> {
    let mut noise: Vec<String> = Vec::new();
    let mut kept: Vec<Vec<String>> = Vec::new();

    let mut ordered: Vec<(ClusterId, Vec<String>)> = response.clusters.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.1.iter()
            .min()
            .cmp(&b.1.iter().min())
            .then_with(|| a.0.cmp(&b.0))
    });

    for (id, mut members) in ordered {
        members.sort();
        if id == NOISE_CLUSTER {
            noise.extend(members);
        } else if members.len() < request.params.min_cluster_size {
            noise.extend(members);
        } else {
            kept.push(members);
        }
    }

    let mut clusters: HashMap<ClusterId, Vec<String>> = kept
        .into_iter()
        .enumerate()
        .map(|(i, members)| (i as ClusterId, members))
        .collect();
    if !noise.is_empty() {
        noise.sort();
        clusters.insert(NOISE_CLUSTER, noise);
    }
    Ok(ClusterPartition::from_clusters(clusters))
}

/// Every input test id must appear in exactly one cluster; ids the backend
/// invented are rejected.
fn validate_partition(partition: &ClusterPartition, request: &ClusterRequest) -> Result<()> {
    let inputs: HashSet<&str> = request.vectors.iter().map(|(id, _)| id.as_str()).collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(inputs.len());
    for members in partition.clusters.values() {
        for id in members {
            if !inputs.contains(id.as_str()) {
                return Err(Error::ClusterConsistency(format!(
                    "collaborator returned unknown test id {id}"
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::ClusterConsistency(format!(
                    "test id {id} assigned to more than one cluster"
                )));
            }
        }
    }

    if seen.len() != inputs.len() {
        let missing = inputs.difference(&seen).next().unwrap();
        return Err(Error::ClusterConsistency(format!(
            "test id {missing} missing from the returned partition"
        )));
    }
    Ok(())
}
