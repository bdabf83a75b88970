//! Per-cluster redundancy analysis.
//!
//! For every cluster of at least two tests: score pairwise semantic
//! similarity, pick the member that should survive, gate the rest on
//! similarity and coverage preservation, and emit a finding when anything
//! is actually removable.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::core::{
    ClusterId, ClusterPartition, FindingAnalysis, Priority, RedundancyFinding, TestFeature,
    NOISE_CLUSTER,
};
use crate::semantic::cosine_similarity;

/// Minimum cosine similarity to the representative before a member is even
/// considered removable.
pub const SIMILARITY_GATE: f64 = 0.85;

/// Fraction of a candidate's covered lines the representative must also
/// cover. Removal may cost at most 5% of the candidate's lines.
pub const COVERAGE_PRESERVATION_GATE: f64 = 0.95;

/// Member count that forces `high` priority regardless of score.
const LARGE_REDUNDANT_SET: usize = 10;

/// Member count that forces at least `medium` priority.
const MEDIUM_REDUNDANT_SET: usize = 5;

/// Cap on members considered by the coverage-overlap diagnostic.
const OVERLAP_SAMPLE: usize = 10;

/// Analyze every cluster in the partition and return findings sorted by
/// (priority desc, score desc).
pub fn analyze_clusters(
    features: &[TestFeature],
    partition: &ClusterPartition,
) -> Vec<RedundancyFinding> {
    let by_id: HashMap<&str, &TestFeature> = features
        .iter()
        .map(|f| (f.test_id.as_str(), f))
        .collect();

    let mut cluster_ids: Vec<ClusterId> = partition
        .clusters
        .keys()
        .copied()
        .filter(|&id| id != NOISE_CLUSTER)
        .collect();
    cluster_ids.sort_unstable();

    let mut findings: Vec<RedundancyFinding> = cluster_ids
        .par_iter()
        .filter_map(|&cluster_id| {
            let members = &partition.clusters[&cluster_id];
            analyze_one(cluster_id, members, &by_id)
        })
        .collect();

    findings.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.redundancy_score.partial_cmp(&a.redundancy_score).unwrap())
    });
    debug!(findings = findings.len(), "cluster analysis complete");
    findings
}

fn analyze_one(
    cluster_id: ClusterId,
    members: &[String],
    by_id: &HashMap<&str, &TestFeature>,
) -> Option<RedundancyFinding> {
    if members.len() < 2 {
        return None;
    }
    let features: Vec<&TestFeature> = members.iter().map(|id| by_id[id.as_str()]).collect();

    let similarity = similarity_matrix(&features);
    let representative = select_representative(&features, &similarity);
    let redundant = redundant_members(&features, &similarity, representative);
    if redundant.is_empty() {
        return None;
    }

    let score = cluster_score(&similarity);
    let priority = classify_priority(score, redundant.len());
    let saved_ms: u64 = redundant
        .iter()
        .map(|&j| features[j].metadata.execution_time_ms)
        .sum();
    let overlap_pct = coverage_overlap_pct(&features);

    let analysis = FindingAnalysis {
        avg_similarity: score,
        cluster_size: features.len(),
        redundant_count: redundant.len(),
        execution_time_saved_sec: saved_ms as f64 / 1000.0,
        coverage_overlap_pct: overlap_pct,
    };

    Some(RedundancyFinding {
        cluster_id,
        representative: features[representative].test_id.clone(),
        redundant_tests: redundant
            .iter()
            .map(|&j| features[j].test_id.clone())
            .collect(),
        redundancy_score: score,
        recommendation: recommendation_text(score, redundant.len()),
        priority,
        analysis,
    })
}

/// Symmetric k×k cosine matrix with a unit diagonal.
fn similarity_matrix(features: &[&TestFeature]) -> Vec<Vec<f64>> {
    let k = features.len();
    let mut matrix = vec![vec![0.0; k]; k];
    for i in 0..k {
        matrix[i][i] = 1.0;
        for j in (i + 1)..k {
            let s = cosine_similarity(&features[i].vector, &features[j].vector);
            matrix[i][j] = s;
            matrix[j][i] = s;
        }
    }
    matrix
}

/// Pick the member that should survive: most central, cheapest to run,
/// covering the most. Ties break toward the lowest index.
fn select_representative(features: &[&TestFeature], similarity: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, feature) in features.iter().enumerate() {
        let centrality = avg_similarity_to_others(similarity, i);
        let speed = 1.0 / (1.0 + feature.metadata.execution_time_ms as f64 / 1000.0);
        let breadth = (feature.metadata.lines_covered as f64 / 100.0).min(1.0);
        let score = 0.7 * centrality + 0.2 * speed + 0.1 * breadth;
        if score > best_score {
            best_score = score;
            best = i;
        }
    }
    best
}

fn avg_similarity_to_others(similarity: &[Vec<f64>], i: usize) -> f64 {
    let k = similarity.len();
    if k < 2 {
        return 0.0;
    }
    let sum: f64 = (0..k).filter(|&j| j != i).map(|j| similarity[i][j]).sum();
    sum / (k - 1) as f64
}

/// Members similar enough to the representative whose coverage it
/// preserves. Order follows the input member list.
fn redundant_members(
    features: &[&TestFeature],
    similarity: &[Vec<f64>],
    representative: usize,
) -> Vec<usize> {
    let rep_coverage: HashSet<&str> = features[representative]
        .metadata
        .coverage_lines
        .iter()
        .map(String::as_str)
        .collect();

    (0..features.len())
        .filter(|&j| j != representative)
        .filter(|&j| similarity[representative][j] >= SIMILARITY_GATE)
        .filter(|&j| coverage_preserved(&rep_coverage, &features[j].metadata.coverage_lines))
        .collect()
}

/// True when removing the candidate cannot drop more than 5% of its covered
/// lines. Candidates with no coverage have nothing to lose.
fn coverage_preserved(rep_coverage: &HashSet<&str>, candidate_lines: &[String]) -> bool {
    if candidate_lines.is_empty() {
        return true;
    }
    let candidate: HashSet<&str> = candidate_lines.iter().map(String::as_str).collect();
    let retained = candidate.intersection(rep_coverage).count();
    retained as f64 / candidate.len() as f64 >= COVERAGE_PRESERVATION_GATE
}

/// Mean of the upper triangle; 0 when there are no pairs.
fn cluster_score(similarity: &[Vec<f64>]) -> f64 {
    let k = similarity.len();
    if k < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            sum += similarity[i][j];
            pairs += 1;
        }
    }
    sum / pairs as f64
}

fn classify_priority(score: f64, redundant_count: usize) -> Priority {
    if score >= 0.95 || redundant_count >= LARGE_REDUNDANT_SET {
        Priority::High
    } else if score >= 0.85 || redundant_count >= MEDIUM_REDUNDANT_SET {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn recommendation_text(score: f64, redundant_count: usize) -> String {
    let pct = (score * 100.0).round() as i64;
    if score >= 0.95 {
        format!(
            "Remove {redundant_count} highly redundant tests ({pct}% similar). \
             Keep only the representative test for this functionality."
        )
    } else if score >= 0.85 {
        format!(
            "Consider consolidating {redundant_count} similar tests ({pct}% overlap). \
             Review for potential merge or parameterization opportunities."
        )
    } else {
        format!(
            "Review {redundant_count} related tests for optimization opportunities. \
             Minor redundancy detected ({pct}% similarity)."
        )
    }
}

/// Mean pairwise Jaccard of raw coverage over the first ten members.
/// Bounded so a thousand-member cluster does not trigger quadratic set work.
fn coverage_overlap_pct(features: &[&TestFeature]) -> f64 {
    let sample: Vec<HashSet<&str>> = features
        .iter()
        .take(OVERLAP_SAMPLE)
        .map(|f| f.metadata.coverage_lines.iter().map(String::as_str).collect())
        .collect();
    if sample.len() < 2 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..sample.len() {
        for j in (i + 1)..sample.len() {
            sum += jaccard(&sample[i], &sample[j]);
            pairs += 1;
        }
    }
    sum / pairs as f64 * 100.0
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
