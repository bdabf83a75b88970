//! Common type definitions used across the codebase

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of positions in a coverage fingerprint.
pub const FINGERPRINT_SIZE: usize = 256;

/// Number of components in a semantic vector.
pub const SEMANTIC_SIZE: usize = 384;

/// A single covered source line, identified by file path and 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoverageLine {
    pub file: String,
    pub line: u32,
}

impl CoverageLine {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Canonical `"<file>:<line>"` key. Equality of keys is bytewise.
    pub fn key(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// A single test as recorded in a test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    /// `<class_or_path>::<method>` identifier.
    pub id: String,
    /// Source file path of the test class, if known.
    pub path: String,
    /// Test method name.
    pub method: String,
    /// Wall-clock execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
    /// Fraction of recent runs that failed, in [0, 1].
    #[serde(default)]
    pub recent_fail_rate: f64,
    /// Raw test source text; empty when unavailable.
    #[serde(default)]
    pub source_text: Option<String>,
    /// Covered lines, deduplicated per test.
    #[serde(default)]
    pub coverage: Vec<CoverageLine>,
}

impl TestRecord {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let (path, method) = split_test_id(&id);
        Self {
            id,
            path,
            method,
            execution_time_ms: 0,
            recent_fail_rate: 0.0,
            source_text: None,
            coverage: Vec::new(),
        }
    }

    /// Deduplicated set of canonical line keys.
    pub fn coverage_keys(&self) -> std::collections::HashSet<String> {
        self.coverage.iter().map(CoverageLine::key).collect()
    }
}

/// Split a `<class_or_path>::<method>` id into its two halves.
///
/// Ids without a separator keep the whole string as the path and get an
/// empty method.
pub fn split_test_id(id: &str) -> (String, String) {
    match id.rsplit_once("::") {
        Some((path, method)) => (path.to_string(), method.to_string()),
        None => (id.to_string(), String::new()),
    }
}

/// Length-256 MinHash sketch of a test's coverage set. Every element is
/// in [0, 1]; tests with empty (post-exclusion) coverage get the zero vector.
pub type Fingerprint = Vec<f64>;

/// Length-384 L2-normalized TF-IDF vector. Positions are comparable across
/// tests within one run.
pub type SemanticVector = Vec<f64>;

/// Per-test feature record handed to clustering and analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFeature {
    pub test_id: String,
    pub vector: SemanticVector,
    pub metadata: FeatureMetadata,
}

/// Metadata carried alongside each semantic vector.
///
/// `coverage_lines` holds the raw pre-exclusion line keys; the analyzer's
/// coverage-preservation gate depends on seeing the unfiltered set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub coverage_lines: Vec<String>,
    pub execution_time_ms: u64,
    pub lines_covered: usize,
    pub path: String,
    pub method: String,
}

/// Cluster id assigned by the clustering collaborator. `-1` is the DBSCAN
/// noise bucket.
pub type ClusterId = i32;

/// The noise bucket: members are excluded from analysis but do not make the
/// partition inconsistent.
pub const NOISE_CLUSTER: ClusterId = -1;

/// A partition of test ids into clusters, plus its inverse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterPartition {
    pub clusters: HashMap<ClusterId, Vec<String>>,
    pub assignments: HashMap<String, ClusterId>,
}

impl ClusterPartition {
    pub fn from_clusters(clusters: HashMap<ClusterId, Vec<String>>) -> Self {
        let assignments = clusters
            .iter()
            .flat_map(|(&id, members)| members.iter().map(move |m| (m.clone(), id)))
            .collect();
        Self {
            clusters,
            assignments,
        }
    }

    /// Number of non-noise clusters.
    pub fn cluster_count(&self) -> usize {
        self.clusters
            .keys()
            .filter(|&&id| id != NOISE_CLUSTER)
            .count()
    }

    /// Total members across all buckets, noise included.
    pub fn member_count(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }
}

/// Ordinal priority attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn display_name(&self) -> &str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Per-cluster diagnostic figures attached to a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingAnalysis {
    pub avg_similarity: f64,
    pub cluster_size: usize,
    pub redundant_count: usize,
    pub execution_time_saved_sec: f64,
    pub coverage_overlap_pct: f64,
}

/// One redundancy finding: a cluster, its surviving representative, and the
/// members the analyzer judged removable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedundancyFinding {
    pub cluster_id: ClusterId,
    pub representative: String,
    pub redundant_tests: Vec<String>,
    pub redundancy_score: f64,
    pub recommendation: String,
    pub priority: Priority,
    pub analysis: FindingAnalysis,
}

/// Recommended action, derived from the redundancy score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Merge,
    Consolidate,
    Review,
    Monitor,
}

/// Savings estimate attached by the recommendation composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialSavings {
    pub time_saved_ms: u64,
    pub time_saved_sec: f64,
    pub lines_reduction: usize,
    pub test_count_reduction: usize,
    pub percentage_reduction: f64,
}

/// A finding enriched with action, rationale and savings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub finding: RedundancyFinding,
    pub action: RecommendedAction,
    pub rationale: Vec<String>,
    pub numeric_priority: f64,
    pub potential_savings: PotentialSavings,
}

/// Run-level metrics reported with every successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_tests: usize,
    pub clusters_found: usize,
    pub redundancy_findings: usize,
    pub redundant_tests: usize,
    /// `redundant_tests / total_tests * 100`, two decimals, 0 for empty runs.
    pub reduction_percentage: f64,
}

impl RunMetrics {
    pub fn compute(total_tests: usize, clusters_found: usize, findings: &[RedundancyFinding]) -> Self {
        let redundant_tests: usize = findings.iter().map(|f| f.redundant_tests.len()).sum();
        let reduction_percentage = if total_tests == 0 {
            0.0
        } else {
            let pct = redundant_tests as f64 / total_tests as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        };
        Self {
            total_tests,
            clusters_found,
            redundancy_findings: findings.len(),
            redundant_tests,
            reduction_percentage,
        }
    }
}

/// Successful run envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSuccess {
    pub recommendations: Vec<Recommendation>,
    pub partition: ClusterPartition,
    pub metrics: RunMetrics,
    pub execution_time_sec: f64,
}

/// Failed run envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    pub errors: Vec<String>,
    pub execution_time_sec: f64,
}

/// Report envelope serialized by every output writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub algorithm: String,
    pub metrics: RunMetrics,
    pub recommendations: Vec<Recommendation>,
}
