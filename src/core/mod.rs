pub mod cache;
pub mod errors;
pub mod types;

pub use errors::{Error, Result};
pub use types::{
    AnalysisReport, ClusterId, ClusterPartition, CoverageLine, FeatureMetadata, FindingAnalysis,
    Fingerprint, PotentialSavings, Priority, Recommendation, RecommendedAction, RedundancyFinding,
    RunFailure, RunMetrics, RunSuccess, SemanticVector, TestFeature, TestRecord, FINGERPRINT_SIZE,
    NOISE_CLUSTER, SEMANTIC_SIZE,
};
