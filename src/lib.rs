// Export modules for library usage
pub mod analysis;
pub mod cli;
pub mod clustering;
pub mod commands;
pub mod config;
pub mod core;
pub mod features;
pub mod fingerprint;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod semantic;

// Re-export commonly used types
pub use crate::core::{
    AnalysisReport, ClusterPartition, CoverageLine, Fingerprint, Priority, Recommendation,
    RedundancyFinding, RunFailure, RunMetrics, RunSuccess, SemanticVector, TestFeature,
    TestRecord, FINGERPRINT_SIZE, NOISE_CLUSTER, SEMANTIC_SIZE,
};

pub use crate::clustering::{Algorithm, ClusteringParams, Linkage};
pub use crate::config::{OutputFormat, RedundancyConfig};
pub use crate::io::{create_writer, JsonStore, OutputWriter, TestRunReader};
pub use crate::pipeline::{execute, CancelToken};
