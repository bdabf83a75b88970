use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::clustering::{Algorithm, Linkage};
use crate::config::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Human-readable Markdown report
    Markdown,
    /// JSON for programmatic consumption
    Json,
    /// YAML for programmatic consumption
    Yaml,
    /// Standalone HTML page
    Html,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Html => OutputFormat::Html,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AlgorithmArg {
    /// Centroid clustering with silhouette-selected k
    Kmeans,
    /// Density clustering with a noise bucket (default)
    Dbscan,
    /// Agglomerative clustering
    Hierarchical,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Kmeans => Algorithm::Kmeans,
            AlgorithmArg::Dbscan => Algorithm::Dbscan,
            AlgorithmArg::Hierarchical => Algorithm::Hierarchical,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LinkageArg {
    Single,
    Complete,
    Average,
    Ward,
}

impl From<LinkageArg> for Linkage {
    fn from(value: LinkageArg) -> Self {
        match value {
            LinkageArg::Single => Linkage::Single,
            LinkageArg::Complete => Linkage::Complete,
            LinkageArg::Average => Linkage::Average,
            LinkageArg::Ward => Linkage::Ward,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "reductor")]
#[command(about = "Test suite redundancy analyzer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./reductor.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a recorded test run for redundant tests
    Analyze {
        /// Path to the JSON run file
        run_file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: FormatArg,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clustering algorithm
        #[arg(short, long, value_enum)]
        algorithm: Option<AlgorithmArg>,

        /// Similarity level considered redundant, in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        /// Upper bound on clusters
        #[arg(long)]
        max_clusters: Option<usize>,

        /// Smallest cluster worth analyzing
        #[arg(long)]
        min_cluster_size: Option<usize>,

        /// Clustering deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Number of worker threads (0 = all cores)
        #[arg(long, short = 'j', default_value = "0")]
        jobs: usize,

        /// Keep lines covered by most of the suite in the fingerprints
        #[arg(long)]
        keep_shared_coverage: bool,

        /// Disable IDF weighting of fingerprint hashes
        #[arg(long)]
        no_idf_weighting: bool,

        /// DBSCAN neighborhood radius in (0, 1]
        #[arg(long)]
        dbscan_eps: Option<f64>,

        /// DBSCAN core-point threshold
        #[arg(long)]
        dbscan_min_samples: Option<usize>,

        /// Hierarchical target cluster count
        #[arg(long)]
        hierarchical_clusters: Option<usize>,

        /// Hierarchical linkage criterion
        #[arg(long, value_enum)]
        linkage: Option<LinkageArg>,
    },

    /// Write a starter reductor.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Check that a run file parses and report its stats
    Validate {
        /// Path to the JSON run file
        run_file: PathBuf,
    },
}

/// Resolve the worker count: explicit `--jobs` wins, 0 means all cores.
pub fn get_worker_count(jobs: usize) -> usize {
    if jobs == 0 {
        num_cpus::get()
    } else {
        jobs
    }
}

/// Size the global rayon pool. Ignores the error when a pool already
/// exists (tests call this repeatedly).
pub fn configure_thread_pool(workers: usize) {
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global();
}
