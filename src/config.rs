//! Run configuration: serde-backed, TOML-loadable, validated before any
//! pipeline work starts.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::clustering::{Algorithm, ClusteringParams, Linkage};
use crate::core::{Error, Result};
use crate::fingerprint::FingerprintOptions;

/// Report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Yaml,
    Html,
}

/// Full analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedundancyConfig {
    /// Clustering algorithm handed to the collaborator.
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Documented similarity intent in [0, 1]. The analyzer's hard gates are
    /// constants; this knob records what the operator considers redundant.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Report format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Upper bound on clusters the collaborator may produce.
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,

    /// Clusters smaller than this are folded into the noise bucket.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Reserved: project vectors before clustering.
    #[serde(default)]
    pub use_dimensionality_reduction: bool,

    /// Target dimensionality when reduction is enabled.
    #[serde(default = "default_reduced_dimensions")]
    pub reduced_dimensions: usize,

    /// Clustering collaborator deadline, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// DBSCAN neighborhood radius; derived from the data when absent.
    #[serde(default)]
    pub dbscan_eps: Option<f64>,

    /// DBSCAN core-point threshold.
    #[serde(default = "default_dbscan_min_samples")]
    pub dbscan_min_samples: usize,

    /// Hierarchical target cluster count; distance cut-off when absent.
    #[serde(default)]
    pub hierarchical_n_clusters: Option<usize>,

    /// Hierarchical linkage criterion.
    #[serde(default)]
    pub hierarchical_linkage: Linkage,

    /// Drop lines covered by most of the suite before fingerprinting.
    #[serde(default = "default_true")]
    pub exclude_shared_coverage: bool,

    /// Weight fingerprint hashes by inverse document frequency.
    #[serde(default = "default_true")]
    pub use_idf_weighting: bool,
}

fn default_threshold() -> f64 {
    0.85
}

fn default_max_clusters() -> usize {
    50
}

fn default_min_cluster_size() -> usize {
    2
}

fn default_reduced_dimensions() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_dbscan_min_samples() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            threshold: default_threshold(),
            output_format: OutputFormat::default(),
            max_clusters: default_max_clusters(),
            min_cluster_size: default_min_cluster_size(),
            use_dimensionality_reduction: false,
            reduced_dimensions: default_reduced_dimensions(),
            timeout_secs: default_timeout_secs(),
            dbscan_eps: None,
            dbscan_min_samples: default_dbscan_min_samples(),
            hierarchical_n_clusters: None,
            hierarchical_linkage: Linkage::default(),
            exclude_shared_coverage: true,
            use_idf_weighting: true,
        }
    }
}

impl RedundancyConfig {
    /// Load from a TOML file. Missing keys fall back to defaults; the
    /// result is validated before it is returned.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Config(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_clusters == 0 {
            return Err(Error::Config("max_clusters must be positive".to_string()));
        }
        if self.min_cluster_size == 0 {
            return Err(Error::Config("min_cluster_size must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        if self.dbscan_min_samples == 0 {
            return Err(Error::Config(
                "dbscan_min_samples must be positive".to_string(),
            ));
        }
        if let Some(eps) = self.dbscan_eps {
            if !(eps > 0.0 && eps <= 1.0) {
                return Err(Error::Config(format!(
                    "dbscan_eps must be in (0, 1], got {eps}"
                )));
            }
        }
        if let Some(n) = self.hierarchical_n_clusters {
            if n == 0 {
                return Err(Error::Config(
                    "hierarchical_n_clusters must be positive".to_string(),
                ));
            }
        }
        if self.use_dimensionality_reduction && self.reduced_dimensions == 0 {
            return Err(Error::Config(
                "reduced_dimensions must be positive when reduction is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn clustering_params(&self) -> ClusteringParams {
        ClusteringParams {
            min_cluster_size: self.min_cluster_size,
            max_clusters: self.max_clusters,
            dbscan_eps: self.dbscan_eps,
            dbscan_min_samples: self.dbscan_min_samples,
            hierarchical_n_clusters: self.hierarchical_n_clusters,
            hierarchical_linkage: self.hierarchical_linkage,
        }
    }

    pub fn fingerprint_options(&self) -> FingerprintOptions {
        FingerprintOptions {
            exclude_shared_coverage: self.exclude_shared_coverage,
            use_idf_weighting: self.use_idf_weighting,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Starter config written by `reductor init`.
pub const STARTER_CONFIG: &str = r#"# reductor configuration

# Clustering algorithm: kmeans, dbscan or hierarchical
algorithm = "dbscan"

# Similarity level you consider redundant (documentation only; the
# analyzer's removal gates are fixed)
threshold = 0.85

# Report format: markdown, json, yaml or html
output_format = "markdown"

max_clusters = 50
min_cluster_size = 2

# Clustering collaborator deadline in seconds
timeout_secs = 300

# DBSCAN knobs; eps is derived from the data when omitted
# dbscan_eps = 0.15
dbscan_min_samples = 3

# Hierarchical knobs; omit n_clusters to cut by distance
# hierarchical_n_clusters = 10
hierarchical_linkage = "ward"

# Coverage fingerprinting
exclude_shared_coverage = true
use_idf_weighting = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(RedundancyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_algorithm_is_dbscan() {
        assert_eq!(RedundancyConfig::default().algorithm, Algorithm::Dbscan);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = RedundancyConfig {
            threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = RedundancyConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_eps_rejected() {
        let config = RedundancyConfig {
            dbscan_eps: Some(0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_starter_config_parses_and_validates() {
        let config: RedundancyConfig = toml::from_str(STARTER_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.algorithm, Algorithm::Dbscan);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RedundancyConfig = toml::from_str("algorithm = \"kmeans\"").unwrap();
        assert_eq!(config.algorithm, Algorithm::Kmeans);
        assert_eq!(config.max_clusters, 50);
        assert!(config.exclude_shared_coverage);
    }
}
