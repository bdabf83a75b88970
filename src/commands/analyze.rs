//! The `analyze` command: run the pipeline over a run file and write a
//! report.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

use crate::cli::{AlgorithmArg, FormatArg, LinkageArg};
use crate::config::{OutputFormat, RedundancyConfig};
use crate::core::AnalysisReport;
use crate::io::{create_writer, print_terminal_summary, JsonStore};
use crate::pipeline::{self, CancelToken};

/// Everything the analyze handler needs, assembled from CLI arguments.
pub struct AnalyzeOptions {
    pub run_file: PathBuf,
    pub config_path: Option<PathBuf>,
    pub format: FormatArg,
    pub output: Option<PathBuf>,
    pub algorithm: Option<AlgorithmArg>,
    pub threshold: Option<f64>,
    pub max_clusters: Option<usize>,
    pub min_cluster_size: Option<usize>,
    pub timeout: Option<u64>,
    pub keep_shared_coverage: bool,
    pub no_idf_weighting: bool,
    pub dbscan_eps: Option<f64>,
    pub dbscan_min_samples: Option<usize>,
    pub hierarchical_clusters: Option<usize>,
    pub linkage: Option<LinkageArg>,
}

pub fn run(options: AnalyzeOptions) -> anyhow::Result<()> {
    let config = resolve_config(&options)?;
    let store = JsonStore::load(&options.run_file)?;

    let outcome = match pipeline::execute(&store, &config, &CancelToken::new()) {
        Ok(success) => success,
        Err(failure) => {
            for error in &failure.errors {
                eprintln!("error: {error}");
            }
            bail!(
                "analysis failed after {:.1}s",
                failure.execution_time_sec
            );
        }
    };

    let report = AnalysisReport {
        generated_at: chrono::Utc::now(),
        algorithm: config.algorithm.display_name().to_string(),
        metrics: outcome.metrics.clone(),
        recommendations: outcome.recommendations,
    };

    write_report(&report, config.output_format, options.output.as_deref())?;
    print_terminal_summary(&report);
    Ok(())
}

/// Layer CLI overrides over the file-based configuration.
fn resolve_config(options: &AnalyzeOptions) -> anyhow::Result<RedundancyConfig> {
    let mut config = match &options.config_path {
        Some(path) => RedundancyConfig::load(path)?,
        None => {
            let default_path = Path::new("reductor.toml");
            if default_path.exists() {
                RedundancyConfig::load(default_path)?
            } else {
                RedundancyConfig::default()
            }
        }
    };

    if let Some(algorithm) = options.algorithm {
        config.algorithm = algorithm.into();
    }
    if let Some(threshold) = options.threshold {
        config.threshold = threshold;
    }
    if let Some(max_clusters) = options.max_clusters {
        config.max_clusters = max_clusters;
    }
    if let Some(min_cluster_size) = options.min_cluster_size {
        config.min_cluster_size = min_cluster_size;
    }
    if let Some(timeout) = options.timeout {
        config.timeout_secs = timeout;
    }
    if options.keep_shared_coverage {
        config.exclude_shared_coverage = false;
    }
    if options.no_idf_weighting {
        config.use_idf_weighting = false;
    }
    if let Some(eps) = options.dbscan_eps {
        config.dbscan_eps = Some(eps);
    }
    if let Some(min_samples) = options.dbscan_min_samples {
        config.dbscan_min_samples = min_samples;
    }
    if let Some(n) = options.hierarchical_clusters {
        config.hierarchical_n_clusters = Some(n);
    }
    if let Some(linkage) = options.linkage {
        config.hierarchical_linkage = linkage.into();
    }
    config.output_format = options.format.into();

    config.validate()?;
    Ok(config)
}

fn write_report(
    report: &AnalysisReport,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            create_writer(format, file).write_report(report)?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            create_writer(format, std::io::stdout()).write_report(report)?;
        }
    }
    Ok(())
}
