//! The analysis pipeline: an explicit stage graph from store to findings.
//!
//! Stages run in a fixed order — read, feature extraction (fingerprints and
//! semantic vectors in parallel), assembly, clustering, analysis,
//! composition — and each stage consumes one owned input and produces one
//! owned output. Cancellation is checked between stages; a cancelled run
//! yields no partial output.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::analysis;
use crate::clustering;
use crate::config::RedundancyConfig;
use crate::core::{
    ClusterPartition, Error, Result, RunFailure, RunMetrics, RunSuccess, TestRecord,
};
use crate::features;
use crate::fingerprint::FingerprintBuilder;
use crate::io::progress::PhaseProgress;
use crate::io::TestRunReader;
use crate::semantic;

/// Coarse-grained cancellation handle shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Run the full pipeline, folding any abort into a `RunFailure` envelope.
pub fn execute(
    store: &dyn TestRunReader,
    config: &RedundancyConfig,
    cancel: &CancelToken,
) -> std::result::Result<RunSuccess, RunFailure> {
    let started = Instant::now();
    run(store, config, cancel, started).map_err(|error| RunFailure {
        errors: vec![error.to_string()],
        execution_time_sec: started.elapsed().as_secs_f64(),
    })
}

fn run(
    store: &dyn TestRunReader,
    config: &RedundancyConfig,
    cancel: &CancelToken,
    started: Instant,
) -> Result<RunSuccess> {
    config.validate()?;

    let stats = store.stats();
    let tests = store.tests();
    info!(
        tests = stats.test_count,
        coverage_lines = stats.coverage_line_count,
        files = stats.unique_files,
        "loaded test run"
    );
    cancel.checkpoint()?;

    // Fingerprints and semantic vectors are independent; run them on
    // parallel workers. Each builder owns its caches, nothing is shared.
    let progress = PhaseProgress::spinner("Extracting features");
    let (fingerprints, vectors) = rayon::join(
        || FingerprintBuilder::new(config.fingerprint_options()).build(tests),
        || semantic::build_vectors(tests),
    );
    let vectors = vectors?;
    info!(fingerprints = fingerprints.len(), "feature extraction done");
    progress.finish();
    cancel.checkpoint()?;

    let feature_records = features::assemble(tests, vectors);

    let partition = if tests.len() < 2 {
        trivial_partition(tests)
    } else {
        let progress = PhaseProgress::spinner("Clustering");
        let partition = clustering::dispatch(
            &feature_records,
            config.algorithm,
            &config.clustering_params(),
            config.timeout(),
        )?;
        progress.finish();
        partition
    };
    info!(clusters = partition.cluster_count(), "clustering done");
    cancel.checkpoint()?;

    let progress = PhaseProgress::spinner("Analyzing clusters");
    let findings = analysis::analyze_clusters(&feature_records, &partition);
    progress.finish();
    cancel.checkpoint()?;

    let metrics = RunMetrics::compute(tests.len(), partition.cluster_count(), &findings);
    let recommendations = analysis::compose(findings, &feature_records);

    Ok(RunSuccess {
        recommendations,
        partition,
        metrics,
        execution_time_sec: started.elapsed().as_secs_f64(),
    })
}

/// Zero or one test: nothing to cluster, nothing to find.
fn trivial_partition(tests: &[TestRecord]) -> ClusterPartition {
    let mut clusters = HashMap::new();
    if !tests.is_empty() {
        clusters.insert(0, tests.iter().map(|t| t.id.clone()).collect());
    }
    ClusterPartition::from_clusters(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoverageLine;
    use crate::io::JsonStore;

    fn duplicate_test(id: &str) -> TestRecord {
        let mut record = TestRecord::new(id);
        record.execution_time_ms = 100;
        record.source_text = Some(
            "class T { public function m() { $this->assertTrue(true); } }".to_string(),
        );
        record.method = "m".to_string();
        record.coverage = vec![
            CoverageLine::new("a.php", 1),
            CoverageLine::new("a.php", 2),
            CoverageLine::new("b.php", 7),
        ];
        record
    }

    #[test]
    fn test_empty_run_succeeds_with_no_findings() {
        let store = JsonStore::from_records(vec![]);
        let outcome = execute(&store, &RedundancyConfig::default(), &CancelToken::new()).unwrap();
        assert!(outcome.recommendations.is_empty());
        assert_eq!(outcome.metrics.total_tests, 0);
        assert_eq!(outcome.metrics.reduction_percentage, 0.0);
    }

    #[test]
    fn test_single_test_succeeds_with_no_findings() {
        let store = JsonStore::from_records(vec![duplicate_test("a::t1")]);
        let outcome = execute(&store, &RedundancyConfig::default(), &CancelToken::new()).unwrap();
        assert!(outcome.recommendations.is_empty());
        assert_eq!(outcome.metrics.total_tests, 1);
    }

    #[test]
    fn test_cancelled_before_work_yields_no_findings() {
        let store = JsonStore::from_records(vec![duplicate_test("a::t1")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let failure =
            execute(&store, &RedundancyConfig::default(), &cancel).unwrap_err();
        assert_eq!(failure.errors, vec!["Run cancelled".to_string()]);
    }

    #[test]
    fn test_invalid_config_aborts_before_work() {
        let store = JsonStore::from_records(vec![]);
        let config = RedundancyConfig {
            threshold: 7.0,
            ..Default::default()
        };
        let failure = execute(&store, &config, &CancelToken::new()).unwrap_err();
        assert!(failure.errors[0].contains("Configuration error"));
    }
}
