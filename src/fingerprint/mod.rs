//! Coverage fingerprints: per-test MinHash sketches of covered lines.
//!
//! Each test's `(file, line)` set is sketched into a 256-position signature.
//! Ubiquitous lines can be excluded up front and the remaining lines weighted
//! by inverse document frequency, so the sketch reflects what a test covers
//! that its peers do not.

mod idf;
mod minhash;

pub use idf::{document_frequencies, exclude_shared_lines, idf_weights, shared_line_threshold};
pub use minhash::{line_hashes, seed_triples, SeedTriple};

use std::collections::HashMap;

use tracing::debug;

use crate::core::cache::HashLruCache;
use crate::core::{Fingerprint, TestRecord, FINGERPRINT_SIZE};

/// Behavior toggles for the fingerprint builder.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintOptions {
    /// Drop lines covered by (roughly) most of the suite before sketching.
    pub exclude_shared_coverage: bool,
    /// Weight surviving lines by `log(N/df) + 1`.
    pub use_idf_weighting: bool,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            exclude_shared_coverage: true,
            use_idf_weighting: true,
        }
    }
}

/// Builds coverage fingerprints for one test run.
///
/// Owns the per-line hash cache for the duration of the run; the cache is
/// dropped with the builder.
pub struct FingerprintBuilder {
    options: FingerprintOptions,
    seeds: [SeedTriple; FINGERPRINT_SIZE],
    cache: HashLruCache<Vec<u64>>,
}

impl FingerprintBuilder {
    pub fn new(options: FingerprintOptions) -> Self {
        Self {
            options,
            seeds: seed_triples(),
            cache: HashLruCache::new(),
        }
    }

    /// Sketch every test in the batch. Returns `test_id -> fingerprint`.
    pub fn build(&mut self, tests: &[TestRecord]) -> HashMap<String, Fingerprint> {
        let total = tests.len();
        let df = document_frequencies(tests);
        let mut sets: Vec<_> = tests.iter().map(|t| t.coverage_keys()).collect();

        if self.options.exclude_shared_coverage {
            let removed = exclude_shared_lines(&mut sets, &df, total);
            if removed > 0 {
                debug!(shared_lines = removed, "excluded shared coverage lines");
            }
        }

        let weights = if self.options.use_idf_weighting {
            idf_weights(&sets, &df, total)
        } else {
            HashMap::new()
        };

        let mut fingerprints = HashMap::with_capacity(total);
        for (test, lines) in tests.iter().zip(&sets) {
            fingerprints.insert(test.id.clone(), self.sketch(lines, &weights));
        }
        debug!(cache = %self.cache.stats(), "fingerprint hash cache");
        fingerprints
    }

    fn sketch(
        &mut self,
        lines: &std::collections::HashSet<String>,
        weights: &HashMap<String, f64>,
    ) -> Fingerprint {
        if lines.is_empty() {
            return vec![0.0; FINGERPRINT_SIZE];
        }

        let mut signature = minhash::empty_signature();
        for key in lines {
            let weight = if self.options.use_idf_weighting {
                weights.get(key).copied().unwrap_or(1.0)
            } else {
                1.0
            };
            let seeds = &self.seeds;
            let hashes = self.cache.get_or_insert_with(key, || line_hashes(key, seeds));
            minhash::fold_line(&mut signature, hashes, weight);
        }
        minhash::normalize(signature)
    }
}

/// Positional near-equality between two fingerprints: the fraction of
/// positions within `1e-4` of each other. Diagnostic helper only; the
/// cluster analyzer compares semantic vectors, never fingerprints.
pub fn similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "fingerprint dimension mismatch: have {}, want {}",
        b.len(),
        a.len()
    );
    if a.is_empty() {
        return 0.0;
    }
    let matching = a
        .iter()
        .zip(b)
        .filter(|(x, y)| (**x - **y).abs() < 1e-4)
        .count();
    matching as f64 / a.len() as f64
}
