//! Document-frequency aggregation and IDF weighting for coverage lines.

use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::core::TestRecord;

/// Count, for every distinct coverage-line key, how many tests cover it.
///
/// Aggregation runs in parallel across tests; each test's set is
/// deduplicated before counting.
pub fn document_frequencies(tests: &[TestRecord]) -> HashMap<String, usize> {
    let counts: DashMap<String, usize> = DashMap::new();

    tests.par_iter().for_each(|test| {
        for key in test.coverage_keys() {
            *counts.entry(key).or_insert(0) += 1;
        }
    });

    counts.into_iter().collect()
}

/// Document-frequency threshold above which a line counts as shared.
///
/// Smaller suites use a stricter fraction so that near-universal bootstrap
/// lines still get excluded, while a handful of tests sharing setup code
/// does not empty every coverage set.
pub fn shared_line_threshold(total_tests: usize) -> f64 {
    let n = total_tests as f64;
    if total_tests > 100 {
        (0.6 * n).max(60.0)
    } else if total_tests > 50 {
        (0.7 * n).max(35.0)
    } else {
        (0.8 * n).max(2.0)
    }
}

/// Remove lines whose document frequency meets the shared threshold from
/// every per-test set.
pub fn exclude_shared_lines(
    per_test: &mut [HashSet<String>],
    df: &HashMap<String, usize>,
    total_tests: usize,
) -> usize {
    let threshold = shared_line_threshold(total_tests);
    let shared: HashSet<&String> = df
        .iter()
        .filter(|(_, &count)| count as f64 >= threshold)
        .map(|(key, _)| key)
        .collect();

    if shared.is_empty() {
        return 0;
    }
    for set in per_test.iter_mut() {
        set.retain(|key| !shared.contains(key));
    }
    shared.len()
}

/// IDF weight per surviving line: `log(N / df) + 1`.
///
/// Panics when a surviving line has no document-frequency entry; the df map
/// was built from the same sets, so a missing entry is a programmer error.
pub fn idf_weights(
    per_test: &[HashSet<String>],
    df: &HashMap<String, usize>,
    total_tests: usize,
) -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    for set in per_test {
        for key in set {
            if weights.contains_key(key) {
                continue;
            }
            let count = *df
                .get(key)
                .unwrap_or_else(|| panic!("line {key} present in a test but df = 0"));
            let idf = (total_tests as f64 / count as f64).ln() + 1.0;
            weights.insert(key.clone(), idf);
        }
    }
    weights
}
