//! Feature assembly: bind each test's semantic vector to its metadata.

use crate::core::{FeatureMetadata, SemanticVector, TestFeature, TestRecord};

/// Pure combinator pairing test records with their semantic vectors.
///
/// `metadata.coverage_lines` carries the raw pre-exclusion line keys; the
/// analyzer's coverage-preservation gate must see what a test actually
/// covers, not the sketching input.
pub fn assemble(tests: &[TestRecord], vectors: Vec<SemanticVector>) -> Vec<TestFeature> {
    debug_assert_eq!(tests.len(), vectors.len());

    tests
        .iter()
        .zip(vectors)
        .map(|(test, vector)| TestFeature {
            test_id: test.id.clone(),
            vector,
            metadata: FeatureMetadata {
                coverage_lines: test.coverage.iter().map(|l| l.key()).collect(),
                execution_time_ms: test.execution_time_ms,
                lines_covered: test.coverage.len(),
                path: test.path.clone(),
                method: test.method.clone(),
            },
        })
        .collect()
}
