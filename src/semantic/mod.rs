//! Semantic vectors: TF-IDF over normalized test-source token bags.

mod tokenizer;
mod vectorizer;

pub use tokenizer::{extract_method_body, tokenize};
pub use vectorizer::{cosine_similarity, vectorize, Vocabulary, MAX_VOCABULARY};

use std::path::Path;

use tracing::debug;

use crate::core::{Error, Result, SemanticVector, TestRecord};

/// Build one semantic vector per test, sharing a single corpus vocabulary.
///
/// Source resolution per test:
/// - inline `source_text` from the store wins;
/// - otherwise the test's `path` is read from disk;
/// - a path that does not exist fails the run with a per-test
///   vectorization error (one bad test invalidates the vocabulary);
/// - a test with no source at all (empty path) degenerates to the synthetic
///   `test_method <method>` document, which is not an error.
pub fn build_vectors(tests: &[TestRecord]) -> Result<Vec<SemanticVector>> {
    let documents = tests
        .iter()
        .map(tokenize_test)
        .collect::<Result<Vec<_>>>()?;
    debug!(documents = documents.len(), "tokenized test corpus");
    Ok(vectorize(&documents))
}

fn tokenize_test(test: &TestRecord) -> Result<Vec<String>> {
    let source = resolve_source(test)?;
    let body = source
        .as_deref()
        .and_then(|text| extract_method_body(text, &test.method))
        .unwrap_or_else(|| synthetic_document(test));
    Ok(tokenize(&test.method, &body))
}

fn resolve_source(test: &TestRecord) -> Result<Option<String>> {
    if let Some(text) = &test.source_text {
        return Ok(Some(text.clone()));
    }
    if test.path.is_empty() {
        return Ok(None);
    }
    let path = Path::new(&test.path);
    if !path.exists() {
        return Err(Error::vectorization(
            &test.id,
            format!("source file not found: {}", test.path),
        ));
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| Error::vectorization(&test.id, format!("failed to read source: {e}")))
}

fn synthetic_document(test: &TestRecord) -> String {
    format!("{} {}", test.path, test.method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SEMANTIC_SIZE;
    use indoc::indoc;

    fn test_with_source(id: &str, source: &str) -> TestRecord {
        let mut record = TestRecord::new(id);
        record.source_text = Some(source.to_string());
        record
    }

    #[test]
    fn test_build_vectors_for_inline_sources() {
        let source = indoc! {r#"
            class AuthTest {
                public function testLogin() {
                    $this->assertTrue($this->post('/login'));
                }
            }
        "#};
        let tests = vec![
            test_with_source("AuthTest::testLogin", source),
            test_with_source("AuthTest::testLogin2", source),
        ];
        let vectors = build_vectors(&tests).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), SEMANTIC_SIZE);
    }

    #[test]
    fn test_missing_source_file_is_per_test_error() {
        let mut record = TestRecord::new("Gone::testX");
        record.path = "/nonexistent/path/GoneTest.php".to_string();
        let err = build_vectors(&[record]).unwrap_err();
        match err {
            Error::Vectorization { test_id, .. } => assert_eq!(test_id, "Gone::testX"),
            other => panic!("expected vectorization error, got {other}"),
        }
    }

    #[test]
    fn test_unavailable_source_degenerates_to_synthetic_document() {
        // Empty path and no inline source: no error, marker-only document.
        let record = TestRecord::new("::testOrphan");
        let vectors = build_vectors(&[record]).unwrap();
        assert_eq!(vectors.len(), 1);
        // The lone document defines the whole vocabulary, so its vector is
        // nonzero and unit-length.
        let norm: f64 = vectors[0].iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_corpus_yields_no_vectors() {
        assert!(build_vectors(&[]).unwrap().is_empty());
    }
}
