//! Corpus-wide TF-IDF vectorization of token bags.

use std::collections::HashMap;

use crate::core::{SemanticVector, SEMANTIC_SIZE};

/// Upper bound on vocabulary size before the positional resize to
/// `SEMANTIC_SIZE`.
pub const MAX_VOCABULARY: usize = 768;

/// A fitted vocabulary: terms in their positional order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Fit a vocabulary over the whole corpus: the `min(768, distinct)`
    /// most frequent terms, then sorted lexicographically so positions are
    /// stable across input orderings.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            for term in doc {
                *counts.entry(term).or_insert(0) += 1;
            }
        }

        let mut by_frequency: Vec<(&str, usize)> = counts.into_iter().collect();
        // Ties broken lexicographically so the cut at MAX_VOCABULARY is stable
        by_frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        by_frequency.truncate(MAX_VOCABULARY);

        let mut terms: Vec<String> = by_frequency
            .into_iter()
            .map(|(term, _)| term.to_string())
            .collect();
        terms.sort();

        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, index }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }
}

/// Vectorize every document against a shared vocabulary.
///
/// Returns one `SEMANTIC_SIZE` vector per document, in document order. Each
/// vector is L2-normalized unless the document contributed no vocabulary
/// terms, in which case it is the zero vector. An empty corpus yields no
/// vectors.
pub fn vectorize(documents: &[Vec<String>]) -> Vec<SemanticVector> {
    if documents.is_empty() {
        return Vec::new();
    }

    let vocabulary = Vocabulary::fit(documents);
    let idf = inverse_document_frequencies(documents, &vocabulary);

    documents
        .iter()
        .map(|doc| vectorize_one(doc, &vocabulary, &idf))
        .collect()
}

fn inverse_document_frequencies(documents: &[Vec<String>], vocabulary: &Vocabulary) -> Vec<f64> {
    let n = documents.len() as f64;
    let mut df = vec![0usize; vocabulary.len()];
    for doc in documents {
        let mut seen = vec![false; vocabulary.len()];
        for term in doc {
            if let Some(pos) = vocabulary.position(term) {
                if !seen[pos] {
                    seen[pos] = true;
                    df[pos] += 1;
                }
            }
        }
    }
    // The +1 keeps terms shared by every document contributing; without it
    // two identical tests would vectorize to zero and never cluster.
    df.iter()
        .map(|&count| {
            if count > 0 {
                (n / count as f64).ln() + 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn vectorize_one(doc: &[String], vocabulary: &Vocabulary, idf: &[f64]) -> SemanticVector {
    let mut tfidf = vec![0.0; vocabulary.len()];
    if !doc.is_empty() {
        let total = doc.len() as f64;
        for term in doc {
            if let Some(pos) = vocabulary.position(term) {
                tfidf[pos] += 1.0;
            }
        }
        for (value, &weight) in tfidf.iter_mut().zip(idf) {
            *value = *value / total * weight;
        }
    }

    l2_normalize(&mut tfidf);
    resize_positional(tfidf)
}

fn l2_normalize(vector: &mut [f64]) {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Positional resize to `SEMANTIC_SIZE`: prefix-truncate or zero-pad. The
/// prefix keeps positions comparable across tests; a top-k cut would not.
fn resize_positional(mut vector: Vec<f64>) -> SemanticVector {
    match vector.len().cmp(&SEMANTIC_SIZE) {
        std::cmp::Ordering::Greater => {
            vector.truncate(SEMANTIC_SIZE);
            vector
        }
        std::cmp::Ordering::Less => {
            vector.resize(SEMANTIC_SIZE, 0.0);
            vector
        }
        std::cmp::Ordering::Equal => vector,
    }
}

/// Cosine similarity between two equal-length vectors. Zero vectors have
/// similarity 0 with everything.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
