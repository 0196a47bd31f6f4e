//! Face-embedding identity matching.
//!
//! Embeddings come from an external recognition engine; this module only
//! compares a query vector against the enrolled gallery and reports the best
//! candidate. Degenerate vectors (zero norm, length mismatch) score zero and
//! therefore never match — ambiguity fails closed.

use serde::Serialize;

/// A fixed-length face embedding from the external recognition engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

/// An enrolled identity's stored embedding, read-only comparison input.
#[derive(Debug, Clone)]
pub struct EnrolledFace {
    pub identity_id: String,
    pub label: String,
    pub embedding: Embedding,
}

/// Outcome of a gallery comparison. `identity_id` is set only when the best
/// similarity clears the acceptance threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    pub similarity: f32,
    pub identity_id: Option<String>,
}

impl MatchResult {
    fn no_match(similarity: f32) -> Self {
        Self {
            matched: false,
            similarity,
            identity_id: None,
        }
    }
}

/// Strategy seam for embedding comparison.
pub trait Matcher {
    fn compare(&self, query: &Embedding, gallery: &[EnrolledFace], threshold: f32) -> MatchResult;
}

/// Cosine-similarity matcher: dot(a,b)/(‖a‖·‖b‖), best candidate wins.
pub struct CosineMatcher;

impl Matcher for CosineMatcher {
    fn compare(&self, query: &Embedding, gallery: &[EnrolledFace], threshold: f32) -> MatchResult {
        let mut best: Option<(&EnrolledFace, f32)> = None;

        for candidate in gallery {
            let similarity = cosine_similarity(&query.values, &candidate.embedding.values);
            let is_better = match best {
                None => true,
                Some((_, prev)) => similarity > prev,
            };
            if is_better {
                best = Some((candidate, similarity));
            }
        }

        let Some((candidate, similarity)) = best else {
            return MatchResult::no_match(0.0);
        };

        if similarity >= threshold {
            tracing::debug!(
                identity = %candidate.identity_id,
                similarity,
                "embedding match accepted"
            );
            MatchResult {
                matched: true,
                similarity,
                identity_id: Some(candidate.identity_id.clone()),
            }
        } else {
            tracing::debug!(similarity, threshold, "best embedding below threshold");
            MatchResult::no_match(similarity)
        }
    }
}

/// Cosine similarity in [-1, 1]. Zero-norm or mismatched-length inputs
/// return 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrolled(id: &str, values: Vec<f32>) -> EnrolledFace {
        EnrolledFace {
            identity_id: id.to_string(),
            label: "default".to_string(),
            embedding: Embedding { values },
        }
    }

    #[test]
    fn identical_embedding_scores_one_and_wins() {
        let query = Embedding {
            values: vec![0.3, -0.5, 0.8, 0.1],
        };
        let gallery = vec![
            enrolled("other", vec![0.9, 0.1, -0.2, 0.4]),
            enrolled("target", query.values.clone()),
        ];

        let result = CosineMatcher.compare(&query, &gallery, 0.5);
        assert!(result.matched);
        assert_eq!(result.identity_id.as_deref(), Some("target"));
        assert!((result.similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scale_does_not_change_similarity() {
        let query = Embedding {
            values: vec![1.0, 2.0, 3.0],
        };
        let gallery = vec![enrolled("scaled", vec![2.0, 4.0, 6.0])];
        let result = CosineMatcher.compare(&query, &gallery, 0.5);
        assert!(result.matched);
        assert!((result.similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn below_threshold_is_no_match_but_reports_score() {
        let query = Embedding {
            values: vec![1.0, 0.0],
        };
        let gallery = vec![enrolled("orthogonal", vec![0.0, 1.0])];
        let result = CosineMatcher.compare(&query, &gallery, 0.5);
        assert!(!result.matched);
        assert!(result.identity_id.is_none());
        assert!(result.similarity.abs() < 1e-6);
    }

    #[test]
    fn empty_gallery_is_no_match() {
        let query = Embedding {
            values: vec![1.0, 0.0],
        };
        let result = CosineMatcher.compare(&query, &[], 0.5);
        assert!(!result.matched);
        assert_eq!(result.similarity, 0.0);
    }

    #[test]
    fn zero_vector_fails_closed() {
        let query = Embedding {
            values: vec![0.0, 0.0, 0.0],
        };
        let gallery = vec![enrolled("anyone", vec![1.0, 1.0, 1.0])];
        let result = CosineMatcher.compare(&query, &gallery, 0.5);
        assert!(!result.matched);
        assert_eq!(result.similarity, 0.0);
    }

    #[test]
    fn length_mismatch_fails_closed() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_score_negative() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }
}
