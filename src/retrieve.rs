//! Threshold-based segment retrieval.
//!
//! Scores every segment of a document against the query vector with cosine
//! similarity and keeps those at or above the relevance threshold,
//! preserving ingestion order. There is no ranking and no "closest N"
//! fallback: an empty result is a legitimate outcome the query pipeline
//! reports as `NoRelevantContent`.
//!
//! Before scoring, the segment list is validated: every segment must carry
//! non-empty text and a vector of the same dimensionality as the query.
//! Mixed dimensionalities (e.g. after an embedding model change) are a data
//! integrity fault, reported distinctly from "nothing cleared the threshold".

use crate::embedding::cosine_similarity;
use crate::error::{Error, Result};
use crate::models::Segment;

/// Return the segments whose cosine similarity to `query_vector` is at
/// least `threshold`, in original segment order.
pub fn retrieve<'a>(
    segments: &'a [Segment],
    query_vector: &[f32],
    threshold: f32,
) -> Result<Vec<&'a Segment>> {
    validate(segments, query_vector)?;

    Ok(segments
        .iter()
        .filter(|segment| cosine_similarity(query_vector, &segment.vector) >= threshold)
        .collect())
}

fn validate(segments: &[Segment], query_vector: &[f32]) -> Result<()> {
    if query_vector.is_empty() {
        return Err(Error::Integrity("query vector is empty".to_string()));
    }

    for (idx, segment) in segments.iter().enumerate() {
        if segment.text.is_empty() {
            return Err(Error::Integrity(format!("segment {} has empty text", idx)));
        }
        if segment.vector.is_empty() {
            return Err(Error::Integrity(format!(
                "segment {} has empty vector",
                idx
            )));
        }
        if segment.vector.len() != query_vector.len() {
            return Err(Error::Integrity(format!(
                "segment {} has dimensionality {} but query vector has {}",
                idx,
                segment.vector.len(),
                query_vector.len()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, vector: Vec<f32>) -> Segment {
        Segment {
            text: text.to_string(),
            vector,
        }
    }

    #[test]
    fn test_filter_matches_threshold_in_original_order() {
        // Similarities against [1, 0]: 0.1, 0.5, 0.4, 0.9 (unit-circle points).
        let segments = vec![
            seg("a", vec![0.1, (1.0f32 - 0.01).sqrt()]),
            seg("b", vec![0.5, 0.75f32.sqrt()]),
            seg("c", vec![0.4, (1.0f32 - 0.16).sqrt()]),
            seg("d", vec![0.9, (1.0f32 - 0.81).sqrt()]),
        ];
        let query = vec![1.0, 0.0];

        // 0.395 rather than 0.4 exactly: the 0.4-similarity segment is built
        // from f32 square roots and may land a few ulps below 0.4.
        let hits = retrieve(&segments, &query, 0.395).unwrap();
        let texts: Vec<&str> = hits.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_boundary_similarity_included() {
        let segments = vec![seg("exact", vec![0.4, (1.0f32 - 0.16).sqrt()])];
        // Allow for f32 rounding right at the operating point.
        let hits = retrieve(&segments, &[1.0, 0.0], 0.399_999).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_orthogonal_segments_yield_empty() {
        let segments = vec![seg("x", vec![0.0, 1.0]), seg("y", vec![0.0, -2.0])];
        let hits = retrieve(&segments, &[1.0, 0.0], 0.3).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_zero_magnitude_segment_scores_zero() {
        let segments = vec![seg("zero", vec![0.0, 0.0])];
        let hits = retrieve(&segments, &[1.0, 0.0], 0.1).unwrap();
        assert!(hits.is_empty());
        // And with a threshold of 0 (or below), the zero score qualifies.
        let hits = retrieve(&segments, &[1.0, 0.0], 0.0).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_dimensionality_mismatch_is_integrity_error() {
        let segments = vec![seg("ok", vec![1.0, 0.0]), seg("bad", vec![1.0, 0.0, 0.0])];
        let err = retrieve(&segments, &[1.0, 0.0], 0.3).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn test_corrupt_segment_is_integrity_error() {
        let segments = vec![seg("", vec![1.0, 0.0])];
        assert!(matches!(
            retrieve(&segments, &[1.0, 0.0], 0.3).unwrap_err(),
            Error::Integrity(_)
        ));

        let segments = vec![seg("text", vec![])];
        assert!(matches!(
            retrieve(&segments, &[1.0, 0.0], 0.3).unwrap_err(),
            Error::Integrity(_)
        ));
    }

    #[test]
    fn test_empty_document_yields_empty() {
        let hits = retrieve(&[], &[1.0, 0.0], 0.3).unwrap();
        assert!(hits.is_empty());
    }
}
