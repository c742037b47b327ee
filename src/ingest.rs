//! Ingestion pipeline orchestration.
//!
//! Coordinates the full upload flow: segmentation → embedding → storage.
//! Embedding calls for the sentences of one document fan out concurrently
//! (bounded by `embedding.concurrency`) and fan back in keyed by sentence
//! index, so ingestion order is restored regardless of completion order.
//!
//! A failed sentence embedding is non-fatal: the sentence is dropped and
//! ingestion proceeds, so a partially failed upload still yields a usable
//! (smaller) document. Re-ingesting the same `(owner_id, file_name)`
//! replaces the stored segments wholesale.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::models::{IngestReport, Segment};
use crate::segment::segment_text;
use crate::store::Store;

pub async fn run_ingest(
    store: &dyn Store,
    embedder: Arc<dyn Embedder>,
    config: &Config,
    owner_id: &str,
    file_name: &str,
    text: &str,
) -> Result<IngestReport> {
    if owner_id.trim().is_empty() {
        return Err(Error::Input("owner_id is required".to_string()));
    }
    if file_name.trim().is_empty() {
        return Err(Error::Input("file_name is required".to_string()));
    }
    if text.is_empty() {
        return Err(Error::Input("text is required".to_string()));
    }

    let sentences = segment_text(text, config.chunking.chunk_size);
    let vectors = embed_ordered(embedder, &sentences, config.embedding.concurrency).await;

    let mut segments = Vec::with_capacity(sentences.len());
    let mut dropped = 0usize;
    for (sentence, vector) in sentences.iter().zip(vectors.into_iter()) {
        match vector {
            Some(v) if !v.is_empty() => segments.push(Segment {
                text: sentence.clone(),
                vector: v,
            }),
            _ => dropped += 1,
        }
    }

    store.replace_segments(owner_id, file_name, &segments).await?;

    Ok(IngestReport {
        file_name: file_name.to_string(),
        sentences_total: sentences.len(),
        segments_written: segments.len(),
        sentences_dropped: dropped,
    })
}

/// Embed `sentences` with at most `concurrency` calls in flight.
///
/// Returns one slot per input sentence, in input order; a failed embedding
/// leaves `None` in its slot. Dropping the returned future aborts any
/// in-flight embedding tasks with it.
async fn embed_ordered(
    embedder: Arc<dyn Embedder>,
    sentences: &[String],
    concurrency: usize,
) -> Vec<Option<Vec<f32>>> {
    let concurrency = concurrency.max(1);
    let expected_dims = embedder.dims();
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; sentences.len()];
    let mut tasks: JoinSet<(usize, Option<Vec<f32>>)> = JoinSet::new();

    for (idx, sentence) in sentences.iter().enumerate() {
        while tasks.len() >= concurrency {
            collect_one(&mut tasks, &mut slots, expected_dims).await;
        }

        let embedder = embedder.clone();
        let sentence = sentence.clone();
        tasks.spawn(async move {
            match embedder.embed(&sentence).await {
                Ok(vector) => (idx, Some(vector)),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping sentence: embedding failed");
                    (idx, None)
                }
            }
        });
    }

    while !tasks.is_empty() {
        collect_one(&mut tasks, &mut slots, expected_dims).await;
    }

    slots
}

async fn collect_one(
    tasks: &mut JoinSet<(usize, Option<Vec<f32>>)>,
    slots: &mut [Option<Vec<f32>>],
    expected_dims: usize,
) {
    if let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, Some(vector))) => {
                // A wrong-sized vector would poison the document with mixed
                // dimensionalities; treat it like a failed embedding.
                if expected_dims > 0 && vector.len() != expected_dims {
                    tracing::warn!(
                        got = vector.len(),
                        expected = expected_dims,
                        "dropping sentence: unexpected embedding dimensionality"
                    );
                    slots[idx] = None;
                } else {
                    slots[idx] = Some(vector);
                }
            }
            Ok((idx, None)) => slots[idx] = None,
            Err(e) => {
                tracing::warn!(error = %e, "embedding task failed to join");
            }
        }
    }
}
