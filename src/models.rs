//! Core data models used throughout Documate.
//!
//! These types represent the documents, segments, chats, and turns that flow
//! through the ingestion and question-answering pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sentence-level unit of document text paired with its embedding vector.
///
/// Segments are only ever stored fully formed: a sentence whose embedding
/// failed is dropped during ingestion, never persisted with an empty vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub vector: Vec<f32>,
}

/// A user's document: an ordered sequence of segments, unique per
/// `(owner_id, file_name)`. Re-ingestion replaces the segments wholesale.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub file_name: String,
    pub segments: Vec<Segment>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Lightweight document listing entry (no segment payload).
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub segment_count: i64,
    pub updated_at: i64,
}

/// A chat bound to one document (by file name) for its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub chat_id: String,
    pub owner_id: String,
    pub file_name: String,
    pub turns: Vec<Turn>,
    pub created_at: i64,
}

/// One question/answer exchange. Append-only; ordering is insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one ingestion call.
///
/// `sentences_dropped` counts per-sentence embedding failures, which are
/// tolerated: a partially failed ingestion still produces a usable document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub file_name: String,
    pub sentences_total: usize,
    pub segments_written: usize,
    pub sentences_dropped: usize,
}

/// Successful answer to one question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}
