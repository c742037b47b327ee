//! Typed error taxonomy for the retrieval pipeline.
//!
//! Every pipeline outcome the caller must distinguish gets its own variant;
//! the HTTP layer and CLI map these to responses without string matching.
//! Storage faults from the backing store are wrapped rather than flattened
//! so their source chain survives.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required input field was missing or empty. No side effect occurred.
    #[error("invalid input: {0}")]
    Input(String),

    /// The embedding provider failed. Fatal at query time; at ingestion time
    /// individual sentence failures are recovered locally and never surface
    /// as this variant.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// A referenced chat or document does not exist, or the document has no
    /// segments to retrieve from.
    #[error("not found: {0}")]
    NotFound(String),

    /// Retrieval completed but no segment cleared the relevance threshold.
    /// An expected outcome, not a system fault.
    #[error("no relevant information found")]
    NoRelevantContent,

    /// The generation service call failed or exceeded its limits.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Stored data violates an invariant: mixed vector dimensionality within
    /// a document, or a segment with missing text or vector.
    #[error("data integrity fault: {0}")]
    Integrity(String),

    /// The backing store failed.
    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
