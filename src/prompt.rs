//! Grounded prompt assembly.
//!
//! Builds the deterministic prompt sent to the generation service:
//! instruction line, retrieved segment texts joined by newline, a blank
//! line, then the question. No truncation happens here — callers needing a
//! size cap must limit the segment count before assembly, and an oversized
//! prompt is reported by the generation call as a provider error.

/// Assemble the grounded prompt from retrieved segment texts and a question.
pub fn assemble<S: AsRef<str>>(segments: &[S], question: &str) -> String {
    let context = segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Using the following segments, answer the question:\n\n{}\n\nQuestion: {}",
        context, question
    )
}
