//! End-to-end question answering.
//!
//! One pipeline run per question: resolve the chat, embed the question,
//! retrieve relevant segments from the bound document, assemble the grounded
//! prompt, call the generation service, and append the turn. Every step can
//! fail into a typed [`Error`](crate::error::Error); a failed query never
//! records a turn, so chat history only ever contains complete answers.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::generation::Generator;
use crate::models::{Answer, Turn};
use crate::prompt;
use crate::retrieve::retrieve;
use crate::store::Store;

pub async fn run_ask(
    store: &dyn Store,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    threshold: f32,
    chat_id: &str,
    question: &str,
) -> Result<Answer> {
    if chat_id.trim().is_empty() {
        return Err(Error::Input("chat_id is required".to_string()));
    }
    if question.trim().is_empty() {
        return Err(Error::Input("question is required".to_string()));
    }

    let chat = store
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("chat '{}' does not exist", chat_id)))?;

    // Documents are owner-scoped: resolve through the chat's owner so one
    // user's upload can never answer another user's chat.
    let document = store
        .get_document(&chat.owner_id, &chat.file_name)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("document '{}' does not exist", chat.file_name))
        })?;

    if document.segments.is_empty() {
        return Err(Error::NotFound(format!(
            "document '{}' has no segments",
            chat.file_name
        )));
    }

    let question_vector = embedder
        .embed(question)
        .await
        .map_err(|e| Error::Embedding(e.to_string()))?;

    let relevant = retrieve(&document.segments, &question_vector, threshold)?;
    if relevant.is_empty() {
        return Err(Error::NoRelevantContent);
    }

    let texts: Vec<&str> = relevant.iter().map(|s| s.text.as_str()).collect();
    let prompt = prompt::assemble(&texts, question);

    let answer = generator
        .generate(&prompt)
        .await
        .map_err(|e| Error::Generation(e.to_string()))?;

    let turn = Turn {
        question: question.to_string(),
        answer: answer.clone(),
        timestamp: chrono::Utc::now(),
    };
    store.append_turn(chat_id, &turn).await?;

    Ok(Answer {
        question: question.to_string(),
        answer,
    })
}
