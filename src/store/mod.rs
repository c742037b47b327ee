//! Storage abstraction for documents and chats.
//!
//! The [`Store`] trait defines all storage operations the pipelines need,
//! enabling pluggable backends (SQLite in production, in-memory in tests).
//! Documents are keyed by `(owner_id, file_name)` and chats by `chat_id`;
//! each record is independently owned, so concurrent operations on different
//! documents never contend on shared mutable structures.
//!
//! Write shapes are deliberately narrow: replace-segments and append-turn
//! are the only mutations the core performs besides create/delete.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChatSession, Document, DocumentSummary, Segment, Turn};

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`replace_segments`](Store::replace_segments) | Create or overwrite a document's segments |
/// | [`get_document`](Store::get_document) | Fetch a document with its segments |
/// | [`list_documents`](Store::list_documents) | List an owner's documents |
/// | [`delete_document`](Store::delete_document) | Delete a document |
/// | [`create_chat`](Store::create_chat) | Create a chat bound to a file name |
/// | [`get_chat`](Store::get_chat) | Fetch a chat with its turns |
/// | [`list_chats`](Store::list_chats) | List an owner's chats |
/// | [`delete_chat`](Store::delete_chat) | Delete a chat |
/// | [`append_turn`](Store::append_turn) | Atomically append one turn |
#[async_trait]
pub trait Store: Send + Sync {
    /// Create the document if missing, otherwise replace its segments
    /// wholesale (last-write-wins, no merge). The replacement must be
    /// atomic: readers never observe an interleaved segment list.
    async fn replace_segments(
        &self,
        owner_id: &str,
        file_name: &str,
        segments: &[Segment],
    ) -> Result<()>;

    /// Fetch a document and its segments in ingestion order.
    async fn get_document(&self, owner_id: &str, file_name: &str) -> Result<Option<Document>>;

    /// List an owner's documents, most recently updated first.
    async fn list_documents(&self, owner_id: &str) -> Result<Vec<DocumentSummary>>;

    /// Delete a document. Returns `false` if it did not exist.
    async fn delete_document(&self, owner_id: &str, file_name: &str) -> Result<bool>;

    /// Create a chat. Fails if the chat id is already taken.
    async fn create_chat(&self, chat: &ChatSession) -> Result<()>;

    /// Fetch a chat with its turns in append order.
    async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatSession>>;

    /// List an owner's chats (turns included), most recent first.
    async fn list_chats(&self, owner_id: &str) -> Result<Vec<ChatSession>>;

    /// Delete a chat. Returns `false` if it did not exist.
    async fn delete_chat(&self, chat_id: &str) -> Result<bool>;

    /// Append one turn to an existing chat. Each append is atomic;
    /// concurrent appends may land in either order but none is lost.
    /// Fails if the chat does not exist.
    async fn append_turn(&self, chat_id: &str, turn: &Turn) -> Result<()>;
}
