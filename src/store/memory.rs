//! In-memory [`Store`] implementation for tests.
//!
//! Uses `HashMap`s behind `std::sync::RwLock` for thread safety. Documents
//! are keyed by `(owner_id, file_name)`, chats by `chat_id`; every read
//! hands back a clone so callers never hold a lock across an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ChatSession, Document, DocumentSummary, Segment, Turn};

use super::Store;

/// In-memory store for tests and examples.
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<(String, String), Document>>,
    chats: RwLock<HashMap<String, ChatSession>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn replace_segments(
        &self,
        owner_id: &str,
        file_name: &str,
        segments: &[Segment],
    ) -> Result<()> {
        let key = (owner_id.to_string(), file_name.to_string());
        let mut docs = self.docs.write().unwrap();
        let now = now_ts();

        match docs.get_mut(&key) {
            Some(doc) => {
                doc.segments = segments.to_vec();
                doc.updated_at = now;
            }
            None => {
                docs.insert(
                    key,
                    Document {
                        id: Uuid::new_v4().to_string(),
                        owner_id: owner_id.to_string(),
                        file_name: file_name.to_string(),
                        segments: segments.to_vec(),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn get_document(&self, owner_id: &str, file_name: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(docs
            .get(&(owner_id.to_string(), file_name.to_string()))
            .cloned())
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<DocumentSummary>> {
        let docs = self.docs.read().unwrap();
        let mut summaries: Vec<DocumentSummary> = docs
            .values()
            .filter(|d| d.owner_id == owner_id)
            .map(|d| DocumentSummary {
                file_name: d.file_name.clone(),
                segment_count: d.segments.len() as i64,
                updated_at: d.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.file_name.cmp(&b.file_name)));
        Ok(summaries)
    }

    async fn delete_document(&self, owner_id: &str, file_name: &str) -> Result<bool> {
        let mut docs = self.docs.write().unwrap();
        Ok(docs
            .remove(&(owner_id.to_string(), file_name.to_string()))
            .is_some())
    }

    async fn create_chat(&self, chat: &ChatSession) -> Result<()> {
        let mut chats = self.chats.write().unwrap();
        if chats.contains_key(&chat.chat_id) {
            bail!("chat '{}' already exists", chat.chat_id);
        }
        chats.insert(chat.chat_id.clone(), chat.clone());
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatSession>> {
        let chats = self.chats.read().unwrap();
        Ok(chats.get(chat_id).cloned())
    }

    async fn list_chats(&self, owner_id: &str) -> Result<Vec<ChatSession>> {
        let chats = self.chats.read().unwrap();
        let mut out: Vec<ChatSession> = chats
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.chat_id.cmp(&b.chat_id)));
        Ok(out)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        let mut chats = self.chats.write().unwrap();
        Ok(chats.remove(chat_id).is_some())
    }

    async fn append_turn(&self, chat_id: &str, turn: &Turn) -> Result<()> {
        let mut chats = self.chats.write().unwrap();
        match chats.get_mut(chat_id) {
            Some(chat) => {
                chat.turns.push(turn.clone());
                Ok(())
            }
            None => bail!("chat '{}' not found", chat_id),
        }
    }
}
