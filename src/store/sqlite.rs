//! SQLite [`Store`] implementation.
//!
//! Segment vectors are stored as little-endian f32 BLOBs. Segment
//! replacement runs in one transaction (delete + insert), so two concurrent
//! ingestions of the same document serialize into clean last-write-wins
//! rather than an interleaved segment list. Turns use an autoincrement
//! rowid, which doubles as the append order.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::models::{ChatSession, Document, DocumentSummary, Segment, Turn};

use super::Store;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_turns(&self, chat_id: &str) -> Result<Vec<Turn>> {
        let rows = sqlx::query(
            "SELECT question, answer, created_at FROM turns WHERE chat_id = ? ORDER BY id",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let ts: i64 = row.get("created_at");
                Turn {
                    question: row.get("question"),
                    answer: row.get("answer"),
                    timestamp: chrono::DateTime::from_timestamp(ts, 0).unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn replace_segments(
        &self,
        owner_id: &str,
        file_name: &str,
        segments: &[Segment],
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let existing_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM documents WHERE owner_id = ? AND file_name = ?")
                .bind(owner_id)
                .bind(file_name)
                .fetch_optional(&mut *tx)
                .await?;

        let doc_id = match existing_id {
            Some(id) => {
                sqlx::query("UPDATE documents SET updated_at = ? WHERE id = ?")
                    .bind(now)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO documents (id, owner_id, file_name, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(owner_id)
                .bind(file_name)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                id
            }
        };

        sqlx::query("DELETE FROM segments WHERE document_id = ?")
            .bind(&doc_id)
            .execute(&mut *tx)
            .await?;

        for (idx, segment) in segments.iter().enumerate() {
            sqlx::query(
                "INSERT INTO segments (id, document_id, seg_index, text, embedding, dims) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&doc_id)
            .bind(idx as i64)
            .bind(&segment.text)
            .bind(vec_to_blob(&segment.vector))
            .bind(segment.vector.len() as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_document(&self, owner_id: &str, file_name: &str) -> Result<Option<Document>> {
        let doc_row = sqlx::query(
            "SELECT id, owner_id, file_name, created_at, updated_at \
             FROM documents WHERE owner_id = ? AND file_name = ?",
        )
        .bind(owner_id)
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = doc_row else {
            return Ok(None);
        };
        let doc_id: String = row.get("id");

        let seg_rows =
            sqlx::query("SELECT text, embedding FROM segments WHERE document_id = ? ORDER BY seg_index")
                .bind(&doc_id)
                .fetch_all(&self.pool)
                .await?;

        let segments: Vec<Segment> = seg_rows
            .iter()
            .map(|r| {
                let blob: Vec<u8> = r.get("embedding");
                Segment {
                    text: r.get("text"),
                    vector: blob_to_vec(&blob),
                }
            })
            .collect();

        Ok(Some(Document {
            id: doc_id,
            owner_id: row.get("owner_id"),
            file_name: row.get("file_name"),
            segments,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<DocumentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT d.file_name, d.updated_at, COUNT(s.id) AS segment_count
            FROM documents d
            LEFT JOIN segments s ON s.document_id = d.id
            WHERE d.owner_id = ?
            GROUP BY d.id
            ORDER BY d.updated_at DESC, d.file_name
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DocumentSummary {
                file_name: row.get("file_name"),
                segment_count: row.get("segment_count"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn delete_document(&self, owner_id: &str, file_name: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let doc_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM documents WHERE owner_id = ? AND file_name = ?")
                .bind(owner_id)
                .bind(file_name)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(doc_id) = doc_id else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM segments WHERE document_id = ?")
            .bind(&doc_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(&doc_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn create_chat(&self, chat: &ChatSession) -> Result<()> {
        // The primary key enforces uniqueness; a pre-check would race with
        // a concurrent create.
        let result = sqlx::query(
            "INSERT INTO chats (chat_id, owner_id, file_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&chat.chat_id)
        .bind(&chat.owner_id)
        .bind(&chat.file_name)
        .bind(chat.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                bail!("chat '{}' already exists", chat.chat_id)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatSession>> {
        let row = sqlx::query(
            "SELECT chat_id, owner_id, file_name, created_at FROM chats WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ChatSession {
            chat_id: row.get("chat_id"),
            owner_id: row.get("owner_id"),
            file_name: row.get("file_name"),
            turns: self.fetch_turns(chat_id).await?,
            created_at: row.get("created_at"),
        }))
    }

    async fn list_chats(&self, owner_id: &str) -> Result<Vec<ChatSession>> {
        let rows = sqlx::query(
            "SELECT chat_id, owner_id, file_name, created_at FROM chats \
             WHERE owner_id = ? ORDER BY created_at DESC, chat_id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut chats = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_id: String = row.get("chat_id");
            chats.push(ChatSession {
                turns: self.fetch_turns(&chat_id).await?,
                chat_id,
                owner_id: row.get("owner_id"),
                file_name: row.get("file_name"),
                created_at: row.get("created_at"),
            });
        }
        Ok(chats)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM turns WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM chats WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_turn(&self, chat_id: &str, turn: &Turn) -> Result<()> {
        // Foreign key enforcement rejects an append to a missing (or
        // concurrently deleted) chat in the same statement as the insert.
        let result = sqlx::query(
            "INSERT INTO turns (chat_id, question, answer, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(chat_id)
        .bind(&turn.question)
        .bind(&turn.answer)
        .bind(turn.timestamp.timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                bail!("chat '{}' not found", chat_id)
            }
            Err(e) => Err(e.into()),
        }
    }
}
