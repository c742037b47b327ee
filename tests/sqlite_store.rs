//! SQLite store contract tests against a temporary database file.

use tempfile::TempDir;

use documate::config::{Config, DbConfig, ServerConfig};
use documate::db;
use documate::migrate;
use documate::models::{ChatSession, Segment, Turn};
use documate::store::{sqlite::SqliteStore, Store};

async fn open_store(tmp: &TempDir) -> SqliteStore {
    let cfg = Config {
        db: DbConfig {
            path: tmp.path().join("documate.sqlite"),
            max_connections: 5,
        },
        chunking: Default::default(),
        retrieval: Default::default(),
        embedding: Default::default(),
        generation: Default::default(),
        server: ServerConfig {
            bind: "127.0.0.1:0".to_string(),
        },
    };
    let pool = db::connect(&cfg).await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn segment(text: &str, vector: Vec<f32>) -> Segment {
    Segment {
        text: text.to_string(),
        vector,
    }
}

fn chat(owner: &str, file: &str, id: &str) -> ChatSession {
    ChatSession {
        chat_id: id.to_string(),
        owner_id: owner.to_string(),
        file_name: file.to_string(),
        turns: Vec::new(),
        created_at: chrono::Utc::now().timestamp(),
    }
}

fn turn(question: &str, answer: &str) -> Turn {
    Turn {
        question: question.to_string(),
        answer: answer.to_string(),
        timestamp: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn roundtrip_preserves_segment_order_and_vectors() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let segments = vec![
        segment("first", vec![0.1, 0.2, 0.3]),
        segment("second", vec![-1.0, 0.0, 1.0]),
        segment("third", vec![0.5, 0.5, 0.5]),
    ];
    store
        .replace_segments("alice", "notes.txt", &segments)
        .await
        .unwrap();

    let doc = store.get_document("alice", "notes.txt").await.unwrap().unwrap();
    assert_eq!(doc.owner_id, "alice");
    assert_eq!(doc.file_name, "notes.txt");
    assert_eq!(doc.segments, segments);
}

#[tokio::test]
async fn replace_overwrites_previous_segments() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .replace_segments(
            "alice",
            "notes.txt",
            &[
                segment("old one", vec![1.0]),
                segment("old two", vec![2.0]),
            ],
        )
        .await
        .unwrap();
    store
        .replace_segments("alice", "notes.txt", &[segment("new", vec![3.0])])
        .await
        .unwrap();

    let doc = store.get_document("alice", "notes.txt").await.unwrap().unwrap();
    assert_eq!(doc.segments.len(), 1);
    assert_eq!(doc.segments[0].text, "new");

    // Still one document row for the owner.
    let summaries = store.list_documents("alice").await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].segment_count, 1);
}

#[tokio::test]
async fn documents_are_owner_scoped() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .replace_segments("alice", "notes.txt", &[segment("alice's", vec![1.0])])
        .await
        .unwrap();
    store
        .replace_segments("bob", "notes.txt", &[segment("bob's", vec![2.0])])
        .await
        .unwrap();

    let alice = store.get_document("alice", "notes.txt").await.unwrap().unwrap();
    let bob = store.get_document("bob", "notes.txt").await.unwrap().unwrap();
    assert_eq!(alice.segments[0].text, "alice's");
    assert_eq!(bob.segments[0].text, "bob's");

    assert!(store.delete_document("alice", "notes.txt").await.unwrap());
    assert!(store.get_document("alice", "notes.txt").await.unwrap().is_none());
    assert!(store.get_document("bob", "notes.txt").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_missing_document_returns_false() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    assert!(!store.delete_document("alice", "ghost.txt").await.unwrap());
}

#[tokio::test]
async fn chats_store_turns_in_append_order() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store.create_chat(&chat("alice", "notes.txt", "c1")).await.unwrap();
    store.append_turn("c1", &turn("q1", "a1")).await.unwrap();
    store.append_turn("c1", &turn("q2", "a2")).await.unwrap();
    store.append_turn("c1", &turn("q3", "a3")).await.unwrap();

    let fetched = store.get_chat("c1").await.unwrap().unwrap();
    let questions: Vec<&str> = fetched.turns.iter().map(|t| t.question.as_str()).collect();
    assert_eq!(questions, vec!["q1", "q2", "q3"]);
}

#[tokio::test]
async fn create_chat_rejects_duplicate_id() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store.create_chat(&chat("alice", "notes.txt", "c1")).await.unwrap();
    assert!(store
        .create_chat(&chat("alice", "other.txt", "c1"))
        .await
        .is_err());
}

#[tokio::test]
async fn append_turn_requires_existing_chat() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    assert!(store.append_turn("ghost", &turn("q", "a")).await.is_err());
}

#[tokio::test]
async fn append_turn_after_chat_deletion_fails() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store.create_chat(&chat("alice", "notes.txt", "c1")).await.unwrap();
    assert!(store.delete_chat("c1").await.unwrap());

    // Enforced by the foreign key, not a pre-check that could race.
    assert!(store.append_turn("c1", &turn("q", "a")).await.is_err());
}

#[tokio::test]
async fn delete_chat_removes_history() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store.create_chat(&chat("alice", "notes.txt", "c1")).await.unwrap();
    store.append_turn("c1", &turn("q1", "a1")).await.unwrap();

    assert!(store.delete_chat("c1").await.unwrap());
    assert!(store.get_chat("c1").await.unwrap().is_none());
    assert!(!store.delete_chat("c1").await.unwrap());
}

#[tokio::test]
async fn list_chats_is_owner_scoped() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store.create_chat(&chat("alice", "a.txt", "c1")).await.unwrap();
    store.create_chat(&chat("alice", "b.txt", "c2")).await.unwrap();
    store.create_chat(&chat("bob", "a.txt", "c3")).await.unwrap();

    let alice = store.list_chats("alice").await.unwrap();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|c| c.owner_id == "alice"));

    let bob = store.list_chats("bob").await.unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].chat_id, "c3");
}
