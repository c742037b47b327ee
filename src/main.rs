//! # Documate CLI (`documate`)
//!
//! The `documate` binary is the primary interface for Documate. It provides
//! commands for database initialization, document ingestion, chat management,
//! question answering, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! documate --config ./config/documate.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `documate init` | Create the SQLite database and run schema migrations |
//! | `documate ingest <path>` | Segment, embed, and store a text document |
//! | `documate documents list` | List an owner's documents |
//! | `documate documents delete` | Delete a document and its segments |
//! | `documate chat create` | Create a chat bound to a document |
//! | `documate chat history <id>` | Print a chat's turns |
//! | `documate ask <id> "<question>"` | Ask a question in a chat |
//! | `documate serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use documate::config::{self, Config};
use documate::db;
use documate::embedding::create_embedder;
use documate::generation::create_generator;
use documate::ingest::run_ingest;
use documate::migrate;
use documate::models::ChatSession;
use documate::query::run_ask;
use documate::server;
use documate::store::{sqlite::SqliteStore, Store};

/// Documate — retrieval-augmented chat over user-uploaded documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/documate.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "documate",
    about = "Documate — retrieval-augmented chat over user-uploaded documents",
    version,
    long_about = "Documate ingests plain-text documents per owner, segments and embeds them, \
    and answers questions in per-document chat sessions by retrieving the most relevant \
    segments and grounding a generation request on them. Exposed via a CLI and an HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/documate.toml`. Database, embedding, generation,
    /// and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/documate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (documents, segments, chats, turns). This command is idempotent —
    /// running it multiple times is safe.
    Init,

    /// Ingest a plain-text document.
    ///
    /// Reads the file, splits it into sentence-sized segments, embeds each
    /// segment via the configured provider, and stores the result. Sentences
    /// whose embedding fails are dropped; re-ingesting the same owner and
    /// file name replaces the stored segments.
    Ingest {
        /// Path to the plain-text file to ingest.
        path: PathBuf,

        /// Owner the document belongs to.
        #[arg(long)]
        owner: String,

        /// Stored file name; defaults to the path's file name.
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Manage stored documents.
    Documents {
        #[command(subcommand)]
        action: DocumentsAction,
    },

    /// Manage chat sessions.
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },

    /// Ask a question in a chat session.
    ///
    /// Embeds the question, retrieves relevant segments from the chat's
    /// document, generates a grounded answer, and appends the turn to the
    /// chat history.
    Ask {
        /// Chat session id.
        chat_id: String,

        /// The question to ask.
        question: String,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// document and chat API endpoints.
    Serve,
}

/// Document management subcommands.
#[derive(Subcommand)]
enum DocumentsAction {
    /// List an owner's documents with segment counts.
    List {
        /// Owner to list documents for.
        #[arg(long)]
        owner: String,
    },
    /// Delete a document and all its segments.
    Delete {
        /// Owner the document belongs to.
        #[arg(long)]
        owner: String,
        /// Stored file name of the document.
        file_name: String,
    },
}

/// Chat management subcommands.
#[derive(Subcommand)]
enum ChatAction {
    /// Create a chat bound to one of the owner's documents.
    Create {
        /// Owner the chat belongs to.
        #[arg(long)]
        owner: String,
        /// Stored file name of the document to chat about.
        #[arg(long)]
        file: String,
        /// Chat id; generated when omitted.
        #[arg(long)]
        id: Option<String>,
    },
    /// Print a chat's question/answer history.
    History {
        /// Chat session id.
        chat_id: String,
    },
    /// List an owner's chats.
    List {
        /// Owner to list chats for.
        #[arg(long)]
        owner: String,
    },
    /// Delete a chat and its history.
    Delete {
        /// Chat session id.
        chat_id: String,
    },
}

/// Connect to the database, run migrations, and wrap the pool in a store.
async fn open_store(cfg: &Config) -> anyhow::Result<SqliteStore> {
    let pool = db::connect(cfg).await?;
    migrate::run_migrations(&pool).await?;
    Ok(SqliteStore::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            path,
            owner,
            file_name,
        } => {
            let file_name = match file_name {
                Some(name) => name,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow::anyhow!("cannot derive file name from {:?}", path))?,
            };
            let text = std::fs::read_to_string(&path)?;

            let store = open_store(&cfg).await?;
            let embedder = create_embedder(&cfg.embedding)?;
            let report = run_ingest(&store, embedder, &cfg, &owner, &file_name, &text).await?;

            println!("Ingested '{}' for owner '{}'.", report.file_name, owner);
            println!(
                "  {} sentences, {} segments written, {} dropped",
                report.sentences_total, report.segments_written, report.sentences_dropped
            );
        }
        Commands::Documents { action } => match action {
            DocumentsAction::List { owner } => {
                let store = open_store(&cfg).await?;
                let documents = store.list_documents(&owner).await?;
                if documents.is_empty() {
                    println!("No documents for owner '{}'.", owner);
                } else {
                    for doc in documents {
                        println!("{}  ({} segments)", doc.file_name, doc.segment_count);
                    }
                }
            }
            DocumentsAction::Delete { owner, file_name } => {
                let store = open_store(&cfg).await?;
                if store.delete_document(&owner, &file_name).await? {
                    println!("Deleted '{}'.", file_name);
                } else {
                    println!("No document '{}' for owner '{}'.", file_name, owner);
                }
            }
        },
        Commands::Chat { action } => match action {
            ChatAction::Create { owner, file, id } => {
                let store = open_store(&cfg).await?;
                let chat = ChatSession {
                    chat_id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    owner_id: owner,
                    file_name: file,
                    turns: Vec::new(),
                    created_at: chrono::Utc::now().timestamp(),
                };
                store.create_chat(&chat).await?;
                println!("Created chat {} for '{}'.", chat.chat_id, chat.file_name);
            }
            ChatAction::History { chat_id } => {
                let store = open_store(&cfg).await?;
                let chat = store
                    .get_chat(&chat_id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("chat '{}' does not exist", chat_id))?;
                println!("Chat {} about '{}':", chat.chat_id, chat.file_name);
                for turn in &chat.turns {
                    println!("Q: {}", turn.question);
                    println!("A: {}", turn.answer);
                    println!();
                }
            }
            ChatAction::List { owner } => {
                let store = open_store(&cfg).await?;
                let chats = store.list_chats(&owner).await?;
                if chats.is_empty() {
                    println!("No chats for owner '{}'.", owner);
                } else {
                    for chat in chats {
                        println!("{}  ({})", chat.chat_id, chat.file_name);
                    }
                }
            }
            ChatAction::Delete { chat_id } => {
                let store = open_store(&cfg).await?;
                if store.delete_chat(&chat_id).await? {
                    println!("Deleted chat {}.", chat_id);
                } else {
                    println!("No chat '{}'.", chat_id);
                }
            }
        },
        Commands::Ask { chat_id, question } => {
            let store = open_store(&cfg).await?;
            let embedder = create_embedder(&cfg.embedding)?;
            let generator = create_generator(&cfg.generation)?;
            let answer = run_ask(
                &store,
                embedder,
                generator,
                cfg.retrieval.threshold,
                &chat_id,
                &question,
            )
            .await?;
            println!("{}", answer.answer);
        }
        Commands::Serve => {
            let store = open_store(&cfg).await?;
            server::run_server(Arc::new(cfg), Arc::new(store)).await?;
        }
    }

    Ok(())
}
