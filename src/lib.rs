//! # Documate
//!
//! A retrieval-augmented chat service over user-uploaded documents.
//!
//! Documate ingests plain-text documents per owner, splits them into
//! sentence-sized segments, embeds each segment via an external embedding
//! service, and answers questions in per-document chat sessions by retrieving
//! the most relevant segments and grounding a generation request on them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────┐
//! │  Upload  │──▶│   Pipeline     │──▶│  SQLite   │
//! │  (text)  │   │ Segment+Embed │   │ docs+vecs │
//! └──────────┘   └───────────────┘   └────┬─────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │(documate)│       │  (axum)  │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! documate init                                    # create database
//! documate ingest --owner alice report.txt         # upload a document
//! documate chat create --owner alice --file report.txt
//! documate ask <chat-id> "What does the report conclude?"
//! documate serve                                   # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`segment`] | Chunking and sentence segmentation |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`generation`] | Text generation provider abstraction |
//! | [`retrieve`] | Cosine-similarity retrieval |
//! | [`prompt`] | Grounded prompt assembly |
//! | [`ingest`] | Document ingestion pipeline |
//! | [`query`] | End-to-end question answering |
//! | [`store`] | Persistence trait and backends |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod query;
pub mod retrieve;
pub mod segment;
pub mod server;
pub mod store;
