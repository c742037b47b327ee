use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters. Chunk boundaries may fall
    /// mid-sentence; this is an accepted accuracy/latency trade-off.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity a segment must meet to be retrieved.
    /// A quality/recall trade-off, not a protocol constant.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f32 {
    0.35
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on in-flight embedding calls during one ingestion.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            base_url: default_embedding_base_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: default_generation_base_url(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_generation_timeout_secs() -> u64 {
    60
}
fn default_concurrency() -> usize {
    8
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }

    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }

    if !(-1.0..=1.0).contains(&config.retrieval.threshold) {
        anyhow::bail!("retrieval.threshold must be in [-1.0, 1.0]");
    }

    if config.embedding.is_enabled() {
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.concurrency == 0 {
            anyhow::bail!("embedding.concurrency must be > 0");
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.generation.is_enabled() && config.generation.model.is_none() {
        anyhow::bail!(
            "generation.model must be specified when provider is '{}'",
            config.generation.provider
        );
    }

    match config.generation.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}
