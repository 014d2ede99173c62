//! Application paths and typed configuration.
//!
//! Configuration is read from `config.toml` in the data directory (when
//! present) and overlaid with a small set of environment variables for the
//! external service endpoints. Every knob has a validated default so the
//! server boots with no config file at all.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::crawler::CrawlConfig;

/// Filesystem layout for runtime state.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub memory_db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let data_dir = env::var("TESSERA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        Self::with_data_dir(data_dir)
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let log_dir = data_dir.join("logs");
        let memory_db_path = data_dir.join("tessera_memory.db");
        let config_path = data_dir.join("config.toml");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            data_dir,
            log_dir,
            memory_db_path,
            config_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8700 }
    }
}

/// Endpoint of the external search-index service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8108".to_string(),
            api_key: None,
        }
    }
}

/// Endpoint of the external text-generation service (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature for user-facing answers.
    pub answer_temperature: f32,
    /// Sampling temperature for memory summarization.
    pub summary_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            model: "mistral-large-latest".to_string(),
            api_key: None,
            answer_temperature: 0.42,
            summary_temperature: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Upper bound on concurrent chunk writes per ingestion.
    pub max_concurrent_writes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_concurrent_writes: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Turn-buffer size that triggers summarization.
    pub compaction_threshold: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub index: IndexConfig,
    pub llm: LlmConfig,
    pub crawler: CrawlConfig,
    pub chunker: ChunkerConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
    pub memory: MemoryConfig,
}

impl AppConfig {
    /// Load configuration from disk, then apply environment overrides.
    pub fn load(paths: &AppPaths) -> Result<Self, ApiError> {
        let mut config = if paths.config_path.exists() {
            let raw = fs::read_to_string(&paths.config_path).map_err(ApiError::internal)?;
            toml::from_str(&raw)
                .map_err(|e| ApiError::BadRequest(format!("invalid config.toml: {e}")))?
        } else {
            AppConfig::default()
        };

        if let Ok(url) = env::var("TESSERA_INDEX_URL") {
            config.index.base_url = url;
        }
        if let Ok(key) = env::var("TESSERA_INDEX_API_KEY") {
            config.index.api_key = Some(key);
        }
        if let Ok(url) = env::var("TESSERA_LLM_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = env::var("TESSERA_LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(key) = env::var("TESSERA_LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.chunker.chunk_size == 0 {
            return Err(ApiError::InvalidChunking("chunk_size must be > 0".into()));
        }
        if self.chunker.chunk_overlap >= self.chunker.chunk_size {
            return Err(ApiError::InvalidChunking(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunker.chunk_overlap, self.chunker.chunk_size
            )));
        }
        if self.memory.compaction_threshold == 0 {
            return Err(ApiError::BadRequest(
                "memory.compaction_threshold must be > 0".into(),
            ));
        }
        if self.crawler.max_concurrency == 0 {
            return Err(ApiError::BadRequest(
                "crawler.max_concurrency must be > 0".into(),
            ));
        }
        Ok(())
    }
}
