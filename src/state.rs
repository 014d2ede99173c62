use std::sync::Arc;

use crate::chat::ChatService;
use crate::chunker::TextSplitter;
use crate::core::config::{AppConfig, AppPaths};
use crate::core::errors::ApiError;
use crate::crawler::FrontierCrawler;
use crate::index::{HttpSearchIndex, SearchIndex};
use crate::ingest::IngestionCoordinator;
use crate::llm::{Generator, RemoteGenerator};
use crate::memory::{MemoryService, MemoryStore};
use crate::retrieval::RetrievalService;

/// Shared application state: every service gets its collaborators passed
/// in explicitly; tenant ids are arguments, never ambient state.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AppConfig>,
    pub ingestor: Arc<IngestionCoordinator>,
    pub retrieval: Arc<RetrievalService>,
    pub memory: Arc<MemoryService>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let config = Arc::new(AppConfig::load(&paths)?);
        Self::with_parts(paths, config).await
    }

    /// Wire the services from explicit parts; used by `initialize` and by
    /// tests that substitute paths or config.
    pub async fn with_parts(
        paths: Arc<AppPaths>,
        config: Arc<AppConfig>,
    ) -> Result<Arc<Self>, ApiError> {
        let index: Arc<dyn SearchIndex> = Arc::new(HttpSearchIndex::new(&config.index));
        let generator: Arc<dyn Generator> = Arc::new(RemoteGenerator::new(&config.llm));

        let splitter = TextSplitter::from_config(&config.chunker)?;
        let crawler = FrontierCrawler::new(config.crawler.clone())?;

        let ingestor = Arc::new(IngestionCoordinator::new(
            index.clone(),
            splitter,
            crawler,
            config.ingest.max_concurrent_writes,
        ));

        let retrieval = Arc::new(RetrievalService::new(index.clone(), config.retrieval.top_k));

        let memory_store = Arc::new(MemoryStore::new(paths.memory_db_path.clone()).await?);
        let memory = Arc::new(MemoryService::new(
            memory_store,
            generator.clone(),
            config.memory.compaction_threshold,
            config.llm.summary_temperature,
        ));

        let chat = Arc::new(ChatService::new(
            retrieval.clone(),
            memory.clone(),
            generator,
            config.llm.answer_temperature,
        ));

        Ok(Arc::new(AppState {
            paths,
            config,
            ingestor,
            retrieval,
            memory,
            chat,
        }))
    }
}
