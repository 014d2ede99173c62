//! Ingestion coordinator.
//!
//! Drives a content source (the crawler for web pages, or pre-extracted
//! text handed over by the PDF/GitHub adapters) through the chunker and
//! writes the resulting chunks into the tenant's private partition for
//! that source kind.
//!
//! Writes are best-effort: a single failed chunk is logged and counted,
//! never aborting the batch. There is no write dedup, so re-ingesting the
//! same source duplicates rows.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use url::Url;

use crate::chunker::TextSplitter;
use crate::core::errors::ApiError;
use crate::crawler::FrontierCrawler;
use crate::index::{Partition, SearchIndex, SourceKind};

/// One bounded text span bound for the index.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub text: String,
    pub source_id: String,
}

/// Outcome of one ingestion, reported as counts rather than all-or-nothing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub chunks_written: usize,
    pub chunks_failed: usize,
    pub pages_crawled: usize,
}

pub struct IngestionCoordinator {
    index: Arc<dyn SearchIndex>,
    splitter: TextSplitter,
    crawler: FrontierCrawler,
    max_concurrent_writes: usize,
}

impl IngestionCoordinator {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        splitter: TextSplitter,
        crawler: FrontierCrawler,
        max_concurrent_writes: usize,
    ) -> Self {
        Self {
            index,
            splitter,
            crawler,
            max_concurrent_writes: max_concurrent_writes.max(1),
        }
    }

    /// Crawl outward from `seed` and index the combined page text into the
    /// tenant's `web` partition.
    pub async fn ingest_web(&self, tenant: &str, seed: &Url) -> Result<IngestReport, ApiError> {
        let pages = self.crawler.crawl(seed).await;
        tracing::info!(tenant, seed = %seed, pages = pages.len(), "crawl finished");

        let combined = pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut report = self
            .write_chunks(tenant, SourceKind::Web, seed.as_str(), &combined)
            .await?;
        report.pages_crawled = pages.len();
        Ok(report)
    }

    /// Index text already obtained from an external adapter (GitHub proxy,
    /// PDF extractor) into the tenant's partition for `kind`.
    pub async fn ingest_document(
        &self,
        tenant: &str,
        kind: SourceKind,
        source_id: &str,
        text: &str,
    ) -> Result<IngestReport, ApiError> {
        if kind == SourceKind::Web {
            return Err(ApiError::BadRequest(
                "web content is ingested through the crawler".into(),
            ));
        }
        self.write_chunks(tenant, kind, source_id, text).await
    }

    async fn write_chunks(
        &self,
        tenant: &str,
        kind: SourceKind,
        source_id: &str,
        text: &str,
    ) -> Result<IngestReport, ApiError> {
        let chunks: Vec<DocumentChunk> = self
            .splitter
            .split(text)
            .into_iter()
            .map(|text| DocumentChunk {
                text,
                source_id: source_id.to_string(),
            })
            .collect();

        let batch_id = uuid::Uuid::new_v4().to_string();
        let partition = Partition::private(tenant, kind);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_writes));

        let writes = chunks.into_iter().map(|chunk| {
            let index = self.index.clone();
            let partition = partition.clone();
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire_owned().await.ok();
                index
                    .insert(&partition, &chunk.text)
                    .await
                    .map_err(|err| (chunk.source_id, err))
            }
        });

        let mut report = IngestReport::default();
        for result in join_all(writes).await {
            match result {
                Ok(()) => report.chunks_written += 1,
                Err((source_id, err)) => {
                    report.chunks_failed += 1;
                    tracing::warn!(
                        tenant,
                        partition = %partition.name(),
                        source_id = %source_id,
                        error = %err,
                        "chunk write failed"
                    );
                }
            }
        }

        tracing::info!(
            tenant,
            batch_id = %batch_id,
            partition = %partition.name(),
            written = report.chunks_written,
            failed = report.chunks_failed,
            "ingestion finished"
        );
        Ok(report)
    }
}
