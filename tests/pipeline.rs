//! End-to-end pipeline test: ingest content for a tenant, retrieve it
//! across partitions, and run a chat loop through memory compaction,
//! with in-memory fakes standing in for the external index and
//! generation services.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tessera_backend::chat::ChatService;
use tessera_backend::chunker::TextSplitter;
use tessera_backend::core::errors::ApiError;
use tessera_backend::crawler::{CrawlConfig, FrontierCrawler};
use tessera_backend::index::{Partition, SearchIndex, SourceKind};
use tessera_backend::ingest::IngestionCoordinator;
use tessera_backend::llm::Generator;
use tessera_backend::memory::{MemoryService, MemoryStore};
use tessera_backend::retrieval::RetrievalService;

/// In-memory index: rows per partition, substring matching for queries,
/// optional per-partition failure injection.
struct InMemoryIndex {
    rows: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryIndex {
    fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    fn fail_partition(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    fn row_count(&self, partition: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(partition)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn insert(&self, partition: &Partition, text: &str) -> Result<(), ApiError> {
        self.rows
            .lock()
            .unwrap()
            .entry(partition.name())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    async fn query(
        &self,
        partition: &Partition,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, ApiError> {
        let name = partition.name();
        if self.failing.lock().unwrap().contains(&name) {
            return Err(ApiError::IndexQuery(format!("partition {name} is down")));
        }

        let keyword = query.split_whitespace().next().unwrap_or("").to_lowercase();
        let mut hits: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| keyword.is_empty() || row.to_lowercase().contains(&keyword))
            .collect();
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Generator that answers deterministically and counts summary requests.
struct EchoGenerator {
    summaries: AtomicUsize,
    last_prompt: Mutex<String>,
}

impl EchoGenerator {
    fn new() -> Self {
        Self {
            summaries: AtomicUsize::new(0),
            last_prompt: Mutex::new(String::new()),
        }
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, ApiError> {
        *self.last_prompt.lock().unwrap() = prompt.to_string();
        if prompt.starts_with("Please summarize") {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            return Ok("summary of five turns".to_string());
        }
        Ok("generated answer".to_string())
    }
}

struct Pipeline {
    index: Arc<InMemoryIndex>,
    generator: Arc<EchoGenerator>,
    ingestor: IngestionCoordinator,
    retrieval: Arc<RetrievalService>,
    memory: Arc<MemoryService>,
    chat: ChatService,
}

fn temp_db() -> PathBuf {
    std::env::temp_dir().join(format!("tessera-pipeline-test-{}.db", uuid::Uuid::new_v4()))
}

async fn pipeline() -> Pipeline {
    let index = Arc::new(InMemoryIndex::new());
    let generator = Arc::new(EchoGenerator::new());

    let ingestor = IngestionCoordinator::new(
        index.clone(),
        TextSplitter::new(128, 20).unwrap(),
        FrontierCrawler::new(CrawlConfig::default()).unwrap(),
        4,
    );
    let retrieval = Arc::new(RetrievalService::new(index.clone(), 5));
    let store = Arc::new(MemoryStore::new(temp_db()).await.unwrap());
    let memory = Arc::new(MemoryService::new(store, generator.clone(), 5, 0.5));
    let chat = ChatService::new(retrieval.clone(), memory.clone(), generator.clone(), 0.42);

    Pipeline {
        index,
        generator,
        ingestor,
        retrieval,
        memory,
        chat,
    }
}

#[tokio::test]
async fn ingested_documents_are_retrievable_for_their_tenant_only() {
    let p = pipeline().await;

    let text = "Webhooks deliver real-time payment events to your endpoint. ".repeat(10);
    let report = p
        .ingestor
        .ingest_document("t1", SourceKind::Pdf, "guide.pdf", &text)
        .await
        .unwrap();
    assert!(report.chunks_written > 1);
    assert_eq!(report.chunks_failed, 0);
    assert_eq!(p.index.row_count("t1_pdf"), report.chunks_written);

    let results = p.retrieval.retrieve("t1", "webhooks").await;
    assert_eq!(results.len(), 4);
    let pdf_hits = results.iter().find(|r| r.partition == "t1_pdf").unwrap();
    assert!(!pdf_hits.hits.is_empty());

    let other = p.retrieval.retrieve("t2", "webhooks").await;
    assert!(other
        .iter()
        .filter(|r| r.partition != "common")
        .all(|r| r.hits.is_empty()));
}

#[tokio::test]
async fn one_failing_partition_does_not_break_a_chat_turn() {
    let p = pipeline().await;

    p.ingestor
        .ingest_document(
            "t1",
            SourceKind::Github,
            "repo",
            &"Retries use exponential backoff in this client library. ".repeat(10),
        )
        .await
        .unwrap();
    p.index.fail_partition("t1_pdf");

    let answer = p.chat.answer("t1", "retries policy?").await.unwrap();
    assert_eq!(answer, "generated answer");

    let prompt = p.generator.last_prompt.lock().unwrap().clone();
    assert!(prompt.contains("exponential backoff"));
}

#[tokio::test]
async fn five_chat_turns_compact_into_one_summary() {
    let p = pipeline().await;

    for i in 0..5 {
        p.chat.answer("t1", &format!("question {i}")).await.unwrap();
    }

    assert_eq!(p.generator.summaries.load(Ordering::SeqCst), 1);
    let view = p.memory.read_memory("t1").await.unwrap();
    assert!(view.turns.is_empty());
    let summary = view.latest_summary.unwrap();
    assert_eq!(summary.original_turns.len(), 5);

    // the sixth turn sees the summary as continuity context
    p.chat.answer("t1", "question 5").await.unwrap();
    let prompt = p.generator.last_prompt.lock().unwrap().clone();
    assert!(prompt.contains("summary of five turns"));
}
