//! Conversational memory with threshold-triggered compaction.
//!
//! Each tenant owns one memory document: a bounded buffer of recent turns
//! and a growing list of summaries. When the buffer reaches the compaction
//! threshold the buffered turns are summarized through the external
//! generation capability, archived with their summary, and the buffer is
//! cleared.
//!
//! All mutation happens under a per-tenant async mutex: the
//! append-then-maybe-compact sequence is a read-modify-write against the
//! stored document, and concurrent chat requests for the same tenant must
//! not lose turns or double-trigger compaction.

mod store;

pub use store::MemoryStore;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::errors::ApiError;
use crate::llm::Generator;

const SUMMARIZER_INSTRUCTION: &str = "Please summarize the following conversations into a \
concise paragraph that captures the main topics discussed and key points from both the \
user's queries and the assistant's responses.";

/// One query/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub response: String,
    pub created_at: String,
}

impl Turn {
    pub fn new(query: &str, response: &str) -> Self {
        Self {
            query: query.to_string(),
            response: response.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A compacted batch of turns. All entries are stored; only the most
/// recently appended one is surfaced on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub summary_text: String,
    pub original_turns: Vec<Turn>,
    pub created_at: String,
}

/// The persisted per-tenant memory document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub summaries: Vec<SummaryEntry>,
}

/// What the orchestrator sees: the sub-threshold buffer plus at most the
/// latest summary.
#[derive(Debug, Clone)]
pub struct MemoryView {
    pub turns: Vec<Turn>,
    pub latest_summary: Option<SummaryEntry>,
}

pub struct MemoryService {
    store: Arc<MemoryStore>,
    generator: Arc<dyn Generator>,
    threshold: usize,
    summary_temperature: f32,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryService {
    pub fn new(
        store: Arc<MemoryStore>,
        generator: Arc<dyn Generator>,
        threshold: usize,
        summary_temperature: f32,
    ) -> Self {
        Self {
            store,
            generator,
            threshold: threshold.max(1),
            summary_temperature,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn tenant_lock(&self, tenant: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(tenant.to_string()).or_default().clone()
    }

    /// Append a turn; compact when the buffer reaches the threshold.
    pub async fn record_turn(
        &self,
        tenant: &str,
        query: &str,
        response: &str,
    ) -> Result<(), ApiError> {
        let lock = self.tenant_lock(tenant).await;
        let _guard = lock.lock().await;

        let mut document = self.store.load(tenant).await?;
        document.turns.push(Turn::new(query, response));

        if document.turns.len() >= self.threshold {
            match self.summarize(&document.turns).await {
                Ok(summary_text) => {
                    let original_turns = std::mem::take(&mut document.turns);
                    document.summaries.push(SummaryEntry {
                        summary_text,
                        original_turns,
                        created_at: chrono::Utc::now().to_rfc3339(),
                    });
                    tracing::info!(tenant, summaries = document.summaries.len(), "memory compacted");
                }
                Err(err) => {
                    // Keep the buffer; compaction retries on the next turn.
                    tracing::warn!(tenant, error = %err, "summarization failed, compaction deferred");
                }
            }
        }

        self.store.save(tenant, &document).await
    }

    /// Current buffer plus only the most recently appended summary.
    pub async fn read_memory(&self, tenant: &str) -> Result<MemoryView, ApiError> {
        let lock = self.tenant_lock(tenant).await;
        let _guard = lock.lock().await;

        let document = self.store.load(tenant).await?;
        Ok(MemoryView {
            latest_summary: document.summaries.last().cloned(),
            turns: document.turns,
        })
    }

    async fn summarize(&self, turns: &[Turn]) -> Result<String, ApiError> {
        let conversation = turns
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}", turn.query, turn.response))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!("{SUMMARIZER_INSTRUCTION}\n\n{conversation}");
        self.generator
            .complete(&prompt, self.summary_temperature)
            .await
    }
}
