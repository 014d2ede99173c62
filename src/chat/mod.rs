//! Query orchestrator.
//!
//! Composes retrieval fan-out output and conversational memory into one
//! generation request, then records the answered turn (which may trigger
//! memory compaction). Generation failures propagate to the caller; no
//! retry is attempted.

mod prompt;

pub use prompt::build_answer_prompt;

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::Generator;
use crate::memory::MemoryService;
use crate::retrieval::RetrievalService;

pub struct ChatService {
    retrieval: Arc<RetrievalService>,
    memory: Arc<MemoryService>,
    generator: Arc<dyn Generator>,
    answer_temperature: f32,
}

impl ChatService {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        memory: Arc<MemoryService>,
        generator: Arc<dyn Generator>,
        answer_temperature: f32,
    ) -> Self {
        Self {
            retrieval,
            memory,
            generator,
            answer_temperature,
        }
    }

    /// Answer one query for a tenant.
    pub async fn answer(&self, tenant: &str, query: &str) -> Result<String, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::BadRequest("query must not be empty".into()));
        }

        let context = self.retrieval.retrieve(tenant, query).await;
        let memory = self.memory.read_memory(tenant).await?;

        let prompt = build_answer_prompt(&context, &memory, query);
        let response = self
            .generator
            .complete(&prompt, self.answer_temperature)
            .await?;

        self.memory.record_turn(tenant, query, &response).await?;
        Ok(response)
    }
}
