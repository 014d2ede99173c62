//! Prompt assembly for the answer path.
//!
//! Retrieved context is the primary source of truth; memory is secondary
//! continuity context. The model is told to say so when neither covers the
//! query.

use crate::memory::MemoryView;
use crate::retrieval::PartitionHits;

pub fn build_answer_prompt(context: &[PartitionHits], memory: &MemoryView, query: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a helpful assistant using a Retrieval-Augmented Generation (RAG) method \
         to answer user queries.\n\n",
    );

    prompt.push_str("### Document Details\n");
    let mut any_hits = false;
    for partition in context {
        if partition.hits.is_empty() {
            continue;
        }
        any_hits = true;
        prompt.push_str(&format!("[{}]\n", partition.partition));
        for hit in &partition.hits {
            prompt.push_str("- ");
            prompt.push_str(hit);
            prompt.push('\n');
        }
    }
    if !any_hits {
        prompt.push_str("(no indexed documents matched this query)\n");
    }

    prompt.push_str("\n### Memory (Previous Conversation History)\n");
    let mut any_memory = false;
    if let Some(summary) = &memory.latest_summary {
        any_memory = true;
        prompt.push_str("Summary of earlier conversation: ");
        prompt.push_str(&summary.summary_text);
        prompt.push('\n');
    }
    for turn in &memory.turns {
        any_memory = true;
        prompt.push_str(&format!(
            "User: {}\nAssistant: {}\n",
            turn.query, turn.response
        ));
    }
    if !any_memory {
        prompt.push_str("(no prior conversation)\n");
    }

    prompt.push_str(&format!("\n### User Query\n{query}\n"));

    prompt.push_str(
        "\n### Instructions\n\
         - Use the provided Document Details as the primary source of truth to answer the query.\n\
         - Refer to the Memory to maintain conversation context and continuity.\n\
         - If relevant information is missing from both, say so and guide the user on how to proceed.\n\
         - Be concise and accurate; suggest follow-up questions where they help.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{SummaryEntry, Turn};

    fn hits(partition: &str, items: &[&str]) -> PartitionHits {
        PartitionHits {
            partition: partition.to_string(),
            hits: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn prompt_contains_context_memory_and_query_sections() {
        let context = vec![
            hits("common", &["a shared document"]),
            hits("t1_web", &[]),
            hits("t1_pdf", &["an indexed pdf chunk"]),
        ];
        let memory = MemoryView {
            turns: vec![Turn::new("earlier question", "earlier answer")],
            latest_summary: Some(SummaryEntry {
                summary_text: "they discussed webhooks".to_string(),
                original_turns: vec![],
                created_at: String::new(),
            }),
        };

        let prompt = build_answer_prompt(&context, &memory, "what about retries?");

        assert!(prompt.contains("a shared document"));
        assert!(prompt.contains("an indexed pdf chunk"));
        assert!(prompt.contains("they discussed webhooks"));
        assert!(prompt.contains("earlier question"));
        assert!(prompt.contains("what about retries?"));
        assert!(prompt.contains("primary source of truth"));
        // empty partitions leave no header behind
        assert!(!prompt.contains("[t1_web]"));
    }

    #[test]
    fn empty_inputs_are_called_out() {
        let memory = MemoryView {
            turns: vec![],
            latest_summary: None,
        };
        let prompt = build_answer_prompt(&[], &memory, "hello");
        assert!(prompt.contains("no indexed documents"));
        assert!(prompt.contains("no prior conversation"));
    }
}
