//! Multi-partition retrieval fan-out.
//!
//! One query is dispatched concurrently to the shared partition and the
//! tenant's three private partitions. Results are concatenated in
//! completion order; no cross-partition re-ranking or dedup is applied.
//! A partition that errors contributes an empty result, never a failure.

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

use crate::index::{Partition, SearchIndex, SourceKind};

/// Hits from one partition, in the index's relevance order.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionHits {
    pub partition: String,
    pub hits: Vec<String>,
}

pub struct RetrievalService {
    index: Arc<dyn SearchIndex>,
    top_k: usize,
}

impl RetrievalService {
    pub fn new(index: Arc<dyn SearchIndex>, top_k: usize) -> Self {
        Self {
            index,
            top_k: top_k.max(1),
        }
    }

    /// Query all four partitions for `tenant` concurrently.
    pub async fn retrieve(&self, tenant: &str, query: &str) -> Vec<PartitionHits> {
        let mut partitions = vec![Partition::Shared];
        partitions.extend(SourceKind::all().map(|kind| Partition::private(tenant, kind)));

        let mut in_flight: FuturesUnordered<_> = partitions
            .into_iter()
            .map(|partition| {
                let index = self.index.clone();
                let top_k = self.top_k;
                async move {
                    let name = partition.name();
                    match index.query(&partition, query, top_k).await {
                        Ok(hits) => PartitionHits {
                            partition: name,
                            hits,
                        },
                        Err(err) => {
                            tracing::warn!(partition = %name, error = %err, "partition query failed");
                            PartitionHits {
                                partition: name,
                                hits: Vec::new(),
                            }
                        }
                    }
                }
            })
            .collect();

        let mut results = Vec::with_capacity(4);
        while let Some(hits) = in_flight.next().await {
            results.push(hits);
        }
        results
    }
}
