//! HTTP client for the external search-index service.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::IndexConfig;
use crate::core::errors::ApiError;

use super::{Partition, SearchIndex};

#[derive(Clone)]
pub struct HttpSearchIndex {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpSearchIndex {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: Client::new(),
        }
    }

    fn request(&self, url: &str, body: serde_json::Value) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    content: String,
}

#[async_trait::async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn insert(&self, partition: &Partition, text: &str) -> Result<(), ApiError> {
        let url = format!("{}/partitions/{}/rows", self.base_url, partition.name());
        let res = self
            .request(&url, json!({ "text": text }))
            .send()
            .await
            .map_err(|e| ApiError::IndexWrite(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ApiError::IndexWrite(format!(
                "partition {}: {}",
                partition.name(),
                res.status()
            )));
        }
        Ok(())
    }

    async fn query(
        &self,
        partition: &Partition,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/partitions/{}/query", self.base_url, partition.name());
        let res = self
            .request(&url, json!({ "query": query, "top_k": top_k }))
            .send()
            .await
            .map_err(|e| ApiError::IndexQuery(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ApiError::IndexQuery(format!(
                "partition {}: {}",
                partition.name(),
                res.status()
            )));
        }

        let payload: QueryResponse = res
            .json()
            .await
            .map_err(|e| ApiError::IndexQuery(e.to_string()))?;
        Ok(payload.matches.into_iter().map(|m| m.content).collect())
    }
}
