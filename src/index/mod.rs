//! External search-index service interface.
//!
//! The index is consumed through a narrow write/query contract; partition
//! provisioning lives with account provisioning, outside this crate.

mod http;

pub use http::HttpSearchIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Kind of content source behind a private partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Github,
    Pdf,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::Github => "github",
            SourceKind::Pdf => "pdf",
        }
    }

    pub fn all() -> [SourceKind; 3] {
        [SourceKind::Web, SourceKind::Github, SourceKind::Pdf]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, tenant-scoped collection of indexed text rows.
///
/// Naming convention: the tenant-independent shared partition is `common`;
/// private partitions are `{tenant}_{web|github|pdf}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partition {
    Shared,
    Private { tenant: String, kind: SourceKind },
}

impl Partition {
    pub fn private(tenant: &str, kind: SourceKind) -> Self {
        Partition::Private {
            tenant: tenant.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Partition::Shared => "common".to_string(),
            Partition::Private { tenant, kind } => format!("{tenant}_{kind}"),
        }
    }
}

/// Narrow contract against the external index service.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Persist one text row into a partition.
    async fn insert(&self, partition: &Partition, text: &str) -> Result<(), ApiError>;

    /// Top-k similarity query against one partition, most relevant first.
    async fn query(
        &self,
        partition: &Partition,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, ApiError>;
}
