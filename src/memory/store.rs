//! Sqlite persistence for per-tenant conversation-memory documents.

use std::path::PathBuf;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;

use super::MemoryDocument;

#[derive(Clone)]
pub struct MemoryStore {
    pool: SqlitePool,
}

impl MemoryStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tenant_memory (
                tenant_id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;
        Ok(())
    }

    /// Load a tenant's memory document; tenants start with an empty one.
    pub async fn load(&self, tenant: &str) -> Result<MemoryDocument, ApiError> {
        let row = sqlx::query("SELECT document FROM tenant_memory WHERE tenant_id = ?1")
            .bind(tenant)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        match row {
            Some(row) => {
                let raw: String = row.get("document");
                serde_json::from_str(&raw)
                    .map_err(|e| ApiError::Parse(format!("memory document for {tenant}: {e}")))
            }
            None => Ok(MemoryDocument::default()),
        }
    }

    pub async fn save(&self, tenant: &str, document: &MemoryDocument) -> Result<(), ApiError> {
        let raw = serde_json::to_string(document).map_err(ApiError::internal)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO tenant_memory (tenant_id, document, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(tenant_id) DO UPDATE SET document = ?2, updated_at = ?3",
        )
        .bind(tenant)
        .bind(raw)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }
}
