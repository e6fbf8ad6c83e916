// Search history: a best-effort record of accepted requests.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use pricescout_common::SearchRequest;

#[async_trait]
pub trait SearchHistory: Send + Sync {
    async fn record(&self, request: &SearchRequest) -> Result<()>;
}

/// Postgres-backed history (`search_history` table).
pub struct PgSearchHistory {
    pool: PgPool,
}

impl PgSearchHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchHistory for PgSearchHistory {
    async fn record(&self, request: &SearchRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO search_history (id, product_name, brands, websites)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(&request.product_name)
        .bind(Json(request.brands.clone()))
        .bind(Json(request.websites.clone()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Used when no database is configured.
pub struct LogSearchHistory;

#[async_trait]
impl SearchHistory for LogSearchHistory {
    async fn record(&self, request: &SearchRequest) -> Result<()> {
        info!(
            product = %request.product_name,
            brands = ?request.brands,
            websites = ?request.websites,
            "Search recorded"
        );
        Ok(())
    }
}
