use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::geo::repo_types::SearchHistoryEntry;

/// History store. Every query is scoped to the owning user.
#[async_trait]
pub trait HistoryRepo: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        ip_address: &str,
        geo_info: &str,
    ) -> anyhow::Result<SearchHistoryEntry>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SearchHistoryEntry>>;
    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgHistoryRepo {
    db: PgPool,
}

impl PgHistoryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryRepo for PgHistoryRepo {
    async fn insert(
        &self,
        user_id: Uuid,
        ip_address: &str,
        geo_info: &str,
    ) -> anyhow::Result<SearchHistoryEntry> {
        let entry = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            INSERT INTO search_history (id, user_id, ip_address, geo_info)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, ip_address, geo_info, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(ip_address)
        .bind(geo_info)
        .fetch_one(&self.db)
        .await
        .context("insert search history")?;
        Ok(entry)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SearchHistoryEntry>> {
        let rows = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            SELECT id, user_id, ip_address, geo_info, created_at
              FROM search_history
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list search history by user")?;
        Ok(rows)
    }

    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM search_history
             WHERE id = ANY($1) AND user_id = $2
            "#,
        )
        .bind(ids)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("delete search history")?;
        Ok(res.rows_affected())
    }
}
