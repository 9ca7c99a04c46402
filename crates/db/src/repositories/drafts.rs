use async_trait::async_trait;
use changeorder_core::domain::draft::Draft;
use changeorder_core::errors::DraftStoreError;
use changeorder_core::gateway::DraftStore;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use super::RepositoryError;
use crate::DbPool;

/// One persisted wizard draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredDraft {
    pub account_key: String,
    pub payload_json: String,
    pub current_step: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed [`DraftStore`], one row per account key.
#[derive(Clone)]
pub struct SqlDraftStore {
    pool: DbPool,
}

impl SqlDraftStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, account_key: &str) -> Result<Option<StoredDraft>, RepositoryError> {
        let row = sqlx::query(
            "SELECT account_key, payload_json, current_step, created_at, updated_at
             FROM change_order_draft
             WHERE account_key = ?",
        )
        .bind(account_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(draft_from_row).transpose()
    }

    pub async fn upsert(&self, account_key: &str, payload_json: &str) -> Result<(), RepositoryError> {
        // The step is copied out of the blob for listing; an undecodable blob still saves.
        let current_step = Draft::decode(payload_json).ok().and_then(|draft| draft.current_step);
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO change_order_draft (
                account_key,
                payload_json,
                current_step,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(account_key) DO UPDATE SET
                payload_json = excluded.payload_json,
                current_step = excluded.current_step,
                updated_at = excluded.updated_at",
        )
        .bind(account_key)
        .bind(payload_json)
        .bind(current_step.map(i64::from))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(event_name = "db.draft.saved", account_id = %account_key, "draft row upserted");
        Ok(())
    }

    pub async fn delete(&self, account_key: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM change_order_draft WHERE account_key = ?")
            .bind(account_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM change_order_draft")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("count")?)
    }
}

#[async_trait]
impl DraftStore for SqlDraftStore {
    async fn load(&self, account_key: &str) -> Result<Option<String>, DraftStoreError> {
        Ok(self.find(account_key).await?.map(|draft| draft.payload_json))
    }

    async fn save(&self, account_key: &str, blob: &str) -> Result<(), DraftStoreError> {
        self.upsert(account_key, blob).await.map_err(Into::into)
    }

    async fn discard(&self, account_key: &str) -> Result<(), DraftStoreError> {
        self.delete(account_key).await?;
        Ok(())
    }
}

fn draft_from_row(row: SqliteRow) -> Result<StoredDraft, RepositoryError> {
    let current_step = row
        .try_get::<Option<i64>, _>("current_step")?
        .map(|step| {
            u8::try_from(step)
                .map_err(|_| RepositoryError::Decode(format!("invalid draft step `{step}`")))
        })
        .transpose()?;

    Ok(StoredDraft {
        account_key: row.try_get("account_key")?,
        payload_json: row.try_get("payload_json")?,
        current_step,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {error}")))
}
