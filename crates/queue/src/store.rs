use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use sqlx::types::Uuid;
use sqlx::{PgPool, Row};

use gambit_common::get_current_timestamp_ms;

use crate::intent::{Intent, IntentKind, IntentStatus};

const GC_RETENTION_MS: i64 = 24 * 60 * 60 * 1000;

/// Durable queue and reconciliation surface. The dispatcher, processor,
/// eligibility engine and intake all go through this trait; [`PgStore`]
/// is the production implementation.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    async fn enqueue(&self, intent: &Intent) -> Result<()>;

    /// Atomically claims the oldest pending row for `actor`, skipping rows
    /// locked by other dispatcher processes.
    async fn claim_next(&self, actor: &str) -> Result<Option<Intent>>;

    /// Distinct actors with pending work, oldest pending row first.
    async fn list_active_actors(&self, limit: i64) -> Result<Vec<String>>;

    async fn mark_completed(&self, id: &str) -> Result<()>;
    async fn mark_failed(&self, id: &str, error: &str) -> Result<()>;
    async fn requeue_pending(&self, id: &str, error: &str) -> Result<()>;
    async fn increment_retries(&self, id: &str) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;

    async fn set_game_object_id(&self, game_ref: Uuid, object_id: &str) -> Result<()>;
    async fn upsert_reward(&self, player_ref: Uuid, badge_type: &str, object_id: &str) -> Result<()>;

    async fn list_waiting_for_game(&self, game_ref: Uuid) -> Result<Vec<Intent>>;
    async fn unblock_waiting(&self, id: &str, object_id: &str) -> Result<()>;

    /// Deletes terminal rows older than 24 hours.
    async fn gc_old(&self) -> Result<u64>;

    /// I3 pre-check: a MintBadge row for this (actor, player, badge_type)
    /// already pending, processing or completed.
    async fn reward_intent_exists(
        &self,
        actor: &str,
        player_ref: Uuid,
        badge_type: &str,
    ) -> Result<bool>;

    async fn reward_exists(&self, player_ref: Uuid, badge_type: &str) -> Result<bool>;
    async fn resolve_player(&self, actor: &str) -> Result<Option<Uuid>>;

    async fn no_first_game(&self, player_ref: Uuid) -> Result<bool>;
    async fn no_first_game_created(&self, player_ref: Uuid) -> Result<bool>;
    async fn victories_total(&self, player_ref: Uuid) -> Result<i64>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct IntentRow {
    id: String,
    #[sqlx(rename = "type")]
    kind: String,
    player_sui_address: Option<String>,
    game_id: Option<Uuid>,
    player_id: Option<Uuid>,
    status: String,
    payload: Value,
    error: Option<String>,
    retries: i32,
    created_at: i64,
    updated_at: i64,
    processed_at: Option<i64>,
}

impl TryFrom<IntentRow> for Intent {
    type Error = anyhow::Error;

    fn try_from(row: IntentRow) -> Result<Self> {
        Ok(Intent {
            id: row.id,
            kind: row.kind.parse::<IntentKind>()?,
            actor: row.player_sui_address,
            game_ref: row.game_id,
            player_ref: row.player_id,
            status: row.status.parse::<IntentStatus>()?,
            payload: row.payload,
            error: row.error,
            retries: row.retries,
            created_at: row.created_at,
            updated_at: row.updated_at,
            processed_at: row.processed_at,
        })
    }
}

const INTENT_COLUMNS: &str =
    "id, type, player_sui_address, game_id, player_id, status, payload, error, retries, created_at, updated_at, processed_at";

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Creates the queue table and its indexes. `games`, `players`,
    /// `rewards` and the eligibility views are owned by the main
    /// application schema and consumed as-is.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transaction_queue (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                player_sui_address TEXT,
                game_id UUID,
                player_id UUID,
                status TEXT NOT NULL DEFAULT 'pending',
                payload JSONB NOT NULL DEFAULT '{}'::jsonb,
                error TEXT,
                retries INTEGER NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                processed_at BIGINT
            )
            "#,
        )
        .execute(&*self.pool)
        .await?;

        for index_sql in [
            "CREATE INDEX IF NOT EXISTS idx_tx_queue_status ON transaction_queue (status)",
            "CREATE INDEX IF NOT EXISTS idx_tx_queue_actor ON transaction_queue (player_sui_address)",
            "CREATE INDEX IF NOT EXISTS idx_tx_queue_created ON transaction_queue (created_at)",
            "CREATE INDEX IF NOT EXISTS idx_tx_queue_claim ON transaction_queue (status, player_sui_address, created_at)",
        ] {
            sqlx::query(index_sql).execute(&*self.pool).await?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn enqueue(&self, intent: &Intent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transaction_queue
                (id, type, player_sui_address, game_id, player_id, status, payload, error, retries, created_at, updated_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&intent.id)
        .bind(intent.kind.as_str())
        .bind(&intent.actor)
        .bind(intent.game_ref)
        .bind(intent.player_ref)
        .bind(intent.status.as_str())
        .bind(&intent.payload)
        .bind(&intent.error)
        .bind(intent.retries)
        .bind(intent.created_at)
        .bind(intent.updated_at)
        .bind(intent.processed_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn claim_next(&self, actor: &str) -> Result<Option<Intent>> {
        let row: Option<IntentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE transaction_queue
            SET status = 'processing', updated_at = $2
            WHERE id = (
                SELECT id FROM transaction_queue
                WHERE status = 'pending' AND player_sui_address = $1
                ORDER BY created_at ASC, id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {INTENT_COLUMNS}
            "#
        ))
        .bind(actor)
        .bind(get_current_timestamp_ms())
        .fetch_optional(&*self.pool)
        .await?;

        row.map(Intent::try_from).transpose()
    }

    async fn list_active_actors(&self, limit: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT player_sui_address FROM transaction_queue
            WHERE status = 'pending' AND player_sui_address IS NOT NULL
            GROUP BY player_sui_address
            ORDER BY MIN(created_at) ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.try_get::<String, _>("player_sui_address").ok())
            .collect())
    }

    async fn mark_completed(&self, id: &str) -> Result<()> {
        let now = get_current_timestamp_ms();
        sqlx::query(
            "UPDATE transaction_queue SET status = 'completed', processed_at = $2, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        let now = get_current_timestamp_ms();
        sqlx::query(
            "UPDATE transaction_queue SET status = 'failed', error = $2, processed_at = $3, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn requeue_pending(&self, id: &str, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE transaction_queue SET status = 'pending', error = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(get_current_timestamp_ms())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn increment_retries(&self, id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE transaction_queue SET retries = retries + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(get_current_timestamp_ms())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM transaction_queue WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn set_game_object_id(&self, game_ref: Uuid, object_id: &str) -> Result<()> {
        sqlx::query("UPDATE games SET object_id = $2 WHERE id = $1")
            .bind(game_ref)
            .bind(object_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_reward(&self, player_ref: Uuid, badge_type: &str, object_id: &str) -> Result<()> {
        let now = get_current_timestamp_ms();
        sqlx::query(
            r#"
            INSERT INTO rewards (id, player_id, badge_type, object_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (player_id, badge_type)
            DO UPDATE SET object_id = EXCLUDED.object_id, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(player_ref)
        .bind(badge_type)
        .bind(object_id)
        .bind(now)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn list_waiting_for_game(&self, game_ref: Uuid) -> Result<Vec<Intent>> {
        let rows: Vec<IntentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {INTENT_COLUMNS} FROM transaction_queue
            WHERE status = 'waiting_for_object_id' AND game_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(game_ref)
        .fetch_all(&*self.pool)
        .await?;

        rows.into_iter().map(Intent::try_from).collect()
    }

    async fn unblock_waiting(&self, id: &str, object_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transaction_queue
            SET status = 'pending',
                payload = jsonb_set(payload, '{game_object_id}', to_jsonb($2::text)),
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(object_id)
        .bind(get_current_timestamp_ms())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn gc_old(&self) -> Result<u64> {
        let cutoff = get_current_timestamp_ms() - GC_RETENTION_MS;
        let result = sqlx::query(
            "DELETE FROM transaction_queue WHERE status IN ('completed', 'failed') AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn reward_intent_exists(
        &self,
        actor: &str,
        player_ref: Uuid,
        badge_type: &str,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM transaction_queue
                WHERE type = 'mint_nft'
                  AND player_sui_address = $1
                  AND player_id = $2
                  AND payload->>'badge_type' = $3
                  AND status IN ('pending', 'processing', 'completed')
            )
            "#,
        )
        .bind(actor)
        .bind(player_ref)
        .bind(badge_type)
        .fetch_one(&*self.pool)
        .await?;
        Ok(exists)
    }

    async fn reward_exists(&self, player_ref: Uuid, badge_type: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rewards WHERE player_id = $1 AND badge_type = $2)",
        )
        .bind(player_ref)
        .bind(badge_type)
        .fetch_one(&*self.pool)
        .await?;
        Ok(exists)
    }

    async fn resolve_player(&self, actor: &str) -> Result<Option<Uuid>> {
        let id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM players WHERE sui_address = $1")
                .bind(actor)
                .fetch_optional(&*self.pool)
                .await?;
        Ok(id)
    }

    async fn no_first_game(&self, player_ref: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vw_users_no_first_game WHERE player_id = $1)",
        )
        .bind(player_ref)
        .fetch_one(&*self.pool)
        .await?;
        Ok(exists)
    }

    async fn no_first_game_created(&self, player_ref: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vw_users_no_first_game_created WHERE player_id = $1)",
        )
        .bind(player_ref)
        .fetch_one(&*self.pool)
        .await?;
        Ok(exists)
    }

    async fn victories_total(&self, player_ref: Uuid) -> Result<i64> {
        let victories: Option<i64> = sqlx::query_scalar(
            "SELECT victories FROM vw_users_victories WHERE player_id = $1",
        )
        .bind(player_ref)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(victories.unwrap_or(0))
    }
}
