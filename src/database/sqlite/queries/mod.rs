
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

pub struct UsageQueries;

impl UsageQueries {
    /// Counts one request for `user_id` and returns the new total.
    ///
    /// A single upsert statement, so concurrent increments for the same user
    /// are serialized by SQLite and none are lost.
    #[inline]
    pub async fn record_request(pool: &SqlitePool, user_id: &str) -> Result<i64> {
        let now = Utc::now().naive_utc();
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users_details (user_id, request_count, last_request_at)
            VALUES (?, 1, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                request_count = request_count + 1,
                last_request_at = excluded.last_request_at
            RETURNING request_count
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to record request for user {}", user_id))?;

        debug!("User {} has made {} requests", user_id, count);
        Ok(count)
    }

    #[inline]
    pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<UserUsage>> {
        let usage = sqlx::query_as::<_, UserUsage>(
            r#"
            SELECT user_id,
                   request_count,
                   last_request_at
            FROM users_details WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get usage by user id")?;

        Ok(usage)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<UserUsage>> {
        let usage = sqlx::query_as::<_, UserUsage>(
            r#"
            SELECT user_id,
                   request_count,
                   last_request_at
            FROM users_details ORDER BY request_count DESC, user_id ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list usage")?;

        Ok(usage)
    }
}
