use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use warden_application::{AuditLogFilter, AuditLogInput, AuditLogRecord, AuditLogRepository};
use warden_core::{AppError, AppResult};

/// PostgreSQL-backed repository for the append-only audit log.
///
/// Reads clamp `limit` to 1..=1000 and never load the full collection;
/// no update or delete statement exists for `audit_logs`.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: uuid::Uuid,
    user_id: String,
    action: String,
    resource: String,
    resource_id: Option<String>,
    details: serde_json::Value,
    success: bool,
    created_at: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::TEXT IS NULL OR user_id = $1)
        AND ($2::TEXT IS NULL OR action = $2)
        AND ($3::TEXT IS NULL OR resource = $3)
        AND ($4::BOOLEAN IS NULL OR success = $4)
        AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
        AND ($6::TIMESTAMPTZ IS NULL OR created_at < $6)
"#;

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, input: AuditLogInput) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (user_id, action, resource, resource_id, details, success, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(input.user_id.as_str())
        .bind(input.action.as_str())
        .bind(input.resource.as_str())
        .bind(input.resource_id.as_deref())
        .bind(&input.details)
        .bind(input.success)
        .bind(input.client.ip_address.as_deref())
        .bind(input.client.user_agent.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &AuditLogFilter,
        limit: usize,
        skip: usize,
    ) -> AppResult<Vec<AuditLogRecord>> {
        let capped_limit = limit.clamp(1, 1_000) as i64;
        let capped_offset = skip.min(1_000_000) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            r#"
            SELECT
                id, user_id, action, resource, resource_id,
                details, success, created_at, ip_address, user_agent
            FROM audit_logs
            {FILTER_CLAUSE}
            ORDER BY created_at DESC
            LIMIT $7
            OFFSET $8
            "#
        ))
        .bind(filter.user_id.as_deref())
        .bind(filter.action.as_deref())
        .bind(filter.resource.as_deref())
        .bind(filter.success)
        .bind(filter.start)
        .bind(filter.end)
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit entries: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| AuditLogRecord {
                id: row.id.to_string(),
                user_id: row.user_id,
                action: row.action,
                resource: row.resource,
                resource_id: row.resource_id,
                details: row.details,
                success: row.success,
                created_at: row.created_at,
                ip_address: row.ip_address,
                user_agent: row.user_agent,
            })
            .collect())
    }

    async fn count(&self, filter: &AuditLogFilter) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*)
            FROM audit_logs
            {FILTER_CLAUSE}
            "#
        ))
        .bind(filter.user_id.as_deref())
        .bind(filter.action.as_deref())
        .bind(filter.resource.as_deref())
        .bind(filter.success)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit entries: {error}")))?;

        Ok(count as u64)
    }
}
