use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use warden_application::{
    AssignmentInsert, AssignmentRecord, AssignmentRepository, NewAssignment, PermissionKey,
};
use warden_core::{AppError, AppResult, RoleId};

/// PostgreSQL-backed repository for user-role assignments.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: String,
    role_id: uuid::Uuid,
    assigned_by: String,
    assigned_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct PermissionKeyRow {
    resource: String,
    action: String,
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn insert(
        &self,
        input: NewAssignment,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentInsert> {
        // The unique index on (user_id, role_id) makes the
        // duplicate-versus-reactivate decision atomic: the conditional
        // upsert touches the existing row only when it is expired, so zero
        // affected rows means an active assignment already exists.
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, assigned_by, assigned_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, role_id) DO UPDATE
            SET assigned_by = EXCLUDED.assigned_by,
                assigned_at = EXCLUDED.assigned_at,
                expires_at = EXCLUDED.expires_at
            WHERE user_roles.expires_at IS NOT NULL
                AND user_roles.expires_at <= $4
            "#,
        )
        .bind(input.user_id.as_str())
        .bind(input.role_id.as_uuid())
        .bind(input.assigned_by.as_str())
        .bind(now)
        .bind(input.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert assignment: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Ok(AssignmentInsert::AlreadyActive);
        }

        Ok(AssignmentInsert::Inserted)
    }

    async fn delete(&self, user_id: &str, role_id: RoleId) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1 AND role_id = $2
            "#,
        )
        .bind(user_id)
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete assignment: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<AssignmentRecord>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_id, role_id, assigned_by, assigned_at, expires_at
            FROM user_roles
            WHERE user_id = $1
            ORDER BY assigned_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| AssignmentRecord {
                user_id: row.user_id,
                role_id: RoleId::from_uuid(row.role_id),
                assigned_by: row.assigned_by,
                assigned_at: row.assigned_at,
                expires_at: row.expires_at,
            })
            .collect())
    }

    async fn active_count_for_role(&self, role_id: RoleId, now: DateTime<Utc>) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_roles
            WHERE role_id = $1
                AND (expires_at IS NULL OR expires_at > $2)
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count active assignments: {error}"))
        })?;

        Ok(count as u64)
    }

    async fn list_granted_keys(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionKey>> {
        let rows = sqlx::query_as::<_, PermissionKeyRow>(
            r#"
            SELECT DISTINCT permissions.resource, permissions.action
            FROM user_roles
            INNER JOIN role_permissions
                ON role_permissions.role_id = user_roles.role_id
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE user_roles.user_id = $1
                AND (user_roles.expires_at IS NULL OR user_roles.expires_at > $2)
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load granted keys: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| PermissionKey {
                resource: row.resource,
                action: row.action,
            })
            .collect())
    }
}
