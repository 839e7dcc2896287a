use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use warden_application::{NewPermission, PermissionRecord, PermissionRepository, PermissionUsage};
use warden_core::{AppError, AppResult, PermissionId};

/// PostgreSQL-backed repository for the permission catalog.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    name: String,
    resource: String,
    action: String,
    description: String,
}

#[derive(Debug, FromRow)]
struct PermissionUsageRow {
    id: uuid::Uuid,
    name: String,
    resource: String,
    action: String,
    description: String,
    role_count: i64,
    user_count: i64,
}

fn map_permission(row: PermissionRow) -> PermissionRecord {
    PermissionRecord {
        id: PermissionId::from_uuid(row.id),
        name: row.name,
        resource: row.resource,
        action: row.action,
        description: row.description,
    }
}

fn map_permission_conflict(error: sqlx::Error, resource: &str, action: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "permission '{resource}:{action}' already exists"
        ));
    }

    AppError::Internal(format!("failed to create permission: {error}"))
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<PermissionRecord>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource, action, description
            FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        Ok(row.map(map_permission))
    }

    async fn find_by_key(
        &self,
        resource: &str,
        action: &str,
    ) -> AppResult<Option<PermissionRecord>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource, action, description
            FROM permissions
            WHERE resource = $1 AND action = $2
            "#,
        )
        .bind(resource)
        .bind(action)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        Ok(row.map(map_permission))
    }

    async fn list_all(&self) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource, action, description
            FROM permissions
            ORDER BY resource, action
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        Ok(rows.into_iter().map(map_permission).collect())
    }

    async fn upsert(&self, input: NewPermission) -> AppResult<PermissionId> {
        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO permissions (name, resource, action, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (resource, action) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description
            RETURNING id
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.resource.as_str())
        .bind(input.action.as_str())
        .bind(input.description.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert permission: {error}")))?;

        Ok(PermissionId::from_uuid(id))
    }

    async fn insert(&self, input: NewPermission) -> AppResult<PermissionId> {
        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO permissions (name, resource, action, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.resource.as_str())
        .bind(input.action.as_str())
        .bind(input.description.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            map_permission_conflict(error, input.resource.as_str(), input.action.as_str())
        })?;

        Ok(PermissionId::from_uuid(id))
    }

    async fn delete(&self, id: PermissionId) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23503")
            {
                return AppError::Conflict(format!(
                    "permission '{id}' is still referenced by a role"
                ));
            }

            AppError::Internal(format!("failed to delete permission: {error}"))
        })?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn role_reference_count(&self, id: PermissionId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM role_permissions
            WHERE permission_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count permission references: {error}"))
        })?;

        Ok(count as u64)
    }

    async fn list_usage(&self) -> AppResult<Vec<PermissionUsage>> {
        let rows = sqlx::query_as::<_, PermissionUsageRow>(
            r#"
            SELECT
                permissions.id,
                permissions.name,
                permissions.resource,
                permissions.action,
                permissions.description,
                COUNT(DISTINCT role_permissions.role_id) AS role_count,
                COUNT(DISTINCT user_roles.user_id) FILTER (
                    WHERE user_roles.expires_at IS NULL OR user_roles.expires_at > now()
                ) AS user_count
            FROM permissions
            LEFT JOIN role_permissions
                ON role_permissions.permission_id = permissions.id
            LEFT JOIN user_roles
                ON user_roles.role_id = role_permissions.role_id
            GROUP BY permissions.id
            ORDER BY permissions.resource, permissions.action
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permission usage: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| PermissionUsage {
                permission: PermissionRecord {
                    id: PermissionId::from_uuid(row.id),
                    name: row.name,
                    resource: row.resource,
                    action: row.action,
                    description: row.description,
                },
                role_count: row.role_count as u64,
                user_count: row.user_count as u64,
            })
            .collect())
    }
}
