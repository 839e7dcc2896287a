use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use warden_application::{NewRole, RoleRecord, RoleRepository};
use warden_core::{AppError, AppResult, PermissionId, RoleId};

/// PostgreSQL-backed repository for role definitions.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    description: String,
    is_system: bool,
    permission_id: Option<uuid::Uuid>,
}

const ROLE_SELECT: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.name AS role_name,
        roles.description,
        roles.is_system,
        role_permissions.permission_id
    FROM roles
    LEFT JOIN role_permissions
        ON role_permissions.role_id = roles.id
"#;

fn aggregate_roles(rows: Vec<RoleRow>) -> Vec<RoleRecord> {
    let mut by_id: HashMap<uuid::Uuid, RoleRecord> = HashMap::new();

    for row in rows {
        let role = by_id.entry(row.role_id).or_insert_with(|| RoleRecord {
            id: RoleId::from_uuid(row.role_id),
            name: row.role_name.clone(),
            description: row.description.clone(),
            is_system: row.is_system,
            permission_ids: Vec::new(),
        });

        if let Some(permission_id) = row.permission_id {
            role.permission_ids
                .push(PermissionId::from_uuid(permission_id));
        }
    }

    let mut roles = by_id.into_values().collect::<Vec<_>>();
    roles.sort_by(|left, right| left.name.cmp(&right.name));
    roles
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to persist role: {error}"))
}

async fn replace_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: uuid::Uuid,
    permission_ids: &[PermissionId],
) -> AppResult<()> {
    sqlx::query(
        r#"
        DELETE FROM role_permissions
        WHERE role_id = $1
        "#,
    )
    .bind(role_id)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

    for permission_id in permission_ids {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_id.as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;
    }

    Ok(())
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("{ROLE_SELECT} WHERE roles.id = $1"))
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows).into_iter().next())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("{ROLE_SELECT} WHERE roles.name = $1"))
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows).into_iter().next())
    }

    async fn list_all(&self) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(ROLE_SELECT)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        Ok(aggregate_roles(rows))
    }

    async fn insert(&self, input: NewRole) -> AppResult<RoleId> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO roles (name, description, is_system)
            VALUES ($1, $2, false)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(input.description.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, input.name.as_str()))?;

        for permission_id in &input.permission_ids {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleId::from_uuid(role_id))
    }

    async fn save(&self, record: RoleRecord) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE roles
            SET name = $2,
                description = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.name.trim())
        .bind(record.description.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, record.name.as_str()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                record.id
            )));
        }

        replace_grants(&mut transaction, record.id.as_uuid(), &record.permission_ids).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn delete(&self, id: RoleId) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM roles
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn ensure_system_role(
        &self,
        name: &str,
        description: &str,
        permission_ids: &[PermissionId],
    ) -> AppResult<RoleId> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO roles (name, description, is_system)
            VALUES ($1, $2, true)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                is_system = true,
                updated_at = now()
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure system role: {error}")))?;

        replace_grants(&mut transaction, role_id, permission_ids).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleId::from_uuid(role_id))
    }
}
