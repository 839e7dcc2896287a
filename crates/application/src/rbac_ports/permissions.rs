use async_trait::async_trait;

use warden_core::{AppResult, PermissionId};

/// A `(resource, action)` pair, the unit of permission matching.
///
/// Matching is exact string equality on both fields; category-level grants
/// are explicit catalog rows, never wildcard patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionKey {
    /// Resource namespace.
    pub resource: String,
    /// Verb on the resource.
    pub action: String,
}

/// Permission returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Unique short label.
    pub name: String,
    /// Resource namespace.
    pub resource: String,
    /// Verb on the resource.
    pub action: String,
    /// Human-readable description.
    pub description: String,
}

/// Input payload for creating or upserting a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    /// Unique short label.
    pub name: String,
    /// Resource namespace.
    pub resource: String,
    /// Verb on the resource.
    pub action: String,
    /// Human-readable description.
    pub description: String,
}

/// Permission projection with reference counts for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionUsage {
    /// The permission itself.
    pub permission: PermissionRecord,
    /// Number of roles granting this permission.
    pub role_count: u64,
    /// Number of distinct users holding this permission through an active
    /// assignment.
    pub user_count: u64,
}

/// Repository port for the permission catalog.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Finds a permission by its identifier.
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<PermissionRecord>>;

    /// Finds a permission by its `(resource, action)` pair.
    async fn find_by_key(&self, resource: &str, action: &str)
    -> AppResult<Option<PermissionRecord>>;

    /// Lists the full permission catalog.
    async fn list_all(&self) -> AppResult<Vec<PermissionRecord>>;

    /// Inserts or refreshes a permission keyed by `(resource, action)`.
    ///
    /// Running the same upsert twice never produces a second row.
    async fn upsert(&self, input: NewPermission) -> AppResult<PermissionId>;

    /// Inserts a new permission.
    ///
    /// Fails with [`warden_core::AppError::Conflict`] when the
    /// `(resource, action)` pair or the name already exists.
    async fn insert(&self, input: NewPermission) -> AppResult<PermissionId>;

    /// Deletes a permission, returning whether a row was removed.
    async fn delete(&self, id: PermissionId) -> AppResult<bool>;

    /// Counts the roles referencing a permission.
    async fn role_reference_count(&self, id: PermissionId) -> AppResult<u64>;

    /// Lists the catalog with role and user reference counts.
    async fn list_usage(&self) -> AppResult<Vec<PermissionUsage>>;
}
