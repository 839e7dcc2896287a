use async_trait::async_trait;

use warden_core::{AppResult, PermissionId, RoleId};

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Indicates an engine-managed role protected from mutation.
    pub is_system: bool,
    /// Permissions granted by the role.
    pub permission_ids: Vec<PermissionId>,
}

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Unique role name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Permissions granted by the role.
    pub permission_ids: Vec<PermissionId>,
}

/// Partial update applied to a custom role.
///
/// Unset fields keep their stored value; a set `permission_ids` replaces
/// the role's whole permission set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePatch {
    /// Replacement role name.
    pub name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement permission set.
    pub permission_ids: Option<Vec<PermissionId>>,
}

/// Repository port for role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by its identifier.
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<RoleRecord>>;

    /// Finds a role by its exact name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<RoleRecord>>;

    /// Lists all roles with their permission sets.
    async fn list_all(&self) -> AppResult<Vec<RoleRecord>>;

    /// Inserts a custom role and its grants.
    ///
    /// Fails with [`warden_core::AppError::Conflict`] when the name is
    /// already taken.
    async fn insert(&self, input: NewRole) -> AppResult<RoleId>;

    /// Replaces a stored role's name, description and permission set.
    ///
    /// Fails with [`warden_core::AppError::Conflict`] when the new name
    /// collides with another role.
    async fn save(&self, record: RoleRecord) -> AppResult<()>;

    /// Deletes a role, returning whether a row was removed.
    async fn delete(&self, id: RoleId) -> AppResult<bool>;

    /// Idempotently ensures a system role exists with exactly the given
    /// permission set.
    async fn ensure_system_role(
        &self,
        name: &str,
        description: &str,
        permission_ids: &[PermissionId],
    ) -> AppResult<RoleId>;
}
