use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::{AppResult, RoleId};

use super::permissions::PermissionKey;

/// Assignment projection mapping a user to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    /// Subject the role is assigned to.
    pub user_id: String,
    /// Assigned role.
    pub role_id: RoleId,
    /// Subject that created the assignment.
    pub assigned_by: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Optional expiry; an assignment past this instant grants nothing
    /// even before it is purged.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input payload for creating an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    /// Subject the role is assigned to.
    pub user_id: String,
    /// Role to assign.
    pub role_id: RoleId,
    /// Subject creating the assignment.
    pub assigned_by: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of an assignment insert resolved atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentInsert {
    /// A new or reactivated assignment row now exists.
    Inserted,
    /// An active assignment for the pair already existed; nothing changed.
    AlreadyActive,
}

/// Repository port for user-role assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Inserts an assignment, or reactivates an expired one for the same
    /// `(user, role)` pair.
    ///
    /// The store resolves the duplicate-versus-reactivate decision
    /// atomically under its uniqueness constraint, so concurrent inserts
    /// for the same pair yield exactly one [`AssignmentInsert::Inserted`].
    async fn insert(
        &self,
        input: NewAssignment,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentInsert>;

    /// Deletes the assignment for a `(user, role)` pair, returning whether
    /// a row was removed.
    async fn delete(&self, user_id: &str, role_id: RoleId) -> AppResult<bool>;

    /// Lists all assignments for a user, expired ones included.
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<AssignmentRecord>>;

    /// Counts non-expired assignments referencing a role.
    async fn active_count_for_role(&self, role_id: RoleId, now: DateTime<Utc>) -> AppResult<u64>;

    /// Resolves the union of permission keys a user holds through
    /// non-expired assignments.
    async fn list_granted_keys(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionKey>>;
}
