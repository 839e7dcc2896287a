use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by engine mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RbacAction {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a role is updated.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a role is assigned to a user.
    RoleAssigned,
    /// Emitted when a role assignment is removed.
    RoleRemoved,
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted once per bootstrap run.
    RbacInitialized,
}

impl RbacAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "role_created",
            Self::RoleUpdated => "role_updated",
            Self::RoleDeleted => "role_deleted",
            Self::RoleAssigned => "role_assigned",
            Self::RoleRemoved => "role_removed",
            Self::PermissionCreated => "permission_created",
            Self::PermissionDeleted => "permission_deleted",
            Self::RbacInitialized => "rbac_initialized",
        }
    }
}

/// Builds the audit action string for a permission-check decision.
///
/// Log consumers filter on these exact values: a granted check produces
/// `access_granted_{resource}_{action}` and a denied check produces
/// `access_denied_{resource}_{action}`.
#[must_use]
pub fn permission_check_action(granted: bool, resource: &str, action: &str) -> String {
    if granted {
        format!("access_granted_{resource}_{action}")
    } else {
        format!("access_denied_{resource}_{action}")
    }
}

/// Builds the audit action string for an admin-section access decision.
///
/// The decision itself travels in the entry's success flag; the action
/// string is always `admin_access_{section}`.
#[must_use]
pub fn admin_access_action(section: &str) -> String {
    format!("admin_access_{section}")
}

/// Builds the audit action string for a content operation.
#[must_use]
pub fn content_action(action: &str) -> String {
    format!("content_{action}")
}

/// Builds the audit action string for a media operation.
#[must_use]
pub fn media_action(action: &str) -> String {
    format!("media_{action}")
}
