use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_application::{AssignmentRecord, AuditLogRecord, PermissionUsage, RoleRecord};

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permission_ids: Vec<String>,
}

/// Incoming payload for role updates; unset fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<String>>,
}

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub description: String,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: String,
    pub role_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Incoming payload for bulk role assignment.
#[derive(Debug, Deserialize)]
pub struct BulkAssignRolesRequest {
    pub user_ids: Vec<String>,
    pub role_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Incoming payload for role assignment removal.
#[derive(Debug, Deserialize)]
pub struct RemoveRoleAssignmentRequest {
    pub user_id: String,
    pub role_id: String,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub description: String,
    pub is_system: bool,
    pub permission_ids: Vec<String>,
}

/// Response for a created role.
#[derive(Debug, Serialize)]
pub struct RoleCreatedResponse {
    pub role_id: String,
}

/// Response for a created permission.
#[derive(Debug, Serialize)]
pub struct PermissionCreatedResponse {
    pub permission_id: String,
}

/// API representation of one permission with usage counts.
#[derive(Debug, Serialize)]
pub struct PermissionUsageResponse {
    pub permission_id: String,
    pub name: String,
    pub action: String,
    pub description: String,
    pub role_count: u64,
    pub user_count: u64,
}

/// Permissions of one resource namespace, for grouped listings.
#[derive(Debug, Serialize)]
pub struct PermissionGroupResponse {
    pub resource: String,
    pub permissions: Vec<PermissionUsageResponse>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub user_id: String,
    pub role_id: String,
    pub assigned_by: String,
    pub assigned_at: String,
    pub expires_at: Option<String>,
}

/// Per-user outcome of a bulk assignment.
#[derive(Debug, Serialize)]
pub struct BulkAssignmentOutcomeResponse {
    pub user_id: String,
    pub assigned: bool,
}

/// Response for a role assignment removal.
#[derive(Debug, Serialize)]
pub struct AssignmentRemovedResponse {
    pub removed: bool,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub details: serde_json::Value,
    pub success: bool,
    pub created_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One page of audit entries plus the filtered total.
#[derive(Debug, Serialize)]
pub struct AuditLogPageResponse {
    pub entries: Vec<AuditLogEntryResponse>,
    pub total: u64,
}

/// Service health payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
}

impl From<RoleRecord> for RoleResponse {
    fn from(value: RoleRecord) -> Self {
        Self {
            role_id: value.id.to_string(),
            name: value.name,
            description: value.description,
            is_system: value.is_system,
            permission_ids: value
                .permission_ids
                .into_iter()
                .map(|permission_id| permission_id.to_string())
                .collect(),
        }
    }
}

impl From<PermissionUsage> for PermissionUsageResponse {
    fn from(value: PermissionUsage) -> Self {
        Self {
            permission_id: value.permission.id.to_string(),
            name: value.permission.name,
            action: value.permission.action,
            description: value.permission.description,
            role_count: value.role_count,
            user_count: value.user_count,
        }
    }
}

impl From<AssignmentRecord> for AssignmentResponse {
    fn from(value: AssignmentRecord) -> Self {
        Self {
            user_id: value.user_id,
            role_id: value.role_id.to_string(),
            assigned_by: value.assigned_by,
            assigned_at: value.assigned_at.to_rfc3339(),
            expires_at: value.expires_at.map(|instant| instant.to_rfc3339()),
        }
    }
}

impl From<AuditLogRecord> for AuditLogEntryResponse {
    fn from(value: AuditLogRecord) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            action: value.action,
            resource: value.resource,
            resource_id: value.resource_id,
            details: value.details,
            success: value.success,
            created_at: value.created_at.to_rfc3339(),
            ip_address: value.ip_address,
            user_agent: value.user_agent,
        }
    }
}
