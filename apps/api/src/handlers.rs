use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use warden_application::{AuditLogFilter, ClientInfo};
use warden_core::{Actor, AppError};

use crate::dto::{
    AssignRoleRequest, AssignmentRemovedResponse, AssignmentResponse, AuditLogEntryResponse,
    AuditLogPageResponse, BulkAssignRolesRequest, BulkAssignmentOutcomeResponse,
    CreatePermissionRequest, CreateRoleRequest, HealthResponse, PermissionCreatedResponse,
    PermissionGroupResponse, PermissionUsageResponse, RemoveRoleAssignmentRequest,
    RoleCreatedResponse, RoleResponse, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::guard::ensure_permission;
use crate::state::AppState;

mod assignments;
mod audit;
mod health;
mod permissions;
mod roles;

pub use assignments::{
    assign_role_handler, bulk_assign_roles_handler, list_assignments_handler,
    remove_role_assignment_handler,
};
pub use audit::{export_audit_log_handler, list_audit_log_handler};
pub use health::health_handler;
pub use permissions::{
    create_permission_handler, delete_permission_handler, list_permissions_handler,
};
pub use roles::{
    create_role_handler, delete_role_handler, list_roles_handler, update_role_handler,
};
