//! Application service and ports for the Warden access-control engine.

#![forbid(unsafe_code)]

mod rbac_ports;
mod rbac_service;

pub use rbac_ports::{
    AssignmentInsert, AssignmentRecord, AssignmentRepository, AuditLogFilter, AuditLogInput,
    AuditLogRecord, AuditLogRepository, ClientInfo, NewAssignment, NewPermission, NewRole,
    PermissionKey, PermissionRecord, PermissionRepository, PermissionUsage, RolePatch, RoleRecord,
    RoleRepository,
};
pub use rbac_service::RbacService;
