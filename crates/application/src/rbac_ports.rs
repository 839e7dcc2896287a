mod assignments;
mod audit;
mod permissions;
mod roles;

pub use assignments::{AssignmentInsert, AssignmentRecord, AssignmentRepository, NewAssignment};
pub use audit::{AuditLogFilter, AuditLogInput, AuditLogRecord, AuditLogRepository, ClientInfo};
pub use permissions::{
    NewPermission, PermissionKey, PermissionRecord, PermissionRepository, PermissionUsage,
};
pub use roles::{NewRole, RolePatch, RoleRecord, RoleRepository};
