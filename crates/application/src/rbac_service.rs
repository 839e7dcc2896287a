use std::sync::Arc;

use crate::rbac_ports::{
    AssignmentRepository, AuditLogRepository, PermissionRepository, RoleRepository,
};

mod assignments;
mod audit;
mod bootstrap;
mod checks;
mod permissions;
mod roles;
#[cfg(test)]
mod tests;

/// Access-control engine composing the four backing stores.
///
/// The service is stateless per call; every operation is an independent,
/// short-lived unit of work against the injected repositories, and every
/// decision or mutation appends to the audit log. Construct one instance
/// in the composition root and clone it freely.
#[derive(Clone)]
pub struct RbacService {
    permissions: Arc<dyn PermissionRepository>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    audit: Arc<dyn AuditLogRepository>,
}

impl RbacService {
    /// Creates a new engine from its four store dependencies.
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        audit: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            permissions,
            roles,
            assignments,
            audit,
        }
    }
}
