use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use warden_application::{
    AssignmentInsert, AssignmentRecord, AssignmentRepository, AuditLogFilter, AuditLogInput,
    AuditLogRecord, AuditLogRepository, NewAssignment, NewPermission, NewRole, PermissionKey,
    PermissionRecord, PermissionRepository, PermissionUsage, RoleRecord, RoleRepository,
};
use warden_core::{AppError, AppResult, PermissionId, RoleId};

/// In-memory implementation of all four store ports.
///
/// Semantics mirror the Postgres adapters, including the atomic
/// duplicate-versus-reactivate assignment insert and the half-open audit
/// timestamp range. Intended for tests and single-process embedding;
/// wrap one instance in an `Arc` and hand clones of it to
/// [`warden_application::RbacService::new`] for each port.
#[derive(Default)]
pub struct InMemoryRbacStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    permissions: Vec<PermissionRecord>,
    roles: Vec<RoleRecord>,
    assignments: Vec<AssignmentRecord>,
    audit: Vec<AuditLogRecord>,
}

impl InMemoryRbacStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_active(row: &AssignmentRecord, now: DateTime<Utc>) -> bool {
    row.expires_at.is_none_or(|instant| instant > now)
}

fn matches_filter(record: &AuditLogRecord, filter: &AuditLogFilter) -> bool {
    filter
        .user_id
        .as_deref()
        .is_none_or(|user_id| record.user_id == user_id)
        && filter
            .action
            .as_deref()
            .is_none_or(|action| record.action == action)
        && filter
            .resource
            .as_deref()
            .is_none_or(|resource| record.resource == resource)
        && filter
            .success
            .is_none_or(|success| record.success == success)
        && filter.start.is_none_or(|start| record.created_at >= start)
        && filter.end.is_none_or(|end| record.created_at < end)
}

#[async_trait]
impl PermissionRepository for InMemoryRbacStore {
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<PermissionRecord>> {
        let state = self.state.lock().await;
        Ok(state.permissions.iter().find(|row| row.id == id).cloned())
    }

    async fn find_by_key(
        &self,
        resource: &str,
        action: &str,
    ) -> AppResult<Option<PermissionRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .permissions
            .iter()
            .find(|row| row.resource == resource && row.action == action)
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<PermissionRecord>> {
        Ok(self.state.lock().await.permissions.clone())
    }

    async fn upsert(&self, input: NewPermission) -> AppResult<PermissionId> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .permissions
            .iter_mut()
            .find(|row| row.resource == input.resource && row.action == input.action)
        {
            existing.name = input.name;
            existing.description = input.description;
            return Ok(existing.id);
        }

        let id = PermissionId::new();
        state.permissions.push(PermissionRecord {
            id,
            name: input.name,
            resource: input.resource,
            action: input.action,
            description: input.description,
        });
        Ok(id)
    }

    async fn insert(&self, input: NewPermission) -> AppResult<PermissionId> {
        let mut state = self.state.lock().await;
        let duplicate = state.permissions.iter().any(|row| {
            (row.resource == input.resource && row.action == input.action)
                || row.name == input.name
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "permission '{}:{}' already exists",
                input.resource, input.action
            )));
        }

        let id = PermissionId::new();
        state.permissions.push(PermissionRecord {
            id,
            name: input.name,
            resource: input.resource,
            action: input.action,
            description: input.description,
        });
        Ok(id)
    }

    async fn delete(&self, id: PermissionId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state
            .roles
            .iter()
            .any(|role| role.permission_ids.contains(&id))
        {
            return Err(AppError::Conflict(format!(
                "permission '{id}' is still referenced by a role"
            )));
        }

        let before = state.permissions.len();
        state.permissions.retain(|row| row.id != id);
        Ok(state.permissions.len() < before)
    }

    async fn role_reference_count(&self, id: PermissionId) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .filter(|role| role.permission_ids.contains(&id))
            .count() as u64)
    }

    async fn list_usage(&self) -> AppResult<Vec<PermissionUsage>> {
        let state = self.state.lock().await;
        let now = Utc::now();
        Ok(state
            .permissions
            .iter()
            .map(|permission| {
                let granting_roles: Vec<RoleId> = state
                    .roles
                    .iter()
                    .filter(|role| role.permission_ids.contains(&permission.id))
                    .map(|role| role.id)
                    .collect();
                let users: BTreeSet<&str> = state
                    .assignments
                    .iter()
                    .filter(|row| is_active(row, now) && granting_roles.contains(&row.role_id))
                    .map(|row| row.user_id.as_str())
                    .collect();

                PermissionUsage {
                    permission: permission.clone(),
                    role_count: granting_roles.len() as u64,
                    user_count: users.len() as u64,
                }
            })
            .collect())
    }
}

#[async_trait]
impl RoleRepository for InMemoryRbacStore {
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<RoleRecord>> {
        let state = self.state.lock().await;
        Ok(state.roles.iter().find(|row| row.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<RoleRecord>> {
        let state = self.state.lock().await;
        Ok(state.roles.iter().find(|row| row.name == name).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<RoleRecord>> {
        Ok(self.state.lock().await.roles.clone())
    }

    async fn insert(&self, input: NewRole) -> AppResult<RoleId> {
        let mut state = self.state.lock().await;
        if state.roles.iter().any(|row| row.name == input.name) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }

        let id = RoleId::new();
        state.roles.push(RoleRecord {
            id,
            name: input.name,
            description: input.description,
            is_system: false,
            permission_ids: input.permission_ids,
        });
        Ok(id)
    }

    async fn save(&self, record: RoleRecord) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .roles
            .iter()
            .any(|row| row.name == record.name && row.id != record.id)
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                record.name
            )));
        }

        let Some(existing) = state.roles.iter_mut().find(|row| row.id == record.id) else {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                record.id
            )));
        };
        *existing = record;
        Ok(())
    }

    async fn delete(&self, id: RoleId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.roles.len();
        state.roles.retain(|row| row.id != id);
        let removed = state.roles.len() < before;
        if removed {
            // Same effect as the ON DELETE CASCADE on user_roles.role_id.
            state.assignments.retain(|row| row.role_id != id);
        }
        Ok(removed)
    }

    async fn ensure_system_role(
        &self,
        name: &str,
        description: &str,
        permission_ids: &[PermissionId],
    ) -> AppResult<RoleId> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.roles.iter_mut().find(|row| row.name == name) {
            existing.description = description.to_owned();
            existing.is_system = true;
            existing.permission_ids = permission_ids.to_vec();
            return Ok(existing.id);
        }

        let id = RoleId::new();
        state.roles.push(RoleRecord {
            id,
            name: name.to_owned(),
            description: description.to_owned(),
            is_system: true,
            permission_ids: permission_ids.to_vec(),
        });
        Ok(id)
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryRbacStore {
    async fn insert(
        &self,
        input: NewAssignment,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentInsert> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .assignments
            .iter_mut()
            .find(|row| row.user_id == input.user_id && row.role_id == input.role_id)
        {
            if is_active(existing, now) {
                return Ok(AssignmentInsert::AlreadyActive);
            }

            existing.assigned_by = input.assigned_by;
            existing.assigned_at = now;
            existing.expires_at = input.expires_at;
            return Ok(AssignmentInsert::Inserted);
        }

        state.assignments.push(AssignmentRecord {
            user_id: input.user_id,
            role_id: input.role_id,
            assigned_by: input.assigned_by,
            assigned_at: now,
            expires_at: input.expires_at,
        });
        Ok(AssignmentInsert::Inserted)
    }

    async fn delete(&self, user_id: &str, role_id: RoleId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.assignments.len();
        state
            .assignments
            .retain(|row| !(row.user_id == user_id && row.role_id == role_id));
        Ok(state.assignments.len() < before)
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<AssignmentRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn active_count_for_role(&self, role_id: RoleId, now: DateTime<Utc>) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|row| row.role_id == role_id && is_active(row, now))
            .count() as u64)
    }

    async fn list_granted_keys(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionKey>> {
        let state = self.state.lock().await;
        let role_ids: Vec<RoleId> = state
            .assignments
            .iter()
            .filter(|row| row.user_id == user_id && is_active(row, now))
            .map(|row| row.role_id)
            .collect();
        let permission_ids: BTreeSet<PermissionId> = state
            .roles
            .iter()
            .filter(|role| role_ids.contains(&role.id))
            .flat_map(|role| role.permission_ids.iter().copied())
            .collect();

        Ok(state
            .permissions
            .iter()
            .filter(|row| permission_ids.contains(&row.id))
            .map(|row| PermissionKey {
                resource: row.resource.clone(),
                action: row.action.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryRbacStore {
    async fn append(&self, input: AuditLogInput) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.audit.push(AuditLogRecord {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            action: input.action,
            resource: input.resource,
            resource_id: input.resource_id,
            details: input.details,
            success: input.success,
            created_at: Utc::now(),
            ip_address: input.client.ip_address,
            user_agent: input.client.user_agent,
        });
        Ok(())
    }

    async fn list(
        &self,
        filter: &AuditLogFilter,
        limit: usize,
        skip: usize,
    ) -> AppResult<Vec<AuditLogRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|record| matches_filter(record, filter))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &AuditLogFilter) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .audit
            .iter()
            .filter(|record| matches_filter(record, filter))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests;
