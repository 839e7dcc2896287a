use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use warden_core::{Actor, AppError, AppResult, BaseRole, PermissionId, RoleId};
use warden_domain::{READ_ACTION, default_permissions};

use super::RbacService;
use crate::rbac_ports::{
    AssignmentInsert, AssignmentRecord, AssignmentRepository, AuditLogFilter, AuditLogInput,
    AuditLogRecord, AuditLogRepository, ClientInfo, NewAssignment, NewPermission, NewRole,
    PermissionKey, PermissionRecord, PermissionRepository, PermissionUsage, RolePatch, RoleRecord,
    RoleRepository,
};

#[derive(Default)]
struct SharedState {
    permissions: Vec<PermissionRecord>,
    roles: Vec<RoleRecord>,
    assignments: Vec<AssignmentRecord>,
    audit: Vec<(AuditLogInput, DateTime<Utc>)>,
    grant_lookups: usize,
    fail_assignments: bool,
    fail_audit: bool,
}

#[derive(Clone, Default)]
struct FakeStore {
    state: Arc<Mutex<SharedState>>,
}

impl FakeStore {
    async fn audit_len(&self) -> usize {
        self.state.lock().await.audit.len()
    }

    async fn last_audit(&self) -> AuditLogInput {
        let state = self.state.lock().await;
        let Some((input, _)) = state.audit.last() else {
            panic!("expected at least one audit entry");
        };
        input.clone()
    }

    async fn assignment_rows(&self, user_id: &str, role_id: RoleId) -> usize {
        let state = self.state.lock().await;
        state
            .assignments
            .iter()
            .filter(|row| row.user_id == user_id && row.role_id == role_id)
            .count()
    }

    async fn role_named(&self, name: &str) -> RoleRecord {
        let state = self.state.lock().await;
        let Some(role) = state.roles.iter().find(|role| role.name == name) else {
            panic!("expected role '{name}' to exist");
        };
        role.clone()
    }

    async fn permission_id_for(&self, resource: &str, action: &str) -> PermissionId {
        let state = self.state.lock().await;
        let Some(permission) = state
            .permissions
            .iter()
            .find(|row| row.resource == resource && row.action == action)
        else {
            panic!("expected permission '{resource}:{action}' to exist");
        };
        permission.id
    }

    async fn grant_lookups(&self) -> usize {
        self.state.lock().await.grant_lookups
    }

    async fn set_fail_assignments(&self, fail: bool) {
        self.state.lock().await.fail_assignments = fail;
    }

    async fn set_fail_audit(&self, fail: bool) {
        self.state.lock().await.fail_audit = fail;
    }
}

fn is_active(row: &AssignmentRecord, now: DateTime<Utc>) -> bool {
    row.expires_at.is_none_or(|instant| instant > now)
}

fn matches_filter(input: &AuditLogInput, created_at: DateTime<Utc>, filter: &AuditLogFilter) -> bool {
    filter
        .user_id
        .as_deref()
        .is_none_or(|user_id| input.user_id == user_id)
        && filter
            .action
            .as_deref()
            .is_none_or(|action| input.action == action)
        && filter
            .resource
            .as_deref()
            .is_none_or(|resource| input.resource == resource)
        && filter.success.is_none_or(|success| input.success == success)
        && filter.start.is_none_or(|start| created_at >= start)
        && filter.end.is_none_or(|end| created_at < end)
}

#[async_trait]
impl PermissionRepository for FakeStore {
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
                let mut users: Vec<&str> = state
                    .assignments
                    .iter()
                    .filter(|row| is_active(row, now) && granting_roles.contains(&row.role_id))
                    .map(|row| row.user_id.as_str())
                    .collect();
                users.sort_unstable();
                users.dedup();

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
impl RoleRepository for FakeStore {
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
impl AssignmentRepository for FakeStore {
    async fn insert(
        &self,
        input: NewAssignment,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentInsert> {
        let mut state = self.state.lock().await;
        if state.fail_assignments {
            return Err(AppError::Unavailable("assignment store offline".to_owned()));
        }

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
        let mut state = self.state.lock().await;
        state.grant_lookups += 1;
        if state.fail_assignments {
            return Err(AppError::Unavailable("assignment store offline".to_owned()));
        }

        let role_ids: Vec<RoleId> = state
            .assignments
            .iter()
            .filter(|row| row.user_id == user_id && is_active(row, now))
            .map(|row| row.role_id)
            .collect();
        let permission_ids: Vec<PermissionId> = state
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
impl AuditLogRepository for FakeStore {
    async fn append(&self, input: AuditLogInput) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_audit {
            return Err(AppError::Internal("audit store offline".to_owned()));
        }

        state.audit.push((input, Utc::now()));
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
            .enumerate()
            .rev()
            .filter(|(_, (input, created_at))| matches_filter(input, *created_at, filter))
            .skip(skip)
            .take(limit)
            .map(|(index, (input, created_at))| AuditLogRecord {
                id: index.to_string(),
                user_id: input.user_id.clone(),
                action: input.action.clone(),
                resource: input.resource.clone(),
                resource_id: input.resource_id.clone(),
                details: input.details.clone(),
                success: input.success,
                created_at: *created_at,
                ip_address: input.client.ip_address.clone(),
                user_agent: input.client.user_agent.clone(),
            })
            .collect())
    }

    async fn count(&self, filter: &AuditLogFilter) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .audit
            .iter()
            .filter(|(input, created_at)| matches_filter(input, *created_at, filter))
            .count() as u64)
    }
}

fn service_with_store() -> (RbacService, FakeStore) {
    let store = FakeStore::default();
    let service = RbacService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );
    (service, store)
}

fn admin_actor() -> Actor {
    Actor::new("root", BaseRole::new("admin"))
}

fn plain_actor(subject: &str) -> Actor {
    Actor::new(subject, BaseRole::new("user"))
}

fn client() -> ClientInfo {
    ClientInfo {
        ip_address: Some("198.51.100.7".to_owned()),
        user_agent: Some("warden-tests/1.0".to_owned()),
    }
}

async fn expect_audit_growth(store: &FakeStore, seen: &mut usize, label: &str) {
    let len = store.audit_len().await;
    assert!(
        len > *seen,
        "operation '{label}' did not append an audit entry"
    );
    *seen = len;
}

async fn editor_role(service: &RbacService, store: &FakeStore) -> RoleId {
    let initialized = service.initialize_rbac().await;
    assert!(initialized.is_ok());
    let read_id = store.permission_id_for("content", "read").await;
    let update_id = store.permission_id_for("content", "update").await;
    let created = service
        .create_role(
            "editor",
            "Edits content",
            &[read_id, update_id],
            &admin_actor(),
            &client(),
        )
        .await;
    match created {
        Ok(Some(role_id)) => role_id,
        other => panic!("expected editor role to be created, got {other:?}"),
    }
}

#[tokio::test]
async fn admin_base_role_short_circuits_without_store_access() {
    let (service, store) = service_with_store();

    let granted = service
        .user_has_permission("ghost", "content", "delete", &BaseRole::new("admin"))
        .await;

    assert!(matches!(granted, Ok(true)));
    assert_eq!(store.grant_lookups().await, 0);
}

#[tokio::test]
async fn user_without_assignments_is_denied() {
    let (service, _store) = service_with_store();

    let granted = service
        .user_has_permission("newcomer", "content", "delete", &BaseRole::new("user"))
        .await;

    assert!(matches!(granted, Ok(false)));
}

#[tokio::test]
async fn expired_assignment_grants_nothing() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let assigned = service
        .assign_role(
            "u1",
            role_id,
            &admin_actor(),
            Some(Utc::now() - Duration::seconds(1)),
            &client(),
        )
        .await;
    assert!(matches!(assigned, Ok(true)));

    let granted = service
        .user_has_permission("u1", "content", "read", &BaseRole::new("user"))
        .await;
    assert!(matches!(granted, Ok(false)));
}

#[tokio::test]
async fn future_expiry_grants_access_until_then() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let assigned = service
        .assign_role(
            "u1",
            role_id,
            &admin_actor(),
            Some(Utc::now() + Duration::hours(1)),
            &client(),
        )
        .await;
    assert!(matches!(assigned, Ok(true)));

    let granted = service
        .user_has_permission("u1", "content", "read", &BaseRole::new("user"))
        .await;
    assert!(matches!(granted, Ok(true)));
}

#[tokio::test]
async fn duplicate_active_assignment_is_rejected() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let first = service
        .assign_role("u1", role_id, &admin_actor(), None, &client())
        .await;
    let second = service
        .assign_role("u1", role_id, &admin_actor(), None, &client())
        .await;

    assert!(matches!(first, Ok(true)));
    assert!(matches!(second, Ok(false)));
    assert_eq!(store.assignment_rows("u1", role_id).await, 1);

    let last = store.last_audit().await;
    assert_eq!(last.action, "role_assigned");
    assert!(!last.success);
}

#[tokio::test]
async fn expired_assignment_is_reactivated_not_duplicated() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let expired = service
        .assign_role(
            "u1",
            role_id,
            &admin_actor(),
            Some(Utc::now() - Duration::seconds(1)),
            &client(),
        )
        .await;
    assert!(matches!(expired, Ok(true)));

    let renewed = service
        .assign_role(
            "u1",
            role_id,
            &admin_actor(),
            Some(Utc::now() + Duration::hours(1)),
            &client(),
        )
        .await;
    assert!(matches!(renewed, Ok(true)));
    assert_eq!(store.assignment_rows("u1", role_id).await, 1);

    let granted = service
        .user_has_permission("u1", "content", "read", &BaseRole::new("user"))
        .await;
    assert!(matches!(granted, Ok(true)));
}

#[tokio::test]
async fn system_roles_cannot_be_updated_or_deleted() {
    let (service, store) = service_with_store();
    assert!(service.initialize_rbac().await.is_ok());

    let admin_role = store.role_named("admin").await;

    let updated = service
        .update_role(
            admin_role.id,
            RolePatch {
                name: Some("x".to_owned()),
                ..RolePatch::default()
            },
            &admin_actor(),
            &client(),
        )
        .await;
    assert!(matches!(updated, Ok(false)));
    assert_eq!(store.role_named("admin").await, admin_role);

    let deleted = service
        .delete_role(admin_role.id, &admin_actor(), &client())
        .await;
    assert!(matches!(deleted, Ok(false)));
    assert_eq!(store.role_named("admin").await, admin_role);
}

#[tokio::test]
async fn role_deletion_is_guarded_by_active_assignments() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let assigned = service
        .assign_role("u1", role_id, &admin_actor(), None, &client())
        .await;
    assert!(matches!(assigned, Ok(true)));

    let blocked = service
        .delete_role(role_id, &admin_actor(), &client())
        .await;
    assert!(matches!(blocked, Ok(false)));

    let removed = service
        .remove_role("u1", role_id, &admin_actor(), &client())
        .await;
    assert!(matches!(removed, Ok(true)));

    let deleted = service
        .delete_role(role_id, &admin_actor(), &client())
        .await;
    assert!(matches!(deleted, Ok(true)));
}

#[tokio::test]
async fn every_engine_operation_appends_an_audit_entry() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;
    let actor = plain_actor("u1");

    let mut seen = store.audit_len().await;

    assert!(matches!(
        service
            .check_permission(&actor, "content", "read", &client())
            .await,
        Ok(false)
    ));
    expect_audit_growth(&store, &mut seen, "check_permission denied").await;

    assert!(matches!(
        service
            .assign_role("u1", role_id, &admin_actor(), None, &client())
            .await,
        Ok(true)
    ));
    expect_audit_growth(&store, &mut seen, "assign_role").await;

    assert!(matches!(
        service
            .check_permission(&actor, "content", "read", &client())
            .await,
        Ok(true)
    ));
    expect_audit_growth(&store, &mut seen, "check_permission granted").await;

    assert!(matches!(
        service
            .assign_role("u1", role_id, &admin_actor(), None, &client())
            .await,
        Ok(false)
    ));
    expect_audit_growth(&store, &mut seen, "assign_role duplicate").await;

    assert!(matches!(
        service
            .create_role("editor", "Duplicate", &[], &admin_actor(), &client())
            .await,
        Ok(None)
    ));
    expect_audit_growth(&store, &mut seen, "create_role duplicate name").await;

    assert!(matches!(
        service
            .update_role(
                role_id,
                RolePatch {
                    description: Some("Edits and reviews content".to_owned()),
                    ..RolePatch::default()
                },
                &admin_actor(),
                &client(),
            )
            .await,
        Ok(true)
    ));
    expect_audit_growth(&store, &mut seen, "update_role").await;

    assert!(matches!(
        service
            .remove_role("u1", role_id, &admin_actor(), &client())
            .await,
        Ok(true)
    ));
    expect_audit_growth(&store, &mut seen, "remove_role").await;

    assert!(matches!(
        service.delete_role(role_id, &admin_actor(), &client()).await,
        Ok(true)
    ));
    expect_audit_growth(&store, &mut seen, "delete_role").await;
}

#[tokio::test]
async fn initialize_rbac_is_idempotent() {
    let (service, store) = service_with_store();

    assert!(service.initialize_rbac().await.is_ok());
    let catalog_len = default_permissions().len();
    {
        let state = store.state.lock().await;
        assert_eq!(state.permissions.len(), catalog_len);
        assert_eq!(state.roles.len(), 2);
    }

    assert!(service.initialize_rbac().await.is_ok());
    let state = store.state.lock().await;
    assert_eq!(state.permissions.len(), catalog_len);
    assert_eq!(state.roles.len(), 2);

    let read_count = default_permissions()
        .iter()
        .filter(|entry| entry.action == READ_ACTION)
        .count();
    let Some(admin_role) = state.roles.iter().find(|role| role.name == "admin") else {
        panic!("expected admin system role");
    };
    let Some(user_role) = state.roles.iter().find(|role| role.name == "user") else {
        panic!("expected user system role");
    };
    assert!(admin_role.is_system);
    assert!(user_role.is_system);
    assert_eq!(admin_role.permission_ids.len(), catalog_len);
    assert_eq!(user_role.permission_ids.len(), read_count);
}

#[tokio::test]
async fn granted_role_matches_exactly_and_nothing_else() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let assigned = service
        .assign_role("u1", role_id, &plain_actor("admin1"), None, &client())
        .await;
    assert!(matches!(assigned, Ok(true)));

    let granted = service
        .user_has_permission("u1", "content", "read", &BaseRole::new("editor"))
        .await;
    assert!(matches!(granted, Ok(true)));

    let denied = service
        .user_has_permission("u1", "system", "delete", &BaseRole::new("editor"))
        .await;
    assert!(matches!(denied, Ok(false)));
}

#[tokio::test]
async fn denied_check_is_queryable_by_its_action_name() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;
    let actor = plain_actor("u1");

    let assigned = service
        .assign_role("u1", role_id, &admin_actor(), None, &client())
        .await;
    assert!(matches!(assigned, Ok(true)));

    let denied = service
        .check_permission(&actor, "content", "delete", &client())
        .await;
    assert!(matches!(denied, Ok(false)));

    let filter = AuditLogFilter {
        action: Some("access_denied_content_delete".to_owned()),
        ..AuditLogFilter::default()
    };
    let entries = match service.get_audit_logs(&filter, 10, 0).await {
        Ok(entries) => entries,
        Err(error) => panic!("audit query failed: {error}"),
    };
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|entry| {
        entry.action == "access_denied_content_delete" && !entry.success
    }));

    let total = service.get_audit_logs_count(&filter).await;
    assert!(matches!(total, Ok(count) if count as usize >= entries.len()));
}

#[tokio::test]
async fn store_failure_fails_closed_and_records_a_denial() {
    let (service, store) = service_with_store();
    let actor = plain_actor("u1");
    store.set_fail_assignments(true).await;

    let predicate = service
        .user_has_permission("u1", "content", "read", &BaseRole::new("user"))
        .await;
    assert!(matches!(predicate, Err(AppError::Unavailable(_))));

    let checked = service
        .check_permission(&actor, "content", "read", &client())
        .await;
    assert!(matches!(checked, Err(AppError::Unavailable(_))));

    let last = store.last_audit().await;
    assert_eq!(last.action, "access_denied_content_read");
    assert!(!last.success);
}

#[tokio::test]
async fn superuser_check_is_immune_to_store_failure() {
    let (service, store) = service_with_store();
    store.set_fail_assignments(true).await;

    let granted = service
        .user_has_permission("root", "system", "manage", &BaseRole::new("admin"))
        .await;
    assert!(matches!(granted, Ok(true)));
}

#[tokio::test]
async fn audit_write_failure_never_fails_the_operation() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;
    store.set_fail_audit(true).await;

    let assigned = service
        .assign_role("u1", role_id, &admin_actor(), None, &client())
        .await;
    assert!(matches!(assigned, Ok(true)));

    let checked = service
        .check_permission(&plain_actor("u1"), "content", "read", &client())
        .await;
    assert!(matches!(checked, Ok(true)));
}

#[tokio::test]
async fn remove_role_reports_whether_a_row_was_removed() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;

    let removed = service
        .remove_role("u1", role_id, &admin_actor(), &client())
        .await;
    assert!(matches!(removed, Ok(false)));

    let last = store.last_audit().await;
    assert_eq!(last.action, "role_removed");
    assert!(!last.success);
}

#[tokio::test]
async fn assigning_an_unknown_role_is_rejected() {
    let (service, store) = service_with_store();

    let assigned = service
        .assign_role("u1", RoleId::new(), &admin_actor(), None, &client())
        .await;
    assert!(matches!(assigned, Ok(false)));

    let last = store.last_audit().await;
    assert_eq!(last.action, "role_assigned");
    assert!(!last.success);
}

#[tokio::test]
async fn update_role_rejects_name_collision() {
    let (service, store) = service_with_store();
    let role_id = editor_role(&service, &store).await;
    let created = service
        .create_role("reviewer", "Reviews content", &[], &admin_actor(), &client())
        .await;
    assert!(matches!(created, Ok(Some(_))));

    let updated = service
        .update_role(
            role_id,
            RolePatch {
                name: Some("reviewer".to_owned()),
                ..RolePatch::default()
            },
            &admin_actor(),
            &client(),
        )
        .await;
    assert!(matches!(updated, Ok(false)));
    assert_eq!(store.role_named("editor").await.id, role_id);
}

#[tokio::test]
async fn update_role_on_missing_id_is_not_found() {
    let (service, _store) = service_with_store();

    let updated = service
        .update_role(
            RoleId::new(),
            RolePatch::default(),
            &admin_actor(),
            &client(),
        )
        .await;
    assert!(matches!(updated, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn referenced_permission_cannot_be_deleted() {
    let (service, store) = service_with_store();
    let _role_id = editor_role(&service, &store).await;
    let permission_id = store.permission_id_for("content", "read").await;

    let blocked = service
        .delete_permission(permission_id, &admin_actor(), &client())
        .await;
    assert!(matches!(blocked, Ok(false)));

    let last = store.last_audit().await;
    assert_eq!(last.action, "permission_deleted");
    assert!(!last.success);
}

#[tokio::test]
async fn duplicate_permission_create_returns_none() {
    let (service, store) = service_with_store();
    assert!(service.initialize_rbac().await.is_ok());

    let created = service
        .create_permission(
            NewPermission {
                name: "content_read_again".to_owned(),
                resource: "content".to_owned(),
                action: "read".to_owned(),
                description: "Duplicate of an existing pair".to_owned(),
            },
            &admin_actor(),
            &client(),
        )
        .await;
    assert!(matches!(created, Ok(None)));

    let last = store.last_audit().await;
    assert_eq!(last.action, "permission_created");
    assert!(!last.success);
}

#[tokio::test]
async fn admin_access_check_logs_section_decision() {
    let (service, store) = service_with_store();
    let actor = plain_actor("u1");

    let denied = service.check_admin_access(&actor, "audit", &client()).await;
    assert!(matches!(denied, Ok(false)));

    let last = store.last_audit().await;
    assert_eq!(last.action, "admin_access_audit");
    assert!(!last.success);

    let granted = service
        .check_admin_access(&admin_actor(), "audit", &client())
        .await;
    assert!(matches!(granted, Ok(true)));

    let last = store.last_audit().await;
    assert_eq!(last.action, "admin_access_audit");
    assert!(last.success);
}

#[tokio::test]
async fn content_and_media_wrappers_fix_the_action_names() {
    let (service, store) = service_with_store();

    service
        .log_content_action(
            "u1",
            "publish",
            Some("post-7".to_owned()),
            serde_json::json!({ "title": "Launch" }),
            true,
            &client(),
        )
        .await;
    let last = store.last_audit().await;
    assert_eq!(last.action, "content_publish");
    assert_eq!(last.resource, "content");
    assert_eq!(last.resource_id.as_deref(), Some("post-7"));

    service
        .log_media_action("u1", "upload", None, serde_json::json!({}), false, &client())
        .await;
    let last = store.last_audit().await;
    assert_eq!(last.action, "media_upload");
    assert_eq!(last.resource, "media");
    assert!(!last.success);
}
