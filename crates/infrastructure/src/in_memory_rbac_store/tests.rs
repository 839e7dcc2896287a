use chrono::{Duration, Utc};
use serde_json::json;

use warden_application::{
    AssignmentInsert, AssignmentRepository, AuditLogFilter, AuditLogInput, AuditLogRepository,
    ClientInfo, NewAssignment, NewPermission, NewRole, PermissionRepository, RoleRepository,
};
use warden_core::{AppError, PermissionId, RoleId};

use super::InMemoryRbacStore;

async fn seed_permission(store: &InMemoryRbacStore, resource: &str, action: &str) -> PermissionId {
    let upserted = PermissionRepository::upsert(
        store,
        NewPermission {
            name: format!("{resource}_{action}"),
            resource: resource.to_owned(),
            action: action.to_owned(),
            description: String::new(),
        },
    )
    .await;
    match upserted {
        Ok(id) => id,
        Err(error) => panic!("failed to seed permission: {error}"),
    }
}

async fn seed_role(store: &InMemoryRbacStore, name: &str, permission_ids: Vec<PermissionId>) -> RoleId {
    let inserted = RoleRepository::insert(
        store,
        NewRole {
            name: name.to_owned(),
            description: String::new(),
            permission_ids,
        },
    )
    .await;
    match inserted {
        Ok(id) => id,
        Err(error) => panic!("failed to seed role: {error}"),
    }
}

fn assignment(user_id: &str, role_id: RoleId, expires_at: Option<chrono::DateTime<Utc>>) -> NewAssignment {
    NewAssignment {
        user_id: user_id.to_owned(),
        role_id,
        assigned_by: "admin1".to_owned(),
        expires_at,
    }
}

fn entry(user_id: &str, action: &str, resource: &str, success: bool) -> AuditLogInput {
    AuditLogInput {
        user_id: user_id.to_owned(),
        action: action.to_owned(),
        resource: resource.to_owned(),
        resource_id: None,
        details: json!({}),
        success,
        client: ClientInfo::default(),
    }
}

#[tokio::test]
async fn duplicate_active_assignment_is_already_active() {
    let store = InMemoryRbacStore::new();
    let role_id = seed_role(&store, "editor", Vec::new()).await;
    let now = Utc::now();

    let first = AssignmentRepository::insert(&store, assignment("u1", role_id, None), now).await;
    let second = AssignmentRepository::insert(&store, assignment("u1", role_id, None), now).await;

    assert!(matches!(first, Ok(AssignmentInsert::Inserted)));
    assert!(matches!(second, Ok(AssignmentInsert::AlreadyActive)));
}

#[tokio::test]
async fn expired_assignment_is_reactivated_in_place() {
    let store = InMemoryRbacStore::new();
    let role_id = seed_role(&store, "editor", Vec::new()).await;
    let now = Utc::now();

    let expired = AssignmentRepository::insert(
        &store,
        assignment("u1", role_id, Some(now - Duration::seconds(1))),
        now,
    )
    .await;
    assert!(matches!(expired, Ok(AssignmentInsert::Inserted)));

    let renewed_expiry = now + Duration::hours(1);
    let renewed = AssignmentRepository::insert(
        &store,
        assignment("u1", role_id, Some(renewed_expiry)),
        now,
    )
    .await;
    assert!(matches!(renewed, Ok(AssignmentInsert::Inserted)));

    let rows = match AssignmentRepository::list_for_user(&store, "u1").await {
        Ok(rows) => rows,
        Err(error) => panic!("failed to list assignments: {error}"),
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].expires_at, Some(renewed_expiry));
}

#[tokio::test]
async fn granted_keys_are_the_deduplicated_union_across_roles() {
    let store = InMemoryRbacStore::new();
    let read_id = seed_permission(&store, "content", "read").await;
    let publish_id = seed_permission(&store, "content", "publish").await;
    let editor_id = seed_role(&store, "editor", vec![read_id, publish_id]).await;
    let reviewer_id = seed_role(&store, "reviewer", vec![read_id]).await;
    let now = Utc::now();

    for role_id in [editor_id, reviewer_id] {
        let inserted =
            AssignmentRepository::insert(&store, assignment("u1", role_id, None), now).await;
        assert!(matches!(inserted, Ok(AssignmentInsert::Inserted)));
    }

    let keys = match AssignmentRepository::list_granted_keys(&store, "u1", now).await {
        Ok(keys) => keys,
        Err(error) => panic!("failed to load granted keys: {error}"),
    };
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().any(|key| key.action == "read"));
    assert!(keys.iter().any(|key| key.action == "publish"));
}

#[tokio::test]
async fn audit_entries_list_newest_first_with_pagination() {
    let store = InMemoryRbacStore::new();
    for index in 0..5 {
        let appended = AuditLogRepository::append(
            &store,
            entry("u1", &format!("content_update_{index}"), "content", true),
        )
        .await;
        assert!(appended.is_ok());
    }

    let filter = AuditLogFilter::default();
    let first_page = match AuditLogRepository::list(&store, &filter, 2, 0).await {
        Ok(entries) => entries,
        Err(error) => panic!("failed to list audit entries: {error}"),
    };
    let second_page = match AuditLogRepository::list(&store, &filter, 2, 2).await {
        Ok(entries) => entries,
        Err(error) => panic!("failed to list audit entries: {error}"),
    };

    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].action, "content_update_4");
    assert_eq!(first_page[1].action, "content_update_3");
    assert_eq!(second_page[0].action, "content_update_2");
    assert_eq!(second_page[1].action, "content_update_1");
    assert!(matches!(
        AuditLogRepository::count(&store, &filter).await,
        Ok(5)
    ));
}

#[tokio::test]
async fn audit_filters_restrict_results() {
    let store = InMemoryRbacStore::new();
    let rows = [
        entry("alice", "access_granted_content_read", "content", true),
        entry("alice", "access_denied_content_delete", "content", false),
        entry("bob", "access_granted_media_read", "media", true),
    ];
    for row in rows {
        assert!(AuditLogRepository::append(&store, row).await.is_ok());
    }

    let by_user = AuditLogFilter {
        user_id: Some("alice".to_owned()),
        ..AuditLogFilter::default()
    };
    assert!(matches!(
        AuditLogRepository::count(&store, &by_user).await,
        Ok(2)
    ));

    let by_action = AuditLogFilter {
        action: Some("access_denied_content_delete".to_owned()),
        ..AuditLogFilter::default()
    };
    assert!(matches!(
        AuditLogRepository::count(&store, &by_action).await,
        Ok(1)
    ));

    let by_resource = AuditLogFilter {
        resource: Some("media".to_owned()),
        ..AuditLogFilter::default()
    };
    assert!(matches!(
        AuditLogRepository::count(&store, &by_resource).await,
        Ok(1)
    ));

    let failures = AuditLogFilter {
        success: Some(false),
        ..AuditLogFilter::default()
    };
    assert!(matches!(
        AuditLogRepository::count(&store, &failures).await,
        Ok(1)
    ));
}

#[tokio::test]
async fn audit_timestamp_range_is_half_open() {
    let store = InMemoryRbacStore::new();
    assert!(
        AuditLogRepository::append(&store, entry("u1", "content_update", "content", true))
            .await
            .is_ok()
    );

    let listed = match AuditLogRepository::list(&store, &AuditLogFilter::default(), 1, 0).await {
        Ok(entries) => entries,
        Err(error) => panic!("failed to list audit entries: {error}"),
    };
    let Some(record) = listed.first() else {
        panic!("expected one audit entry");
    };

    let from_created_at = AuditLogFilter {
        start: Some(record.created_at),
        ..AuditLogFilter::default()
    };
    assert!(matches!(
        AuditLogRepository::count(&store, &from_created_at).await,
        Ok(1)
    ));

    let until_created_at = AuditLogFilter {
        end: Some(record.created_at),
        ..AuditLogFilter::default()
    };
    assert!(matches!(
        AuditLogRepository::count(&store, &until_created_at).await,
        Ok(0)
    ));
}

#[tokio::test]
async fn usage_counts_track_roles_and_active_users() {
    let store = InMemoryRbacStore::new();
    let read_id = seed_permission(&store, "content", "read").await;
    let editor_id = seed_role(&store, "editor", vec![read_id]).await;
    let reviewer_id = seed_role(&store, "reviewer", vec![read_id]).await;
    let now = Utc::now();

    let active = AssignmentRepository::insert(&store, assignment("u1", editor_id, None), now).await;
    assert!(matches!(active, Ok(AssignmentInsert::Inserted)));
    let expired = AssignmentRepository::insert(
        &store,
        assignment("u2", reviewer_id, Some(now - Duration::seconds(1))),
        now,
    )
    .await;
    assert!(matches!(expired, Ok(AssignmentInsert::Inserted)));

    let usage = match PermissionRepository::list_usage(&store).await {
        Ok(usage) => usage,
        Err(error) => panic!("failed to list usage: {error}"),
    };
    let Some(read_usage) = usage.iter().find(|row| row.permission.id == read_id) else {
        panic!("expected usage row for content:read");
    };
    assert_eq!(read_usage.role_count, 2);
    assert_eq!(read_usage.user_count, 1);
}

#[tokio::test]
async fn referenced_permission_delete_is_a_conflict() {
    let store = InMemoryRbacStore::new();
    let read_id = seed_permission(&store, "content", "read").await;
    let _role_id = seed_role(&store, "editor", vec![read_id]).await;

    let deleted = PermissionRepository::delete(&store, read_id).await;
    assert!(matches!(deleted, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn role_delete_cascades_assignment_rows() {
    let store = InMemoryRbacStore::new();
    let role_id = seed_role(&store, "editor", Vec::new()).await;
    let now = Utc::now();

    let inserted = AssignmentRepository::insert(
        &store,
        assignment("u1", role_id, Some(now - Duration::seconds(1))),
        now,
    )
    .await;
    assert!(matches!(inserted, Ok(AssignmentInsert::Inserted)));

    assert!(matches!(RoleRepository::delete(&store, role_id).await, Ok(true)));

    let rows = match AssignmentRepository::list_for_user(&store, "u1").await {
        Ok(rows) => rows,
        Err(error) => panic!("failed to list assignments: {error}"),
    };
    assert!(rows.is_empty());
}

#[tokio::test]
async fn ensure_system_role_replaces_the_grant_set() {
    let store = InMemoryRbacStore::new();
    let read_id = seed_permission(&store, "content", "read").await;
    let publish_id = seed_permission(&store, "content", "publish").await;

    let first = RoleRepository::ensure_system_role(&store, "admin", "Full access", &[read_id]).await;
    let second =
        RoleRepository::ensure_system_role(&store, "admin", "Full access", &[read_id, publish_id])
            .await;
    assert!(first.is_ok());
    assert!(second.is_ok());

    let role = match RoleRepository::find_by_name(&store, "admin").await {
        Ok(Some(role)) => role,
        other => panic!("expected admin role, got {other:?}"),
    };
    assert!(role.is_system);
    assert_eq!(role.permission_ids.len(), 2);
}
