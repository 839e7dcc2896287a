use std::str::FromStr;

use warden_application::NewPermission;
use warden_core::PermissionId;

use super::*;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
) -> ApiResult<Json<Vec<PermissionGroupResponse>>> {
    ensure_permission(&state, &actor, &client, "role", "read").await?;

    let usage = state.rbac.list_permissions_with_usage().await?;

    // Rows arrive ordered by (resource, action); fold them into one group
    // per resource namespace.
    let mut groups: Vec<PermissionGroupResponse> = Vec::new();
    for row in usage {
        let resource = row.permission.resource.clone();
        let response = PermissionUsageResponse::from(row);
        match groups.last_mut() {
            Some(group) if group.resource == resource => group.permissions.push(response),
            _ => groups.push(PermissionGroupResponse {
                resource,
                permissions: vec![response],
            }),
        }
    }

    Ok(Json(groups))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionCreatedResponse>)> {
    ensure_permission(&state, &actor, &client, "system", "manage").await?;

    let created = state
        .rbac
        .create_permission(
            NewPermission {
                name: payload.name,
                resource: payload.resource.clone(),
                action: payload.action.clone(),
                description: payload.description,
            },
            &actor,
            &client,
        )
        .await?;

    let Some(permission_id) = created else {
        return Err(AppError::Conflict(format!(
            "permission '{}:{}' already exists",
            payload.resource, payload.action
        ))
        .into());
    };

    Ok((
        StatusCode::CREATED,
        Json(PermissionCreatedResponse {
            permission_id: permission_id.to_string(),
        }),
    ))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Path(permission_id): Path<String>,
) -> ApiResult<StatusCode> {
    ensure_permission(&state, &actor, &client, "system", "manage").await?;

    let permission_id = PermissionId::from_str(permission_id.as_str())?;
    let deleted = state
        .rbac
        .delete_permission(permission_id, &actor, &client)
        .await?;

    if !deleted {
        return Err(AppError::Conflict(
            "permission deletion rejected: it is still referenced by a role".to_owned(),
        )
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}
