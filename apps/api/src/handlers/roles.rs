use std::str::FromStr;

use warden_application::RolePatch;
use warden_core::{PermissionId, RoleId};

use super::*;

fn parse_permission_ids(values: &[String]) -> Result<Vec<PermissionId>, AppError> {
    values
        .iter()
        .map(|value| PermissionId::from_str(value))
        .collect()
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    ensure_permission(&state, &actor, &client, "role", "read").await?;

    let roles = state
        .rbac
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleCreatedResponse>)> {
    ensure_permission(&state, &actor, &client, "role", "create").await?;

    let permission_ids = parse_permission_ids(&payload.permission_ids)?;
    let created = state
        .rbac
        .create_role(
            payload.name.as_str(),
            payload.description.as_str(),
            &permission_ids,
            &actor,
            &client,
        )
        .await?;

    let Some(role_id) = created else {
        return Err(AppError::Conflict(format!(
            "role '{}' already exists",
            payload.name
        ))
        .into());
    };

    Ok((
        StatusCode::CREATED,
        Json(RoleCreatedResponse {
            role_id: role_id.to_string(),
        }),
    ))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<StatusCode> {
    ensure_permission(&state, &actor, &client, "role", "update").await?;

    let role_id = RoleId::from_str(role_id.as_str())?;
    let permission_ids = payload
        .permission_ids
        .as_deref()
        .map(parse_permission_ids)
        .transpose()?;

    let updated = state
        .rbac
        .update_role(
            role_id,
            RolePatch {
                name: payload.name,
                description: payload.description,
                permission_ids,
            },
            &actor,
            &client,
        )
        .await?;

    if !updated {
        return Err(AppError::Conflict(
            "role update rejected: system roles are immutable and role names must be unique"
                .to_owned(),
        )
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    ensure_permission(&state, &actor, &client, "role", "delete").await?;

    let role_id = RoleId::from_str(role_id.as_str())?;
    let deleted = state.rbac.delete_role(role_id, &actor, &client).await?;

    if !deleted {
        return Err(AppError::Conflict(
            "role deletion rejected: system roles and roles with active assignments cannot be deleted"
                .to_owned(),
        )
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}
