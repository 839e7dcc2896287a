use std::str::FromStr;

use serde::Deserialize;

use warden_core::RoleId;

use super::*;

#[derive(Debug, Deserialize)]
pub struct AssignmentListQuery {
    pub user_id: String,
}

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Query(query): Query<AssignmentListQuery>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    ensure_permission(&state, &actor, &client, "role", "read").await?;

    let assignments = state
        .rbac
        .list_assignments_for_user(query.user_id.as_str())
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<StatusCode> {
    ensure_permission(&state, &actor, &client, "role", "assign").await?;

    let role_id = RoleId::from_str(payload.role_id.as_str())?;
    let assigned = state
        .rbac
        .assign_role(
            payload.user_id.as_str(),
            role_id,
            &actor,
            payload.expires_at,
            &client,
        )
        .await?;

    if !assigned {
        return Err(AppError::Conflict(
            "assignment rejected: role missing or already assigned".to_owned(),
        )
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_assign_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Json(payload): Json<BulkAssignRolesRequest>,
) -> ApiResult<Json<Vec<BulkAssignmentOutcomeResponse>>> {
    ensure_permission(&state, &actor, &client, "role", "assign").await?;

    let role_id = RoleId::from_str(payload.role_id.as_str())?;
    let mut outcomes = Vec::with_capacity(payload.user_ids.len());
    for user_id in payload.user_ids {
        let assigned = state
            .rbac
            .assign_role(user_id.as_str(), role_id, &actor, payload.expires_at, &client)
            .await?;
        outcomes.push(BulkAssignmentOutcomeResponse { user_id, assigned });
    }

    Ok(Json(outcomes))
}

pub async fn remove_role_assignment_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Json(payload): Json<RemoveRoleAssignmentRequest>,
) -> ApiResult<Json<AssignmentRemovedResponse>> {
    ensure_permission(&state, &actor, &client, "role", "assign").await?;

    let role_id = RoleId::from_str(payload.role_id.as_str())?;
    let removed = state
        .rbac
        .remove_role(payload.user_id.as_str(), role_id, &actor, &client)
        .await?;

    Ok(Json(AssignmentRemovedResponse { removed }))
}
