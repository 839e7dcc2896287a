use serde_json::json;

use warden_core::{Actor, AppError, AppResult, PermissionId, RoleId};
use warden_domain::RbacAction;

use super::RbacService;
use crate::rbac_ports::{ClientInfo, NewRole, RolePatch, RoleRecord};

impl RbacService {
    /// Lists all roles with their permission sets.
    pub async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        self.roles.list_all().await
    }

    /// Creates a custom role, returning `None` when the name is taken.
    ///
    /// Name uniqueness is enforced by the store, so concurrent creates of
    /// the same name resolve to exactly one role. Both outcomes append a
    /// `role_created` audit entry.
    pub async fn create_role(
        &self,
        name: &str,
        description: &str,
        permission_ids: &[PermissionId],
        actor: &Actor,
        client: &ClientInfo,
    ) -> AppResult<Option<RoleId>> {
        let inserted = self
            .roles
            .insert(NewRole {
                name: name.to_owned(),
                description: description.to_owned(),
                permission_ids: permission_ids.to_vec(),
            })
            .await;

        match inserted {
            Ok(role_id) => {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleCreated.as_str(),
                    "role",
                    Some(role_id.to_string()),
                    json!({ "name": name, "permission_count": permission_ids.len() }),
                    true,
                    client,
                )
                .await;
                Ok(Some(role_id))
            }
            Err(AppError::Conflict(_)) => {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleCreated.as_str(),
                    "role",
                    None,
                    json!({ "name": name, "reason": "duplicate_name" }),
                    false,
                    client,
                )
                .await;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Applies a patch to a custom role.
    ///
    /// A missing role id errs with [`AppError::NotFound`]. System roles
    /// and name collisions are rejected with `false` and a failed audit
    /// entry; a successful update records before/after permission counts.
    pub async fn update_role(
        &self,
        role_id: RoleId,
        patch: RolePatch,
        actor: &Actor,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        let Some(existing) = self.roles.find_by_id(role_id).await? else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        if existing.is_system {
            self.log_action(
                actor.subject(),
                RbacAction::RoleUpdated.as_str(),
                "role",
                Some(role_id.to_string()),
                json!({ "name": existing.name, "reason": "system_role" }),
                false,
                client,
            )
            .await;
            return Ok(false);
        }

        if let Some(new_name) = patch.name.as_deref()
            && new_name != existing.name
        {
            if self.roles.find_by_name(new_name).await?.is_some() {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleUpdated.as_str(),
                    "role",
                    Some(role_id.to_string()),
                    json!({ "name": new_name, "reason": "duplicate_name" }),
                    false,
                    client,
                )
                .await;
                return Ok(false);
            }
        }

        let permissions_before = existing.permission_ids.len();
        let updated = RoleRecord {
            id: existing.id,
            name: patch.name.unwrap_or(existing.name),
            description: patch.description.unwrap_or(existing.description),
            is_system: false,
            permission_ids: patch.permission_ids.unwrap_or(existing.permission_ids),
        };
        let permissions_after = updated.permission_ids.len();
        let updated_name = updated.name.clone();

        match self.roles.save(updated).await {
            Ok(()) => {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleUpdated.as_str(),
                    "role",
                    Some(role_id.to_string()),
                    json!({
                        "name": updated_name,
                        "permissions_before": permissions_before,
                        "permissions_after": permissions_after,
                    }),
                    true,
                    client,
                )
                .await;
                Ok(true)
            }
            Err(AppError::Conflict(_)) => {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleUpdated.as_str(),
                    "role",
                    Some(role_id.to_string()),
                    json!({ "name": updated_name, "reason": "duplicate_name" }),
                    false,
                    client,
                )
                .await;
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    /// Deletes a custom role with no remaining active assignment.
    ///
    /// A missing role id errs with [`AppError::NotFound`]. System roles
    /// and roles still actively assigned are rejected with `false` and a
    /// failed audit entry; expired leftover assignment rows are purged by
    /// the store when the role row goes away.
    pub async fn delete_role(
        &self,
        role_id: RoleId,
        actor: &Actor,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        let Some(existing) = self.roles.find_by_id(role_id).await? else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        if existing.is_system {
            self.log_action(
                actor.subject(),
                RbacAction::RoleDeleted.as_str(),
                "role",
                Some(role_id.to_string()),
                json!({ "name": existing.name, "reason": "system_role" }),
                false,
                client,
            )
            .await;
            return Ok(false);
        }

        let active = self
            .assignments
            .active_count_for_role(role_id, chrono::Utc::now())
            .await?;
        if active > 0 {
            self.log_action(
                actor.subject(),
                RbacAction::RoleDeleted.as_str(),
                "role",
                Some(role_id.to_string()),
                json!({
                    "name": existing.name,
                    "reason": "active_assignments",
                    "active_assignments": active,
                }),
                false,
                client,
            )
            .await;
            return Ok(false);
        }

        let removed = self.roles.delete(role_id).await?;
        self.log_action(
            actor.subject(),
            RbacAction::RoleDeleted.as_str(),
            "role",
            Some(role_id.to_string()),
            json!({ "name": existing.name }),
            removed,
            client,
        )
        .await;

        Ok(removed)
    }
}
