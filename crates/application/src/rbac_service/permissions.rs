use serde_json::json;

use warden_core::{Actor, AppError, AppResult, PermissionId};
use warden_domain::RbacAction;

use super::RbacService;
use crate::rbac_ports::{ClientInfo, NewPermission, PermissionUsage};

impl RbacService {
    /// Lists the permission catalog with role and user reference counts.
    pub async fn list_permissions_with_usage(&self) -> AppResult<Vec<PermissionUsage>> {
        self.permissions.list_usage().await
    }

    /// Creates a permission, returning `None` when its `(resource, action)`
    /// pair or name already exists.
    pub async fn create_permission(
        &self,
        input: NewPermission,
        actor: &Actor,
        client: &ClientInfo,
    ) -> AppResult<Option<PermissionId>> {
        let details = json!({
            "name": input.name.as_str(),
            "resource": input.resource.as_str(),
            "action": input.action.as_str(),
        });

        match self.permissions.insert(input).await {
            Ok(permission_id) => {
                self.log_action(
                    actor.subject(),
                    RbacAction::PermissionCreated.as_str(),
                    "role",
                    Some(permission_id.to_string()),
                    details,
                    true,
                    client,
                )
                .await;
                Ok(Some(permission_id))
            }
            Err(AppError::Conflict(_)) => {
                self.log_action(
                    actor.subject(),
                    RbacAction::PermissionCreated.as_str(),
                    "role",
                    None,
                    json!({ "details": details, "reason": "duplicate" }),
                    false,
                    client,
                )
                .await;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Deletes a permission no role references.
    ///
    /// A missing permission id errs with [`AppError::NotFound`]; a
    /// referenced permission is rejected with `false` and a failed audit
    /// entry.
    pub async fn delete_permission(
        &self,
        permission_id: PermissionId,
        actor: &Actor,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        let Some(existing) = self.permissions.find_by_id(permission_id).await? else {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        };

        let references = self.permissions.role_reference_count(permission_id).await?;
        if references > 0 {
            self.log_action(
                actor.subject(),
                RbacAction::PermissionDeleted.as_str(),
                "role",
                Some(permission_id.to_string()),
                json!({
                    "name": existing.name,
                    "reason": "referenced_by_roles",
                    "role_count": references,
                }),
                false,
                client,
            )
            .await;
            return Ok(false);
        }

        let removed = self.permissions.delete(permission_id).await?;
        self.log_action(
            actor.subject(),
            RbacAction::PermissionDeleted.as_str(),
            "role",
            Some(permission_id.to_string()),
            json!({ "name": existing.name }),
            removed,
            client,
        )
        .await;

        Ok(removed)
    }
}
