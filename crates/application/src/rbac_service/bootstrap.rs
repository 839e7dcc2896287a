use serde_json::json;

use warden_core::auth::SYSTEM_SUBJECT;
use warden_core::{AppResult, PermissionId};
use warden_domain::{READ_ACTION, RbacAction, SystemRole, default_permissions};

use super::RbacService;
use crate::rbac_ports::{ClientInfo, NewPermission};

impl RbacService {
    /// Ensures the default permission catalog and both system roles exist.
    ///
    /// Safe to call on every process start: permissions are upserted by
    /// their `(resource, action)` pair and system roles are re-ensured
    /// with their full grant set, so a second run changes nothing. The
    /// `admin` role receives every permission existing at call time and
    /// the `user` role every `read` permission.
    pub async fn initialize_rbac(&self) -> AppResult<()> {
        for entry in default_permissions() {
            self.permissions
                .upsert(NewPermission {
                    name: entry.name.to_owned(),
                    resource: entry.resource.to_owned(),
                    action: entry.action.to_owned(),
                    description: entry.description.to_owned(),
                })
                .await?;
        }

        let catalog = self.permissions.list_all().await?;
        let all_ids: Vec<PermissionId> = catalog.iter().map(|permission| permission.id).collect();
        let read_ids: Vec<PermissionId> = catalog
            .iter()
            .filter(|permission| permission.action == READ_ACTION)
            .map(|permission| permission.id)
            .collect();

        self.roles
            .ensure_system_role(
                SystemRole::Admin.as_str(),
                SystemRole::Admin.description(),
                &all_ids,
            )
            .await?;
        self.roles
            .ensure_system_role(
                SystemRole::User.as_str(),
                SystemRole::User.description(),
                &read_ids,
            )
            .await?;

        self.log_action(
            SYSTEM_SUBJECT,
            RbacAction::RbacInitialized.as_str(),
            "system",
            None,
            json!({
                "permission_count": all_ids.len(),
                "read_permission_count": read_ids.len(),
            }),
            true,
            &ClientInfo::default(),
        )
        .await;

        tracing::info!(permissions = all_ids.len(), "rbac bootstrap complete");

        Ok(())
    }
}
