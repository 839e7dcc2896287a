use chrono::Utc;
use serde_json::json;

use warden_core::{Actor, AppResult, BaseRole};
use warden_domain::{READ_ACTION, admin_access_action, permission_check_action};

use super::RbacService;
use crate::rbac_ports::ClientInfo;

impl RbacService {
    /// Returns whether a user holds `(resource, action)`.
    ///
    /// This is a pure predicate: it appends nothing to the audit log.
    /// Callers that make an access decision from it must log through
    /// [`RbacService::check_permission`] or the `log_*` wrappers.
    ///
    /// The base-role hint is required and resolved by the caller from the
    /// authentication layer. The superuser sentinel short-circuits to
    /// `true` before any store access, so its result does not depend on
    /// store availability. For every other base role the answer is an
    /// exact-match lookup over the permission keys granted through
    /// non-expired assignments; unknown users and users without
    /// assignments resolve to `false`. Only a store failure errs, and
    /// authorization callers must then fail closed.
    pub async fn user_has_permission(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
        base_role: &BaseRole,
    ) -> AppResult<bool> {
        if base_role.is_admin() {
            return Ok(true);
        }

        let granted = self
            .assignments
            .list_granted_keys(user_id, Utc::now())
            .await?;

        Ok(granted
            .iter()
            .any(|key| key.resource == resource && key.action == action))
    }

    /// Evaluates a permission check and records the decision.
    ///
    /// The audit entry is written after the check completes and reflects
    /// the boolean actually returned. When the store fails, a denial is
    /// recorded and the error propagates so the caller fails closed.
    pub async fn check_permission(
        &self,
        actor: &Actor,
        resource: &str,
        action: &str,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        match self
            .user_has_permission(actor.subject(), resource, action, actor.base_role())
            .await
        {
            Ok(granted) => {
                self.log_permission_check(actor.subject(), resource, action, granted, client)
                    .await;
                Ok(granted)
            }
            Err(error) => {
                self.log_action(
                    actor.subject(),
                    permission_check_action(false, resource, action).as_str(),
                    resource,
                    None,
                    json!({ "error": error.to_string() }),
                    false,
                    client,
                )
                .await;
                Err(error)
            }
        }
    }

    /// Evaluates access to an admin section and records the decision.
    ///
    /// A section is granted to superusers and to users holding the
    /// section's `read` permission. The entry's action is
    /// `admin_access_{section}` with the decision in the success flag.
    pub async fn check_admin_access(
        &self,
        actor: &Actor,
        section: &str,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        match self
            .user_has_permission(actor.subject(), section, READ_ACTION, actor.base_role())
            .await
        {
            Ok(granted) => {
                self.log_admin_access(actor.subject(), section, granted, client)
                    .await;
                Ok(granted)
            }
            Err(error) => {
                self.log_action(
                    actor.subject(),
                    admin_access_action(section).as_str(),
                    section,
                    None,
                    json!({ "error": error.to_string() }),
                    false,
                    client,
                )
                .await;
                Err(error)
            }
        }
    }
}
