use chrono::{DateTime, Utc};
use serde_json::json;

use warden_core::{Actor, AppResult, RoleId};
use warden_domain::RbacAction;

use super::RbacService;
use crate::rbac_ports::{AssignmentInsert, AssignmentRecord, ClientInfo, NewAssignment};

impl RbacService {
    /// Lists a user's assignments, expired ones included.
    pub async fn list_assignments_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<AssignmentRecord>> {
        self.assignments.list_for_user(user_id).await
    }

    /// Assigns a role to a user.
    ///
    /// Returns `false` when the role does not exist or when an active
    /// assignment for the pair already exists; a repeat call is therefore
    /// safe and shows up in the log as a failed attempt. An expired
    /// assignment for the same pair is reactivated in place, and the
    /// duplicate-versus-reactivate decision is atomic in the store.
    pub async fn assign_role(
        &self,
        user_id: &str,
        role_id: RoleId,
        actor: &Actor,
        expires_at: Option<DateTime<Utc>>,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        let Some(role) = self.roles.find_by_id(role_id).await? else {
            self.log_action(
                actor.subject(),
                RbacAction::RoleAssigned.as_str(),
                "role",
                Some(format!("{user_id}:{role_id}")),
                json!({ "role_id": role_id.to_string(), "reason": "role_not_found" }),
                false,
                client,
            )
            .await;
            return Ok(false);
        };

        let outcome = self
            .assignments
            .insert(
                NewAssignment {
                    user_id: user_id.to_owned(),
                    role_id,
                    assigned_by: actor.subject().to_owned(),
                    expires_at,
                },
                Utc::now(),
            )
            .await?;

        match outcome {
            AssignmentInsert::Inserted => {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleAssigned.as_str(),
                    "role",
                    Some(format!("{user_id}:{}", role.name)),
                    json!({
                        "role_id": role_id.to_string(),
                        "role_name": role.name,
                        "expires_at": expires_at.map(|instant| instant.to_rfc3339()),
                    }),
                    true,
                    client,
                )
                .await;
                Ok(true)
            }
            AssignmentInsert::AlreadyActive => {
                self.log_action(
                    actor.subject(),
                    RbacAction::RoleAssigned.as_str(),
                    "role",
                    Some(format!("{user_id}:{}", role.name)),
                    json!({ "role_id": role_id.to_string(), "reason": "already_assigned" }),
                    false,
                    client,
                )
                .await;
                Ok(false)
            }
        }
    }

    /// Removes a user's role assignment, returning whether a row was
    /// actually removed.
    pub async fn remove_role(
        &self,
        user_id: &str,
        role_id: RoleId,
        actor: &Actor,
        client: &ClientInfo,
    ) -> AppResult<bool> {
        let removed = self.assignments.delete(user_id, role_id).await?;

        self.log_action(
            actor.subject(),
            RbacAction::RoleRemoved.as_str(),
            "role",
            Some(format!("{user_id}:{role_id}")),
            json!({ "role_id": role_id.to_string() }),
            removed,
            client,
        )
        .await;

        Ok(removed)
    }
}
