use serde_json::json;

use warden_core::AppResult;
use warden_domain::{admin_access_action, content_action, media_action, permission_check_action};

use super::RbacService;
use crate::rbac_ports::{AuditLogFilter, AuditLogInput, AuditLogRecord, ClientInfo};

impl RbacService {
    /// Appends one entry to the audit log, best effort.
    ///
    /// Logging is a side effect of access control, not a precondition for
    /// it: a failed write never propagates into the caller's flow. It is
    /// reported on the operational error channel instead, so audit-trail
    /// gaps stay detectable.
    pub async fn log_action(
        &self,
        user_id: &str,
        action: &str,
        resource: &str,
        resource_id: Option<String>,
        details: serde_json::Value,
        success: bool,
        client: &ClientInfo,
    ) {
        let input = AuditLogInput {
            user_id: user_id.to_owned(),
            action: action.to_owned(),
            resource: resource.to_owned(),
            resource_id,
            details,
            success,
            client: client.clone(),
        };

        if let Err(error) = self.audit.append(input).await {
            tracing::error!(%error, user_id, action, "failed to append audit log entry");
        }
    }

    /// Records a permission-check decision as
    /// `access_granted_{resource}_{action}` or
    /// `access_denied_{resource}_{action}`.
    pub async fn log_permission_check(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
        granted: bool,
        client: &ClientInfo,
    ) {
        self.log_action(
            user_id,
            permission_check_action(granted, resource, action).as_str(),
            resource,
            None,
            json!({}),
            granted,
            client,
        )
        .await;
    }

    /// Records an admin-section access decision as
    /// `admin_access_{section}` with the decision in the success flag.
    pub async fn log_admin_access(
        &self,
        user_id: &str,
        section: &str,
        granted: bool,
        client: &ClientInfo,
    ) {
        self.log_action(
            user_id,
            admin_access_action(section).as_str(),
            section,
            None,
            json!({}),
            granted,
            client,
        )
        .await;
    }

    /// Records a content operation as `content_{action}`.
    pub async fn log_content_action(
        &self,
        user_id: &str,
        action: &str,
        content_id: Option<String>,
        details: serde_json::Value,
        success: bool,
        client: &ClientInfo,
    ) {
        self.log_action(
            user_id,
            content_action(action).as_str(),
            "content",
            content_id,
            details,
            success,
            client,
        )
        .await;
    }

    /// Records a media operation as `media_{action}`.
    pub async fn log_media_action(
        &self,
        user_id: &str,
        action: &str,
        media_id: Option<String>,
        details: serde_json::Value,
        success: bool,
        client: &ClientInfo,
    ) {
        self.log_action(
            user_id,
            media_action(action).as_str(),
            "media",
            media_id,
            details,
            success,
            client,
        )
        .await;
    }

    /// Lists audit entries newest-first with offset pagination.
    pub async fn get_audit_logs(
        &self,
        filter: &AuditLogFilter,
        limit: usize,
        skip: usize,
    ) -> AppResult<Vec<AuditLogRecord>> {
        self.audit.list(filter, limit, skip).await
    }

    /// Counts audit entries matching the filter, for pagination metadata.
    pub async fn get_audit_logs_count(&self, filter: &AuditLogFilter) -> AppResult<u64> {
        self.audit.count(filter).await
    }
}
