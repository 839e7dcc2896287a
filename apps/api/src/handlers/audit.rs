use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::*;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub success: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditLogQuery {
    fn filter(&self) -> AuditLogFilter {
        AuditLogFilter {
            user_id: self.user_id.clone(),
            action: self.action.clone(),
            resource: self.resource.clone(),
            success: self.success,
            start: self.start_date,
            end: self.end_date,
        }
    }
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<AuditLogPageResponse>> {
    ensure_permission(&state, &actor, &client, "audit", "read").await?;

    let filter = query.filter();
    let entries = state
        .rbac
        .get_audit_logs(&filter, query.limit.unwrap_or(50), query.skip.unwrap_or(0))
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();
    let total = state.rbac.get_audit_logs_count(&filter).await?;

    Ok(Json(AuditLogPageResponse { entries, total }))
}

pub async fn export_audit_log_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Response> {
    ensure_permission(&state, &actor, &client, "audit", "export").await?;

    let entries = state
        .rbac
        .get_audit_logs(
            &query.filter(),
            query.limit.unwrap_or(1_000),
            query.skip.unwrap_or(0),
        )
        .await?;

    let mut csv = String::from(
        "id,user_id,action,resource,resource_id,success,created_at,ip_address,user_agent,details\n",
    );
    for entry in entries {
        let row = [
            entry.id,
            entry.user_id,
            entry.action,
            entry.resource,
            entry.resource_id.unwrap_or_default(),
            entry.success.to_string(),
            entry.created_at.to_rfc3339(),
            entry.ip_address.unwrap_or_default(),
            entry.user_agent.unwrap_or_default(),
            entry.details.to_string(),
        ];
        let line = row
            .iter()
            .map(|field| csv_escape(field))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit-log.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
