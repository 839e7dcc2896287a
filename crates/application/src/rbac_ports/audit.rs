use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::AppResult;

/// Client metadata captured from the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address, when known.
    pub ip_address: Option<String>,
    /// Client user agent, when known.
    pub user_agent: Option<String>,
}

/// Immutable audit event payload appended by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogInput {
    /// Acting subject, or a sentinel such as `anonymous` or `system`.
    pub user_id: String,
    /// Stable event name; see the action builders in `warden-domain`.
    pub action: String,
    /// Resource namespace the event concerns.
    pub resource: String,
    /// Optional identifier of the affected resource.
    pub resource_id: Option<String>,
    /// Structured event detail.
    pub details: serde_json::Value,
    /// Whether the recorded operation succeeded.
    pub success: bool,
    /// Client metadata from the originating request.
    pub client: ClientInfo,
}

/// Audit log entry returned to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogRecord {
    /// Stable entry identifier.
    pub id: String,
    /// Acting subject.
    pub user_id: String,
    /// Stable event name.
    pub action: String,
    /// Resource namespace.
    pub resource: String,
    /// Optional identifier of the affected resource.
    pub resource_id: Option<String>,
    /// Structured event detail.
    pub details: serde_json::Value,
    /// Whether the recorded operation succeeded.
    pub success: bool,
    /// Entry timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
    /// Client IP address, when captured.
    pub ip_address: Option<String>,
    /// Client user agent, when captured.
    pub user_agent: Option<String>,
}

/// Query restrictions for audit log reads.
///
/// Every field is optional; unset fields do not restrict. The timestamp
/// range is half-open: `start` is inclusive and `end` is exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    /// Restrict to one acting subject.
    pub user_id: Option<String>,
    /// Restrict to one exact event name.
    pub action: Option<String>,
    /// Restrict to one resource namespace.
    pub resource: Option<String>,
    /// Restrict to successful or failed events.
    pub success: Option<bool>,
    /// Inclusive lower timestamp bound.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper timestamp bound.
    pub end: Option<DateTime<Utc>>,
}

/// Repository port for the append-only audit log.
///
/// The port deliberately exposes no update or delete operation.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Persists one audit entry.
    async fn append(&self, input: AuditLogInput) -> AppResult<()>;

    /// Lists entries newest-first with offset pagination applied in the
    /// store.
    async fn list(
        &self,
        filter: &AuditLogFilter,
        limit: usize,
        skip: usize,
    ) -> AppResult<Vec<AuditLogRecord>>;

    /// Counts entries matching the filter.
    async fn count(&self, filter: &AuditLogFilter) -> AppResult<u64>;
}
