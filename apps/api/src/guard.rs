use std::time::Duration;

use warden_application::ClientInfo;
use warden_core::{Actor, AppError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upper bound for one engine permission check.
pub const CHECK_DEADLINE: Duration = Duration::from_secs(5);

/// Requires the actor to hold `(resource, action)`, failing closed.
///
/// The engine call runs under [`CHECK_DEADLINE`]; a denial, a store
/// failure and a timeout all surface as the same 403 so that access
/// control never defaults open. The decision itself is audited by the
/// engine.
pub async fn ensure_permission(
    state: &AppState,
    actor: &Actor,
    client: &ClientInfo,
    resource: &str,
    action: &str,
) -> ApiResult<()> {
    let decision = tokio::time::timeout(
        CHECK_DEADLINE,
        state.rbac.check_permission(actor, resource, action, client),
    )
    .await;

    match decision {
        Ok(Ok(true)) => Ok(()),
        Ok(Ok(false)) => Err(forbidden(resource, action)),
        Ok(Err(error)) => {
            tracing::error!(%error, resource, action, "permission check failed; denying");
            Err(forbidden(resource, action))
        }
        Err(_elapsed) => {
            tracing::error!(resource, action, "permission check timed out; denying");
            Err(forbidden(resource, action))
        }
    }
}

fn forbidden(resource: &str, action: &str) -> ApiError {
    AppError::Forbidden(format!(
        "insufficient permissions for {resource}:{action}"
    ))
    .into()
}
