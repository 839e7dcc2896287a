use axum::Extension;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use warden_application::ClientInfo;
use warden_core::{Actor, AppError, BaseRole};

use crate::error::ApiResult;
use crate::guard::CHECK_DEADLINE;
use crate::state::AppState;

/// Header carrying the authenticated subject, set by the auth proxy.
pub const ACTOR_SUBJECT_HEADER: &str = "x-actor-subject";

/// Header carrying the subject's base role, set by the auth proxy.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Admin section label attached to a route group.
#[derive(Debug, Clone)]
pub struct AdminSection(pub &'static str);

/// Rejects unauthenticated requests and stashes the resolved [`Actor`]
/// and [`ClientInfo`] in request extensions.
///
/// Identity arrives from the external authentication provider as trusted
/// reverse-proxy headers; a request without a subject is turned away here
/// with 401, so the engine never sees a null actor. A missing role header
/// downgrades to the plain `user` base role rather than failing.
pub async fn require_actor(mut request: Request, next: Next) -> ApiResult<Response> {
    let headers = request.headers();

    let subject = headers
        .get(ACTOR_SUBJECT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);
    let Some(subject) = subject else {
        return Err(AppError::Unauthorized("authentication required".to_owned()).into());
    };

    let base_role = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("user")
        .to_owned();

    let client = ClientInfo {
        ip_address: headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_owned()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned),
    };

    request
        .extensions_mut()
        .insert(Actor::new(subject, BaseRole::new(base_role)));
    request.extensions_mut().insert(client);

    Ok(next.run(request).await)
}

/// Gates an admin route group and logs the `admin_access_{section}`
/// decision.
///
/// Denial, engine failure and deadline overrun all refuse the request:
/// access control fails closed.
pub async fn admin_access(
    State(state): State<AppState>,
    Extension(section): Extension<AdminSection>,
    Extension(actor): Extension<Actor>,
    Extension(client): Extension<ClientInfo>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let decision = tokio::time::timeout(
        CHECK_DEADLINE,
        state.rbac.check_admin_access(&actor, section.0, &client),
    )
    .await;

    match decision {
        Ok(Ok(true)) => Ok(next.run(request).await),
        Ok(Ok(false)) => Err(denied(section.0)),
        Ok(Err(error)) => {
            tracing::error!(%error, section = section.0, "admin access check failed; denying");
            Err(denied(section.0))
        }
        Err(_elapsed) => {
            tracing::error!(section = section.0, "admin access check timed out; denying");
            Err(denied(section.0))
        }
    }
}

fn denied(section: &str) -> crate::error::ApiError {
    AppError::Forbidden(format!("insufficient permissions for section '{section}'")).into()
}
