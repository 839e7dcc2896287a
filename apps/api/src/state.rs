use sqlx::PgPool;
use warden_application::RbacService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Access-control engine.
    pub rbac: RbacService,
    /// Connection pool, exposed for health checks.
    pub postgres_pool: PgPool,
}
