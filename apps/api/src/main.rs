//! Warden API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod guard;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Extension;
use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_application::RbacService;
use warden_core::AppError;
use warden_infrastructure::{
    PostgresAssignmentRepository, PostgresAuditLogRepository, PostgresPermissionRepository,
    PostgresRoleRepository,
};

use crate::middleware::AdminSection;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let rbac = RbacService::new(
        Arc::new(PostgresPermissionRepository::new(pool.clone())),
        Arc::new(PostgresRoleRepository::new(pool.clone())),
        Arc::new(PostgresAssignmentRepository::new(pool.clone())),
        Arc::new(PostgresAuditLogRepository::new(pool.clone())),
    );

    rbac.initialize_rbac().await?;

    let app_state = AppState {
        rbac,
        postgres_pool: pool,
    };

    let role_routes = Router::new()
        .route(
            "/api/rbac/roles",
            get(handlers::list_roles_handler).post(handlers::create_role_handler),
        )
        .route(
            "/api/rbac/roles/{role_id}",
            put(handlers::update_role_handler).delete(handlers::delete_role_handler),
        )
        .route(
            "/api/rbac/permissions",
            get(handlers::list_permissions_handler).post(handlers::create_permission_handler),
        )
        .route(
            "/api/rbac/permissions/{permission_id}",
            delete(handlers::delete_permission_handler),
        )
        .route(
            "/api/rbac/assignments",
            get(handlers::list_assignments_handler).post(handlers::assign_role_handler),
        )
        .route(
            "/api/rbac/assignments/bulk",
            post(handlers::bulk_assign_roles_handler),
        )
        .route(
            "/api/rbac/assignment-removals",
            post(handlers::remove_role_assignment_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::admin_access,
        ))
        .layer(Extension(AdminSection("role")));

    let audit_routes = Router::new()
        .route(
            "/api/rbac/audit-log",
            get(handlers::list_audit_log_handler),
        )
        .route(
            "/api/rbac/audit-log/export",
            get(handlers::export_audit_log_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::admin_access,
        ))
        .layer(Extension(AdminSection("audit")));

    let protected_routes = role_routes
        .merge(audit_routes)
        .route_layer(from_fn(middleware::require_actor));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "warden-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
