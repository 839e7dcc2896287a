use super::*;

pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let ready = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.postgres_pool)
        .await
        .is_ok();

    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if ready { "ok" } else { "degraded" },
            ready,
        }),
    )
}
