//! 健康检查与指标

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use grc_adapter_postgres::check_connection;
use grc_telemetry::HealthStatus;

use crate::api::http::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();

    match &state.pool {
        Some(pool) => match check_connection(pool).await {
            Ok(()) => status.add_check("postgres", true, None),
            Err(e) => status.add_check("postgres", false, Some(e.to_string())),
        },
        None => status.add_check("memory_store", true, None),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
