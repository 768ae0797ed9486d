//! HTTP 接口（JSON）
//!
//! 会话以 `Authorization: Bearer <token>` 传递；拒绝访问返回带回退目标的 Problem Details

mod error;
mod handlers;
mod middleware;

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use grc_telemetry::PrometheusHandle;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::application::GrcPlatform;

pub use error::ApiError;
pub use middleware::{Ctx, client_origin, session_middleware};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub platform: GrcPlatform,
    pub metrics: Option<PrometheusHandle>,
    /// 健康检查用；内存模式下为空
    pub pool: Option<PgPool>,
    /// 可采信 `X-Forwarded-For` 的代理地址
    pub trusted_proxies: Arc<[IpAddr]>,
}

impl AppState {
    pub fn new(platform: GrcPlatform) -> Self {
        Self {
            platform,
            metrics: None,
            pool: None,
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/risks",
            get(handlers::risk::register).post(handlers::risk::create),
        )
        .route("/api/risks/heatmap", get(handlers::risk::heat_map))
        .route("/api/risks/{id}", delete(handlers::risk::delete))
        .route("/api/risks/{id}/status", post(handlers::risk::update_status))
        .route("/api/dashboard", get(handlers::risk::dashboard))
        .route("/api/compliance/controls", get(handlers::compliance::controls))
        .route(
            "/api/compliance/risks/{id}/mappings",
            get(handlers::compliance::list_mappings).post(handlers::compliance::add_mapping),
        )
        .route(
            "/api/compliance/risks/{id}/mappings/{mapping_id}",
            delete(handlers::compliance::remove_mapping),
        )
        .route("/api/audit", get(handlers::audit::trail))
        .route("/api/audit/export", get(handlers::audit::export))
        .route("/health", get(handlers::system::health))
        .route("/metrics", get(handlers::system::metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
