//! GRC Platform Service

use std::net::SocketAddr;
use std::sync::Arc;

use grc_bootstrap::{Infrastructure, init_runtime, shutdown_signal};
use grc_common::{Clock, SystemClock};
use grc_config::AppConfig;
use grc_platform::api::{AppState, router};
use grc_platform::application::{GrcPlatform, PlatformDeps, PlatformSettings};
use grc_platform::infrastructure::{
    InMemorySessionStore, PostgresAuditStore, PostgresComplianceRepository, PostgresRiskRepository,
    PostgresUserRepository,
};
use grc_telemetry::init_metrics;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 可选
    let _ = dotenvy::dotenv();

    // 加载配置
    let config = AppConfig::load("config")?;

    // 初始化运行时
    init_runtime(&config);

    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    };

    info!("Starting GRC Platform");

    // 初始化基础设施
    let infra = Infrastructure::from_config(config).await?;
    let config = infra.config();
    let pool = infra.postgres_pool();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 组装平台
    let sessions = InMemorySessionStore::new(clock.clone())
        .with_idle_timeout(infra.session_idle_timeout());
    let platform = GrcPlatform::new(PlatformDeps {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        risks: Arc::new(PostgresRiskRepository::new(pool.clone())),
        compliance: Arc::new(PostgresComplianceRepository::new(pool.clone())),
        audit_store: Arc::new(PostgresAuditStore::new(pool.clone())),
        sessions: Arc::new(sessions),
        hasher: infra.password_hasher(),
        tokens: infra.token_service(),
        clock,
        settings: PlatformSettings::from_config(config),
    });

    let mut state = AppState::new(platform)
        .with_pool(pool)
        .with_trusted_proxies(config.server.trusted_proxies.clone());
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    infra.close().await;
    info!("GRC Platform stopped");
    Ok(())
}
