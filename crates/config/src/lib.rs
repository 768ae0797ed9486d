//! grc-config - 配置加载库

use std::net::IpAddr;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 反向代理地址；只有来自这些地址的请求才采信 `X-Forwarded-For`
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            trusted_proxies: Vec::new(),
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 会话令牌签名密钥
    pub secret: Secret<String>,
    /// 无操作超时（分钟），每次请求重新计时
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_idle_timeout_minutes() -> i64 {
    30
}

fn default_issuer() -> String {
    "grc-platform".to_string()
}

/// 审计写入模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// 写入失败只记录日志，不影响业务操作
    #[default]
    FireAndForget,
    /// 写入失败时向调用方返回错误
    FailClosed,
}

/// 审计配置
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub mode: AuditMode,
    #[serde(default = "default_trail_limit")]
    pub trail_limit: u32,
    #[serde(default = "default_trail_days")]
    pub default_trail_days: u32,
    #[serde(default = "default_export_days")]
    pub default_export_days: u32,
}

fn default_trail_limit() -> u32 {
    500
}

fn default_trail_days() -> u32 {
    7
}

fn default_export_days() -> u32 {
    30
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            mode: AuditMode::default(),
            trail_limit: default_trail_limit(),
            default_trail_days: default_trail_days(),
            default_export_days: default_export_days(),
        }
    }
}

/// 风险模块配置
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// 风险编号冲突时的最大尝试次数
    #[serde(default = "default_code_retry_attempts")]
    pub code_retry_attempts: u32,
    /// 单次存储操作超时（秒）
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

fn default_code_retry_attempts() -> u32 {
    5
}

fn default_store_timeout_secs() -> u64 {
    5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            code_retry_attempts: default_code_retry_attempts(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：`GRC_` 前缀环境变量 > `{APP_ENV}.toml` > `default.toml`，
    /// 嵌套字段用双下划线分隔，例如 `GRC_DATABASE__URL`
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(format!("{}/default.toml", config_dir)))
                .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
                .merge(Env::prefixed("GRC_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
