//! GRC Platform - 风险、合规与审计服务
//!
//! 会话认证与角色访问控制、只追加的审计轨迹、风险生命周期与合规映射

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
