//! 用户仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_auth_core::Role;
use grc_common::UserId;
use grc_errors::AppResult;

use super::user::User;

/// 用户与角色仓储接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 根据用户名查找用户（不区分启用状态）
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// 用户持有的角色，按角色 ID 排序
    async fn find_roles(&self, id: UserId) -> AppResult<Vec<Role>>;

    async fn update_last_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;
}
