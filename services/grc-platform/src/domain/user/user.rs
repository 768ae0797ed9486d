//! 用户实体

use chrono::{DateTime, Utc};
use grc_common::UserId;
use serde::Serialize;

/// 用户
///
/// 由身份存储维护，本服务只在登录时更新 `last_login`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            job_title: self.job_title.clone(),
        }
    }
}

/// 对外展示的用户信息，不含口令哈希
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub job_title: Option<String>,
}
