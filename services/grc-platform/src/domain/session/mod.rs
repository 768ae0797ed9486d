//! 会话存储
//!
//! 登录时签发的 `SessionClaims` 保存在服务端，客户端只持有签名令牌。
//! 空闲过期在读取时惰性判断，没有后台清理任务。

use async_trait::async_trait;
use grc_auth_core::{SessionClaims, SessionId};
use grc_errors::AppResult;

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 建立会话
    ///
    /// 先清除 `previous` 指向的旧会话，再保存新的声明集
    async fn establish(&self, previous: Option<&SessionId>, claims: SessionClaims) -> AppResult<()>;

    /// 当前身份；未登录或已过期返回 `None`，命中时重新计算空闲过期时间
    async fn current_identity(&self, sid: &SessionId) -> AppResult<Option<SessionClaims>>;

    /// 销毁会话，会话不存在时无操作
    async fn destroy(&self, sid: &SessionId) -> AppResult<()>;
}
