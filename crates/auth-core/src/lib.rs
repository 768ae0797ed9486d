//! grc-auth-core - 认证核心库
//!
//! 角色词表、会话声明集、会话令牌签名与密码哈希

mod claims;
mod password;
mod role;
mod token;

pub use claims::*;
pub use password::*;
pub use role::*;
pub use token::*;
