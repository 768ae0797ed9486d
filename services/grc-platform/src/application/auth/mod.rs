//! 登录与登出

mod authenticator;
mod error;

pub use authenticator::*;
pub use error::*;
