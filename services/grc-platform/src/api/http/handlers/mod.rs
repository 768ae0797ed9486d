//! 路由处理函数

pub mod audit;
pub mod auth;
pub mod compliance;
pub mod risk;
pub mod system;
