//! 合规映射

mod service;

pub use service::*;
