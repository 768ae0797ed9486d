//! 合规控制项与风险映射

mod control;
mod mapping;
mod repository;

pub use control::*;
pub use mapping::*;
pub use repository::*;
