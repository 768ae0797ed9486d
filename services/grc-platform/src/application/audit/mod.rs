//! 审计记录与审计轨迹

mod export;
mod logger;
mod trail;

pub use export::*;
pub use logger::*;
pub use trail::*;
