//! 审计轨迹

mod event;
mod filter;
mod store;

pub use event::*;
pub use filter::*;
pub use store::*;
