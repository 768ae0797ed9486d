//! grc-bootstrap - 服务启动骨架
//!
//! 配置加载之后、路由挂载之前的启动逻辑

mod infrastructure;
mod runtime;
mod shutdown;

pub use infrastructure::*;
pub use runtime::*;
pub use shutdown::*;
