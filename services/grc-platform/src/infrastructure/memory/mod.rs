//! 内存实现
//!
//! 会话存储供生产使用；`InMemoryGrcStore` 只在测试或开启 `test-support` 时编译，
//! 行为与 PostgreSQL 实现保持一致（排序、唯一约束、级联删除）

mod session;
#[cfg(any(test, feature = "test-support"))]
mod store;

pub use session::*;
#[cfg(any(test, feature = "test-support"))]
pub use store::*;
