//! 用户

mod repository;
mod user;

pub use repository::*;
pub use user::*;
