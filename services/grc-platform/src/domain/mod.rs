//! 领域层

pub mod audit;
pub mod compliance;
pub mod risk;
pub mod session;
pub mod user;
