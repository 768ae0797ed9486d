//! 风险生命周期

mod service;

pub use service::*;
