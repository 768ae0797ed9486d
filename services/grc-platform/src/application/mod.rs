//! 应用层

pub mod audit;
pub mod auth;
pub mod compliance;
pub mod context;
pub mod guard;
pub mod platform;
pub mod risk;
pub mod support;

pub use context::{Caller, RequestContext};
pub use platform::{GrcPlatform, PlatformDeps, PlatformSettings};
