//! 风险

mod code;
mod repository;
mod risk;
mod scoring;
mod status;

pub use code::*;
pub use repository::*;
pub use risk::*;
pub use scoring::*;
pub use status::*;
